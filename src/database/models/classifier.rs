use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Classifier {
    pub id: i64,
    /// Owning user id. Fixed at creation.
    pub user_id: i64,
    pub genes: Vec<i64>,
    pub diseases: Vec<String>,
    pub task_id: Option<i64>,
    pub results: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A classifier as accepted by the store on creation. References are already validated.
#[derive(Debug, Clone)]
pub struct NewClassifier {
    pub user_id: i64,
    pub genes: Vec<i64>,
    pub diseases: Vec<String>,
    pub task_id: Option<i64>,
    pub results: Option<Value>,
}

/// Field-level changes to an existing classifier. The owner cannot change.
#[derive(Debug, Clone, Default)]
pub struct ClassifierChanges {
    pub genes: Option<Vec<i64>>,
    pub diseases: Option<Vec<String>>,
    pub task_id: Option<Option<i64>>,
    pub results: Option<Option<Value>>,
}

impl ClassifierChanges {
    pub fn is_empty(&self) -> bool {
        self.genes.is_none()
            && self.diseases.is_none()
            && self.task_id.is_none()
            && self.results.is_none()
    }

    pub(crate) fn apply(self, classifier: &mut Classifier) {
        if let Some(genes) = self.genes {
            classifier.genes = genes;
        }
        if let Some(diseases) = self.diseases {
            classifier.diseases = diseases;
        }
        if let Some(task_id) = self.task_id {
            classifier.task_id = task_id;
        }
        if let Some(results) = self.results {
            classifier.results = results;
        }
    }
}
