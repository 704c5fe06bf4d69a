use async_trait::async_trait;
use thiserror::Error;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    Classifier, ClassifierChanges, Disease, Gene, NewClassifier, NewGene, NewOrganism, Organism,
    User, UserChanges,
};

/// Errors surfaced by any `Store` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A page of rows plus the total number of rows available
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
}

/// Persistence boundary for every resource the API serves.
///
/// Lookups by a list of keys (`get_genes`, `get_diseases`, `get_organisms`)
/// return only the rows that exist, in ascending key order; callers compare
/// lengths to detect dangling references.
#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap connectivity probe used by `/health`.
    async fn ping(&self) -> StoreResult<()>;

    // Users
    async fn create_user(
        &self,
        slugs: Vec<String>,
        name: Option<String>,
        email: Option<String>,
    ) -> StoreResult<User>;
    async fn get_user(&self, id: i64) -> StoreResult<Option<User>>;
    async fn get_users(&self, ids: &[i64]) -> StoreResult<Vec<User>>;
    async fn find_user_by_slug(&self, slug: &str) -> StoreResult<Option<User>>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> StoreResult<User>;
    async fn set_user_slugs(&self, id: i64, slugs: Vec<String>) -> StoreResult<User>;

    // Classifiers
    async fn create_classifier(&self, new: NewClassifier) -> StoreResult<Classifier>;
    async fn get_classifier(&self, id: i64) -> StoreResult<Option<Classifier>>;
    async fn list_classifiers(&self, limit: i64, offset: i64) -> StoreResult<Page<Classifier>>;
    async fn update_classifier(&self, id: i64, changes: ClassifierChanges) -> StoreResult<Classifier>;

    // Reference data
    async fn get_gene(&self, id: i64) -> StoreResult<Option<Gene>>;
    async fn get_genes(&self, ids: &[i64]) -> StoreResult<Vec<Gene>>;
    async fn list_genes(&self, limit: i64, offset: i64) -> StoreResult<Page<Gene>>;
    async fn insert_gene(&self, gene: NewGene) -> StoreResult<Gene>;

    async fn get_disease(&self, acronym: &str) -> StoreResult<Option<Disease>>;
    async fn get_diseases(&self, acronyms: &[String]) -> StoreResult<Vec<Disease>>;
    async fn list_diseases(&self, limit: i64, offset: i64) -> StoreResult<Page<Disease>>;
    async fn upsert_disease(&self, disease: Disease) -> StoreResult<Disease>;

    async fn get_organism(&self, id: i64) -> StoreResult<Option<Organism>>;
    async fn get_organisms(&self, ids: &[i64]) -> StoreResult<Vec<Organism>>;
    async fn insert_organism(&self, organism: NewOrganism) -> StoreResult<Organism>;
}

/// Sorted, de-duplicated copy of a key list
pub fn unique_sorted<T: Ord + Clone>(keys: &[T]) -> Vec<T> {
    let mut keys = keys.to_vec();
    keys.sort();
    keys.dedup();
    keys
}
