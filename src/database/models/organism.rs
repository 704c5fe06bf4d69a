use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Organism {
    pub id: i64,
    pub taxonomy_id: i64,
    pub common_name: String,
    pub scientific_name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrganism {
    pub taxonomy_id: i64,
    pub common_name: String,
    pub scientific_name: String,
    pub slug: String,
}
