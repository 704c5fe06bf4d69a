use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Gene {
    pub id: i64,
    pub entrezid: i64,
    pub systematic_name: String,
    pub standard_name: Option<String>,
    pub description: String,
    pub organism_id: i64,
    pub aliases: Option<String>,
    pub obsolete: bool,
    pub weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGene {
    pub entrezid: i64,
    pub systematic_name: String,
    #[serde(default)]
    pub standard_name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub organism_id: i64,
    #[serde(default)]
    pub aliases: Option<String>,
    #[serde(default)]
    pub obsolete: bool,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}
