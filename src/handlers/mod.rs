// HTTP handlers, one module per resource. Routing lives in `crate::app`.
pub mod classifiers;
pub mod diseases;
pub mod genes;
pub mod system;
pub mod users;

use serde::Deserialize;

/// `?expand=` on single-resource reads
#[derive(Debug, Default, Deserialize)]
pub struct ExpandQuery {
    pub expand: Option<String>,
}
