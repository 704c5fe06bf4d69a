pub mod expand;
pub mod format;
pub mod pagination;

pub use expand::{Expand, Related};
pub use format::{ClassifierView, GeneView, Serializer, UserView};
pub use pagination::{ListQuery, Paginated, Pagination, RequestUrl};
