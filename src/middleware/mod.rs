pub mod auth;
pub mod response;

pub use auth::{slug_auth_middleware, AuthUser, CurrentUser, MaybeUser};
pub use response::{ApiResponse, ApiResult};
