pub mod auth;
pub mod classify;
pub mod extract;
pub mod rate_limit;
pub mod response;

pub use auth::{jwt_auth_middleware, require_admin, AuthUser};
pub use classify::{error_classifier_middleware, FailureReport};
pub use extract::JsonBody;
pub use rate_limit::{client_key, rate_limit_middleware, user_rate_limit_middleware};
pub use response::{ApiResponse, ApiResult};
