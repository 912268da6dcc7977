pub mod auth;
pub mod response;
pub mod validate_tenant;
pub mod validate_user;

pub use auth::jwt_auth_middleware;
pub use response::{ApiResponse, ApiResult};
pub use validate_tenant::validate_tenant_middleware;
pub use validate_user::validate_user_middleware;
