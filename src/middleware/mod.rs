pub mod auth;
pub mod response;
pub mod route_access;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use route_access::{decide, route_access_middleware, AccessDecision};
