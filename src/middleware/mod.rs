pub mod auth;
pub mod cors;
pub mod response;

pub use auth::{authenticate, CurrentUser, RequireSuperUser, RequireUser};
pub use cors::camp_cors;
pub use response::{ApiResponse, ApiResult};
