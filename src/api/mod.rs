pub mod json;
pub mod links;
pub mod mapper;
pub mod models;
pub mod params;
pub mod validate;

pub use json::JsonBody;
pub use links::LinkContext;
pub use params::{PathParams, QueryParams};
pub use validate::{Validate, ValidationMode};
