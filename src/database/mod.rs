pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod seed;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::InMemoryCampRepository;
pub use postgres::PgCampRepository;
pub use repository::CampRepository;
