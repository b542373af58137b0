//! MongoDB session, health checks and the generic repository

mod config;
mod health;
pub mod repository;
mod store;

pub use config::{MongoConfig, normalize_url};
pub use health::{HealthStatus, check_health_detailed};
pub use repository::{Entity, Inserted, MongoRepository, parse_id};
pub use store::{DocumentStore, MongoError};

// Re-export driver types for convenience
pub use mongodb::bson;
pub use mongodb::{Client, Collection, Database};
