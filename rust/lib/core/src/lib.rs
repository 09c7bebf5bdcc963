pub mod config;
pub mod error;
pub mod types;

pub use config::ConsoleConfig;
pub use error::ServiceError;
pub use types::{ListParams, ListResult};
