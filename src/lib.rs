pub mod aggregate;
pub mod api;
pub mod args;
mod backup;
pub mod commands;
mod config;
pub mod console;
mod error;
pub mod model;
pub mod reconcile;
pub mod session;
mod utils;
pub mod validate;


pub use api::Mode;
pub use backup::Backup;
pub use config::Config;
pub use error::Error;
pub use error::Result;
