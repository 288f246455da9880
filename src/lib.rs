pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
pub mod import;
pub mod model;
pub mod store;
mod utils;

pub use config::Config;
pub use error::Error;
pub use error::Result;
