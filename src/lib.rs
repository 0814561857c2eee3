mod api;
pub mod args;
pub mod commands;
mod config;
mod db;
mod error;
pub mod model;
pub mod pipeline;
mod utils;
mod xlsx;

pub use api::Mode;
pub use config::{Config, ConfigFile, EntityGroup};
pub use error::Error;
pub use error::Result;
