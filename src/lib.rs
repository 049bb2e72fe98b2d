pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

pub use api::build_router;
pub use config::Config;
pub use services::state::AppState;
