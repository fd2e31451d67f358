pub mod app;
pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod http_client;
pub mod models;
pub mod screens;
pub mod services;
pub mod storage;

pub use app::App;
pub use config::Config;
pub use error::{AppError, AppResult};
