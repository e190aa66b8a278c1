//! Configuration domain module

mod app_config;

pub use app_config::{AppConfig, DEFAULT_QUESTION_COUNT, DEFAULT_ROLE, DEFAULT_SERVER_URL};
