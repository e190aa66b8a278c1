//! Durable response queue adapters

mod json_dir;

pub use json_dir::JsonDirStore;
