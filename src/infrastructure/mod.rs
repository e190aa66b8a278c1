//! Infrastructure layer: concrete adapters behind the application
//! ports

pub mod api;
pub mod capture;
pub mod config;
pub mod network;
pub mod notification;
pub mod oracle;
pub mod recognizer;
pub mod speech;
pub mod store;

pub use api::HttpResponseApi;
pub use capture::CpalCapture;
pub use config::XdgConfigStore;
pub use network::HttpProbe;
pub use notification::{create_notifier, NotifyRustNotifier, NullNotifier};
pub use oracle::CannedOracle;
pub use recognizer::{HttpRecognizer, NullRecognizer};
pub use speech::ChimeSpeaker;
pub use store::JsonDirStore;
