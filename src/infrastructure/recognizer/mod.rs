//! Live speech recognition adapters

mod http;
mod null;

pub use http::HttpRecognizer;
pub use null::NullRecognizer;
