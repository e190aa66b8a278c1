//! Remote response API adapters

mod http;

pub use http::HttpResponseApi;
