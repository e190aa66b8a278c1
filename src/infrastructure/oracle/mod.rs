//! Question generation and scoring adapters

mod canned;

pub use canned::CannedOracle;
