//! Configuration store adapters

mod xdg;

pub use xdg::XdgConfigStore;
