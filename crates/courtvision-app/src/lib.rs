// Application layer: configuration, live/mock source resolution and the
// page loaders built on it.

pub mod config;
pub mod fetch;
pub mod view;

pub use fetch::{DataSource, Resolved};
