//! Process wiring for the recommender metrics: configuration, the reporting
//! loop and the HTTP exposition endpoint.

pub mod api;
pub mod config;
pub mod snapshot;
pub mod supervisor;
