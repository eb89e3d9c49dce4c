//! Route configuration for the search service.

pub mod data_routes;

pub use data_routes::create_routes;
