//! Product recommendation service for a storefront.
//!
//! Content-based and collaborative recommenders over a catalog and an order
//! history, served through a caching gateway and an axum HTTP layer.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
