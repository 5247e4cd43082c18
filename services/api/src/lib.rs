//! Newsdesk API service
//!
//! Account, category, news and tag endpoints, OData-style collection
//! browsing and reporting aggregates over the shared PostgreSQL schema.

pub mod dates;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod odata;
pub mod repositories;
pub mod routes;
pub mod state;

pub use state::AppState;
