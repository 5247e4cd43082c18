//! Newsdesk authentication service
//!
//! Login, registration and logout over the shared account table, plus the
//! first-run admin bootstrap.

pub mod bootstrap;
pub mod error;
pub mod repositories;
pub mod routes;
pub mod state;

pub use state::AppState;
