//! Pairdeck API server library.
//!
//! Exposes the building blocks (config, state, error handling, the draw
//! coordinator, routes, WebSocket infrastructure) so integration tests and
//! the binary entrypoint can both access them.

pub mod config;
pub mod engine;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;
pub mod ws;
