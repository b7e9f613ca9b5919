//! Courtside server - NBA team listings over HTTP
//!
//! Wires a [`courtside::TeamsService`] into an axum router and provides the
//! layered configuration used by the `courtside` binary.
//!
//! # Endpoints
//!
//! | Route | Response |
//! |---|---|
//! | `GET /teams` | every NBA team as `[{"teamName", "city"}]` |
//! | `GET /easternConference` | Eastern Conference teams, same shape |
//! | `GET /health` | `{"status": "ok"}` |

pub mod config;
pub mod error;
pub mod server;

pub use error::{ApiError, Result, ServerError};
pub use server::{AppState, build_router, serve};
