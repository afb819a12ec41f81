//! LDTflow Server - HTTP ingestion endpoint for LDT lab-result deliveries
//!
//! This crate provides the secured endpoint that accepts laboratory-result
//! messages from an external lab-interface gateway and routes them to
//! recipients. It supports:
//!
//! - **Signed delivery ingestion**: HMAC-SHA256 authenticated `POST /ingest`
//!   with timestamp windowing, replay dedup, and per-source rate limiting
//! - **Wire-format export**: serializing stored results back into the same
//!   line-record grammar
//! - **Review queue**: listing and reassigning results that matched no
//!   recipient
//! - **Health & metadata**: liveness/readiness probes
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Endpoints
//!
//! ## Delivery (gate-authenticated)
//!
//! - `POST /ingest` - Ingest one signed delivery
//!
//! ## Operator-facing
//!
//! - `POST /api/v1/export` - Serialize results to wire format
//! - `GET /api/v1/results/unassigned` - Review queue
//! - `POST /api/v1/results/{result_id}/reassign` - Admin reassignment
//! - `GET /api/v1/metadata` - Server metadata
//!
//! ## Public
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Uptime stub (counters go through the `metrics` facade)

pub mod config;
pub mod error;
pub mod gate;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use gate::{InMemoryReplayCache, ReplayCache};
pub use server::{build_router, start_server};
pub use state::ServerState;
