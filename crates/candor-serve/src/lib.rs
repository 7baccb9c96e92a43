//! Candor Serve - edge HTTP service for the Candor Fiction website.
//!
//! Two API operations sit behind an origin allow-list:
//!
//! - **Contact relay**: verifies an HMAC-signed, time-bounded form submission
//!   and forwards it by email (Brevo, falling back to Resend).
//! - **Gallery**: lists recent Instagram images through a TTL cache that
//!   serves stale data when the upstream fails.
//!
//! # Architecture
//!
//! - **AppState**: configuration, cache engine, gallery source and mailer
//! - **Routes**: handlers plus the CORS middleware for `/api/*`
//! - **Relay**: email templates, envelopes and provider clients
//! - **Cache**: get-or-compute engine over a pluggable store

pub mod cache;
pub mod config;
mod error;
pub mod gallery;
pub mod relay;
mod routes;
mod state;

pub use self::cache::{CacheEngine, CacheStore, MemoryStore};
pub use self::config::Config;
pub use self::error::{ApiError, ErrorResponse, GENERIC_ERROR};
pub use self::routes::router;
pub use self::state::AppState;
