//! Core checks and types for the Candor Fiction edge service.
//!
//! This crate is free of network I/O. It provides:
//! - The origin allow-list for browser-initiated requests
//! - The replay window for signed submissions
//! - HMAC-SHA256 signing and constant-time verification
//! - Contact submission and gallery image types
//! - Prometheus metrics helpers

mod error;
pub mod gallery;
pub mod metrics;
pub mod origin;
pub mod replay;
pub mod signature;
pub mod submission;

pub use error::{Error, Result};
pub use gallery::GalleryImage;
pub use origin::{Environment, is_valid_origin};
pub use replay::{ReplayWindow, now_millis};
pub use submission::{ContactSubmission, SignedSubmission};
