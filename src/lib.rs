//! # csvfiler
//!
//! A small storage service that keeps, for each named file, a
//! deduplicated set of unsigned integer identifiers, persisted as
//! comma-separated text on disk:
//! - Global id uniqueness enforced through a hash-bucketed sorted index
//! - Reference counting so ids shared across files stay unique-checked
//! - Full rollback of partial inserts on duplicate or I/O failure
//! - Startup reload that reconstructs the engine from the directory
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP API (actix-web)                     │
//! │        write / read / delete-ids / delete-file routes        │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                                │
//! │            (single Mutex over all engine state)              │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!     ┌─────────────┐               ┌──────────────┐
//!     │ BucketIndex │               │  FileStore   │
//!     │ + refcounts │               │ (text files) │
//!     └─────────────┘               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod index;
pub mod store;
pub mod engine;
pub mod api;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FilerError, Result};
pub use config::Config;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of csvfiler
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
