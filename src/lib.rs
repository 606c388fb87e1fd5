//! mystbuild: builds MyST page envelopes from parsed document trees.
//!
//! The transformation itself lives in `mystbuild-core`; this crate is the
//! driver around it.
//!
//! ## Modules
//!
//! - `config` - Configuration sources and resolution
//! - `discovery` - Source documents, staleness, build plans
//! - `slug` - Document slugs and output locations
//! - `builder` - Per-document builds and the reference manifest
//! - `output` - Envelope, manifest and CLI response types
//! - `error` - Error types and exit codes

pub use mystbuild_core as engine;

pub mod builder;
pub mod config;
pub mod discovery;
pub mod error;
pub mod output;
pub mod slug;
