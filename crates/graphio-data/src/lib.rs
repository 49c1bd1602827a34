//! Data file loading: from on-disk prototype definitions to a validated
//! [`graphio_core::registry::GameRegistry`].
//!
//! [`schema`] holds the serde structs for the file format (RON, JSON, or
//! TOML, detected by extension); [`loader`] discovers the files, resolves
//! cross-references, and rejects corrupt input before any solving starts.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, load_registry};
