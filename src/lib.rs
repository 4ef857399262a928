//! Workspace facade crate.
//!
//! Host applications can depend on `audio-meta-workspace` and enable the
//! documented features instead of wiring `core-runtime` and `core-metadata`
//! individually.

#[cfg(feature = "metadata")]
pub use core_metadata as metadata;
#[cfg(feature = "metadata")]
pub use core_runtime as runtime;

#[cfg(feature = "metadata")]
pub use core_metadata::{parse, MetadataExtractor, ParsedMetadata};
