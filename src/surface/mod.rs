//! Surface construction: screening, solving, interpolation and validation
//! for one option type at a time.

pub mod config;
pub mod filter;
pub mod pipeline;
pub mod types;
pub mod validate;

pub use pipeline::{build_surface, build_surfaces, BuildStage};
