//! cloudpaint annotation core - brush selection, color edits, and undo
//!
//! This crate provides the pieces needed to paint labels onto a point cloud
//! through a screen-space brush:
//! - [`spatial`] - Balanced k-d tree over point positions
//! - [`projection`] - Renderer contract plus a reference pinhole camera
//! - [`selection`] - Screen-space brush footprint selection
//! - [`state`] - Owner of the original/working/enhanced colors and painted mask
//! - [`enhance`] - Gamma and percentile contrast transforms
//! - [`brush`] - Brush settings and stamp placement along a drag
//! - [`history`] - Undo/redo stacks of stroke diffs
//! - [`pipeline`] - Pointer-driven stroke engine tying it all together
//! - [`cloud`] - Loaded cloud normalization and baseline resolution

pub mod brush;
pub mod cloud;
pub mod constants;
pub mod enhance;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod projection;
pub mod selection;
pub mod spatial;
pub mod state;
pub mod types;
pub mod validation;

pub use brush::*;
pub use cloud::*;
pub use constants::*;
pub use enhance::*;
pub use error::*;
pub use history::*;
pub use pipeline::*;
pub use projection::*;
pub use selection::*;
pub use spatial::*;
pub use state::*;
pub use types::*;
pub use validation::*;

pub use cloudpaint_config as config;
