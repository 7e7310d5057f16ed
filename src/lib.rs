// SPDX-License-Identifier: MPL-2.0

//! Stereo Cloud - live point cloud pipeline for stereo depth cameras
//!
//! This library turns disparity frames from a stereo camera into colored
//! 3D point clouds and hands them to a renderer, continuously and with
//! bounded memory.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`pool`]: Fixed-capacity frame slot pool between camera and builder
//! - [`cloud`]: Point cloud type, disparity reprojection, filter chain
//! - [`mailbox`]: Single-item handoff between builder and renderer
//! - [`pipeline`]: Worker threads and the pipeline lifecycle
//! - [`export`]: LAS snapshot export of the displayed cloud
//! - [`config`]: Pipeline and filter configuration
//!
//! # Example
//!
//! ```ignore
//! let mut pipeline = PipelineContext::new(PipelineConfig::default())?;
//! pipeline.start(Box::new(my_surface));
//! pipeline.submit(&frame, timestamp)?;
//! ```

pub mod cloud;
pub mod config;
pub mod constants;
pub mod errors;
pub mod export;
pub mod mailbox;
pub mod pipeline;
pub mod pool;

// Re-export the types an embedding application needs
pub use cloud::{CloudPoint, PointCloud};
pub use config::{CameraIntrinsics, FilterParameters, PipelineConfig, Range};
pub use errors::{PipelineError, PipelineResult, SnapshotError, SubmitError};
pub use pipeline::{PickPoint, PipelineContext, RenderSurface, SurfaceEvent};
pub use pool::FrameInput;
