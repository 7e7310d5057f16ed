// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Number of frame slots allocated when the caller does not specify one
pub const DEFAULT_POOL_CAPACITY: usize = 4;

/// How long the builder sleeps when the frame pool has no ready frame
///
/// One display refresh period at 60 Hz. The builder never blocks on the
/// pool; it polls at this cadence so a stop request is seen quickly.
pub const BUILDER_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Bounded wait on the cloud mailbox per renderer iteration
///
/// The renderer keeps redrawing and servicing surface events even when no
/// new cloud arrives, so this matches one refresh period as well.
pub const RENDER_WAIT_TIMEOUT: Duration = Duration::from_millis(16);

/// Upper bound on how long `stop` waits for a worker thread to exit
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Interval between checks of the worker done flag during shutdown
pub const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// File name prefix for saved point cloud snapshots
pub const SNAPSHOT_PREFIX: &str = "stereo-cloud";

/// Timestamp format appended to snapshot file names (YYYYMMDD_HHMMSS)
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Iterations for the RANSAC plane search
///
/// 3-point samples over clouds in the 10^4..10^5 point range; enough for a
/// dominant plane covering >20% of the points with high probability.
pub const PLANE_RANSAC_ITERATIONS: usize = 120;

/// Coordinate precision written into exported LAS files (1 mm)
pub const LAS_COORDINATE_SCALE: f64 = 0.001;

/// Default pass-through range in meters
pub const DEFAULT_PASS_THROUGH_MIN: f32 = 0.5;
/// Default pass-through range in meters
pub const DEFAULT_PASS_THROUGH_MAX: f32 = 20.0;

/// Default voxel edge length in meters for downsampling
pub const DEFAULT_VOXEL_SIZE: f32 = 0.05;

/// Default search radius in meters for radius outlier removal
pub const DEFAULT_OUTLIER_RADIUS: f32 = 0.15;

/// Default minimum neighbor count for radius outlier removal
pub const DEFAULT_OUTLIER_MIN_NEIGHBORS: usize = 5;

/// Default RANSAC distance threshold in meters for plane detection
pub const DEFAULT_PLANE_THRESHOLD: f32 = 0.05;
