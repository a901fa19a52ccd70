/// Half side length of the simulated floor anchor (metres).
pub const FLOOR_HALF_EXTENT: f32 = 5.0;

/// Warm-up interval before the simulated tracker anchors the floor plane.
/// Real trackers need a scan pass before any surface geometry exists.
pub const PLANE_ACQUISITION_SECS: f32 = 1.2;

/// Handheld eye height for the simulation camera (metres).
pub const EYE_HEIGHT: f32 = 1.6;
