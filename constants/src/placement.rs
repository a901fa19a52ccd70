/// Reticle ring dimensions (metres).
pub const RETICLE_INNER_RADIUS: f32 = 0.10;
pub const RETICLE_OUTER_RADIUS: f32 = 0.14;

/// Lift applied along the surface normal to avoid z-fighting with the plane.
pub const RETICLE_SURFACE_OFFSET: f32 = 0.005;

/// Reticle tint (linear RGBA).
pub const RETICLE_COLOUR: [f32; 4] = [1.0, 1.0, 1.0, 0.85];

/// Fallback placeable when no catalog entry has loaded: demo cube edge length (metres).
pub const DEFAULT_PLACEABLE_SIZE: f32 = 0.3;

/// Fallback placeable colour (linear RGB).
pub const DEFAULT_PLACEABLE_COLOUR: [f32; 3] = [0.1, 0.3, 0.9];
