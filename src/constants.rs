/// Tolerance for floating point comparisons.
pub const EPSILON: f64 = 1e-9;

/// Minimum ray distance. Hits closer than this are rejected so that rays
/// spawned at a surface do not immediately re-intersect it.
pub const RAY_EPSILON: f64 = 1e-6;

/// Radius of the sphere assumed to contain the whole scene. Used for the
/// power and positional densities of infinite lights.
pub const WORLD_RADIUS: f64 = 1e6;
