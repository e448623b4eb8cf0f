//! Shared configuration for the lumen progressive renderer.
//!
//! # Invariants
//! - The output surface is tiled exactly by compute workgroups; a surface that
//!   is not an integer multiple of the tile size is rejected at construction.

pub mod config;

pub use config::{
    ConfigError, FAR_PLANE, FIELD_OF_VIEW_DEGREES, INTERACTION_RADIUS, NEAR_PLANE, SURFACE_HEIGHT,
    SURFACE_WIDTH, SurfaceConfig, TILE_HEIGHT, TILE_WIDTH,
};

pub fn crate_info() -> &'static str {
    "lumen-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
