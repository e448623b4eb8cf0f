use serde::Serialize;
use thiserror::Error;

/// Width of the output surface in pixels.
pub const SURFACE_WIDTH: u32 = 1024;
/// Height of the output surface in pixels.
pub const SURFACE_HEIGHT: u32 = 512;
/// Compute workgroup width in invocations.
pub const TILE_WIDTH: u32 = 16;
/// Compute workgroup height in invocations.
pub const TILE_HEIGHT: u32 = 8;
/// Radius of the sphere the pointer orbits the camera on.
pub const INTERACTION_RADIUS: f32 = 3.0;
/// Vertical field of view in degrees.
pub const FIELD_OF_VIEW_DEGREES: f32 = 60.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

/// Rejected surface/tile layouts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("surface dimensions must be non-zero, got {width}x{height}")]
    EmptySurface { width: u32, height: u32 },
    #[error("tile dimensions must be non-zero, got {width}x{height}")]
    EmptyTile { width: u32, height: u32 },
    #[error("surface {axis} {surface} is not a multiple of tile {axis} {tile}")]
    PartialTile {
        axis: &'static str,
        surface: u32,
        tile: u32,
    },
}

/// Output surface size and the compute tile that covers it.
///
/// Only constructible through [`SurfaceConfig::new`], so a value of this type
/// always divides into whole workgroups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurfaceConfig {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
}

impl SurfaceConfig {
    pub fn new(
        width: u32,
        height: u32,
        tile_width: u32,
        tile_height: u32,
    ) -> Result<Self, ConfigError> {
        if width == 0 || height == 0 {
            return Err(ConfigError::EmptySurface { width, height });
        }
        if tile_width == 0 || tile_height == 0 {
            return Err(ConfigError::EmptyTile {
                width: tile_width,
                height: tile_height,
            });
        }
        if width % tile_width != 0 {
            return Err(ConfigError::PartialTile {
                axis: "width",
                surface: width,
                tile: tile_width,
            });
        }
        if height % tile_height != 0 {
            return Err(ConfigError::PartialTile {
                axis: "height",
                surface: height,
                tile: tile_height,
            });
        }
        Ok(Self {
            width,
            height,
            tile_width,
            tile_height,
        })
    }

    /// The fixed 1024x512 surface tiled by 16x8 workgroups.
    pub fn reference() -> Self {
        Self {
            width: SURFACE_WIDTH,
            height: SURFACE_HEIGHT,
            tile_width: TILE_WIDTH,
            tile_height: TILE_HEIGHT,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_width(&self) -> u32 {
        self.tile_width
    }

    pub fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Aspect ratio of the surface (width over height).
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Workgroup grid that covers the surface exactly: `(w / tw, h / th, 1)`.
    pub fn workgroups(&self) -> (u32, u32, u32) {
        (
            self.width / self.tile_width,
            self.height / self.tile_height,
            1,
        )
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_layout_divides_evenly() {
        assert_eq!(SURFACE_WIDTH % TILE_WIDTH, 0);
        assert_eq!(SURFACE_HEIGHT % TILE_HEIGHT, 0);
        let cfg = SurfaceConfig::new(SURFACE_WIDTH, SURFACE_HEIGHT, TILE_WIDTH, TILE_HEIGHT)
            .unwrap();
        assert_eq!(cfg, SurfaceConfig::reference());
        assert_eq!(cfg.workgroups(), (64, 64, 1));
    }

    #[test]
    fn rejects_partial_tiles() {
        let err = SurfaceConfig::new(1000, 512, 16, 8).unwrap_err();
        assert_eq!(
            err,
            ConfigError::PartialTile {
                axis: "width",
                surface: 1000,
                tile: 16
            }
        );
        let err = SurfaceConfig::new(1024, 510, 16, 8).unwrap_err();
        assert!(matches!(err, ConfigError::PartialTile { axis: "height", .. }));
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(matches!(
            SurfaceConfig::new(0, 512, 16, 8),
            Err(ConfigError::EmptySurface { .. })
        ));
        assert!(matches!(
            SurfaceConfig::new(1024, 512, 0, 8),
            Err(ConfigError::EmptyTile { .. })
        ));
    }

    #[test]
    fn aspect_matches_reference() {
        assert_eq!(SurfaceConfig::reference().aspect(), 2.0);
        assert_eq!(SurfaceConfig::reference().pixel_count(), 1024 * 512);
    }

    #[test]
    fn error_message_names_axis() {
        let err = SurfaceConfig::new(1024, 500, 16, 8).unwrap_err();
        assert_eq!(
            err.to_string(),
            "surface height 500 is not a multiple of tile height 8"
        );
    }
}
