use glam::Vec3;
use lumen_common::{FAR_PLANE, FIELD_OF_VIEW_DEGREES, INTERACTION_RADIUS, NEAR_PLANE, SurfaceConfig};
use lumen_input::InteractionController;
use serde::Serialize;

use crate::accumulation::{AccumulationPolicy, FrameState};
use crate::camera::{Camera, Projection};

/// Names the compute and raster programs expose for the values the scheduler
/// uploads each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UniformNames {
    pub camera_position: &'static str,
    pub ray00: &'static str,
    pub ray01: &'static str,
    pub ray10: &'static str,
    pub ray11: &'static str,
    pub sample_count: &'static str,
    /// Sampler the raster program reads the output image through.
    pub sampler: &'static str,
}

impl UniformNames {
    pub const ORBIT: Self = Self {
        camera_position: "camPos",
        ray00: "ray00",
        ray01: "ray01",
        ray10: "ray10",
        ray11: "ray11",
        sample_count: "count",
        sampler: "tex",
    };

    pub const OVERLOOK: Self = Self {
        camera_position: "eye",
        ray00: "ray00",
        ray01: "ray01",
        ray10: "ray10",
        ray11: "ray11",
        sample_count: "frame",
        sampler: "tex",
    };

    /// Corner ray names in `[ray00, ray01, ray10, ray11]` order.
    pub fn corner_rays(&self) -> [&'static str; 4] {
        [self.ray00, self.ray01, self.ray10, self.ray11]
    }
}

/// Everything that distinguishes one program variant from another: initial
/// pose, projection, orbit radius, uniform names and counter policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub name: &'static str,
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub projection: Projection,
    pub interaction_radius: f32,
    pub uniforms: UniformNames,
    pub accumulation: AccumulationPolicy,
}

impl Scene {
    pub const PRESETS: [&'static str; 2] = ["orbit", "overlook"];

    /// Camera on the +Z axis looking at the origin; dragging resets
    /// accumulation.
    pub fn orbit(surface: &SurfaceConfig) -> Self {
        Self {
            name: "orbit",
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            projection: Self::projection_for(surface),
            interaction_radius: INTERACTION_RADIUS,
            uniforms: UniformNames::ORBIT,
            accumulation: AccumulationPolicy::ResetOnInteraction,
        }
    }

    /// Raised, offset viewpoint with a free-running counter.
    pub fn overlook(surface: &SurfaceConfig) -> Self {
        let position = Vec3::new(3.0, 2.0, 7.0);
        Self {
            name: "overlook",
            position,
            target: Vec3::new(0.0, 0.5, 0.0),
            up: Vec3::Y,
            projection: Self::projection_for(surface),
            interaction_radius: position.length(),
            uniforms: UniformNames::OVERLOOK,
            accumulation: AccumulationPolicy::FreeRunning,
        }
    }

    pub fn preset(name: &str, surface: &SurfaceConfig) -> Option<Self> {
        match name {
            "orbit" => Some(Self::orbit(surface)),
            "overlook" => Some(Self::overlook(surface)),
            _ => None,
        }
    }

    pub fn camera(&self) -> Camera {
        Camera::new(self.position, self.target, self.up, self.projection)
    }

    pub fn controller(&self) -> InteractionController {
        InteractionController::new(self.interaction_radius)
    }

    pub fn frame_state(&self) -> FrameState {
        FrameState::new(self.accumulation)
    }

    fn projection_for(surface: &SurfaceConfig) -> Projection {
        Projection::from_degrees(FIELD_OF_VIEW_DEGREES, surface.aspect(), NEAR_PLANE, FAR_PLANE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve_by_name() {
        let surface = SurfaceConfig::reference();
        for name in Scene::PRESETS {
            assert_eq!(Scene::preset(name, &surface).unwrap().name, name);
        }
        assert!(Scene::preset("nope", &surface).is_none());
    }

    #[test]
    fn orbit_matches_reference_setup() {
        let scene = Scene::orbit(&SurfaceConfig::reference());
        assert_eq!(scene.projection.aspect, 2.0);
        assert_eq!(scene.projection.fovy, 60.0_f32.to_radians());
        assert_eq!(scene.controller().radius(), 3.0);
        assert_eq!(scene.uniforms.sample_count, "count");
        assert_eq!(scene.camera().position(), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn overlook_orbits_at_its_own_distance() {
        let scene = Scene::overlook(&SurfaceConfig::reference());
        assert!((scene.interaction_radius - 62.0_f32.sqrt()).abs() < 1e-5);
        assert_eq!(scene.accumulation, AccumulationPolicy::FreeRunning);
        assert!(scene.camera().frustum().is_finite());
    }
}
