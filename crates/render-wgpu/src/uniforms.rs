use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use lumen_render::UniformNames;

/// Host mirror of the compute kernels' `Camera` uniform block.
///
/// `vec3` members are 16-byte aligned in the uniform address space, so each
/// ray carries a trailing pad. The counter packs into the position's pad.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct ComputeUniforms {
    pub position: [f32; 3],
    pub sample_count: f32,
    pub ray00: [f32; 3],
    _pad0: f32,
    pub ray01: [f32; 3],
    _pad1: f32,
    pub ray10: [f32; 3],
    _pad2: f32,
    pub ray11: [f32; 3],
    _pad3: f32,
}

/// Field of the uniform block a name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformSlot {
    CameraPosition,
    Ray00,
    Ray01,
    Ray10,
    Ray11,
    SampleCount,
    /// Texture unit of the raster sampler; only unit 0 exists.
    Sampler,
}

impl ComputeUniforms {
    /// Store a vector; returns `false` if `slot` is not a vector field.
    pub fn set_vec3(&mut self, slot: UniformSlot, value: Vec3) -> bool {
        let field = match slot {
            UniformSlot::CameraPosition => &mut self.position,
            UniformSlot::Ray00 => &mut self.ray00,
            UniformSlot::Ray01 => &mut self.ray01,
            UniformSlot::Ray10 => &mut self.ray10,
            UniformSlot::Ray11 => &mut self.ray11,
            UniformSlot::SampleCount | UniformSlot::Sampler => return false,
        };
        *field = value.to_array();
        true
    }

    /// Store a scalar; returns `false` if `slot` is not a scalar field.
    pub fn set_float(&mut self, slot: UniformSlot, value: f32) -> bool {
        match slot {
            UniformSlot::SampleCount => {
                self.sample_count = value;
                true
            }
            _ => false,
        }
    }
}

/// Resolves the scene's uniform names to block fields.
#[derive(Debug, Clone)]
pub struct UniformSlots {
    by_name: HashMap<&'static str, UniformSlot>,
}

impl UniformSlots {
    pub fn new(names: &UniformNames) -> Self {
        let by_name = HashMap::from([
            (names.camera_position, UniformSlot::CameraPosition),
            (names.ray00, UniformSlot::Ray00),
            (names.ray01, UniformSlot::Ray01),
            (names.ray10, UniformSlot::Ray10),
            (names.ray11, UniformSlot::Ray11),
            (names.sample_count, UniformSlot::SampleCount),
            (names.sampler, UniformSlot::Sampler),
        ]);
        Self { by_name }
    }

    pub fn resolve(&self, name: &str) -> Option<UniformSlot> {
        self.by_name.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<ComputeUniforms>(), 80);
        assert_eq!(std::mem::offset_of!(ComputeUniforms, sample_count), 12);
        assert_eq!(std::mem::offset_of!(ComputeUniforms, ray00), 16);
        assert_eq!(std::mem::offset_of!(ComputeUniforms, ray11), 64);
    }

    #[test]
    fn names_resolve_per_scene() {
        let orbit = UniformSlots::new(&UniformNames::ORBIT);
        assert_eq!(orbit.resolve("camPos"), Some(UniformSlot::CameraPosition));
        assert_eq!(orbit.resolve("count"), Some(UniformSlot::SampleCount));
        assert_eq!(orbit.resolve("frame"), None);

        let overlook = UniformSlots::new(&UniformNames::OVERLOOK);
        assert_eq!(overlook.resolve("eye"), Some(UniformSlot::CameraPosition));
        assert_eq!(overlook.resolve("frame"), Some(UniformSlot::SampleCount));
    }

    #[test]
    fn setters_reject_mismatched_kinds() {
        let mut block = ComputeUniforms::default();
        assert!(block.set_vec3(UniformSlot::Ray10, Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(block.ray10, [1.0, 2.0, 3.0]);
        assert!(!block.set_vec3(UniformSlot::SampleCount, Vec3::ONE));
        assert!(block.set_float(UniformSlot::SampleCount, 4.0));
        assert!(!block.set_float(UniformSlot::Ray00, 4.0));
        assert_eq!(bytemuck::bytes_of(&block)[12..16], 4.0f32.to_ne_bytes());
    }
}
