use glam::Vec3;
use thiserror::Error;

use crate::shader::{ShaderError, StageKind};

/// Handle to a compiled shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(pub u32);

/// Handle to a program (compute, or vertex + fragment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Handle to a 2-D RGBA float image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageId(pub u32);

/// Handle to a vertex array of `vec3` positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub u32);

/// How the compute program may touch a bound image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageAccess {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl ImageAccess {
    pub fn writes(self) -> bool {
        matches!(self, ImageAccess::WriteOnly | ImageAccess::ReadWrite)
    }
}

/// Visibility guarantees a barrier provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryBarrier {
    /// Image stores issued before the barrier are visible to every later
    /// image load or texture sample.
    ShaderImageAccess,
}

/// Pixels read back from the presented surface, tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Failures on the one-shot capture/export path.
///
/// These never abort the frame loop; the caller reports them and carries on.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no frame is in flight to read back")]
    NoFrame,
    #[error("surface readback is not supported: {0}")]
    Unsupported(String),
    #[error("readback failed: {0}")]
    Readback(String),
    #[error("captured buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("failed to write screenshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode screenshot: {0}")]
    Encode(#[from] image::ImageError),
}

/// The graphics capability set the frame scheduler drives.
///
/// Mirrors a bind-then-draw API: programs are activated, uniforms are set by
/// name, images and textures are bound to numbered slots. Frame-time calls
/// have no error path; a backend that cannot honour one logs and skips it.
pub trait GpuBackend {
    /// Compile one stage. The error carries the source and compiler log.
    fn compile_stage(
        &mut self,
        stage: StageKind,
        label: &str,
        code: &str,
    ) -> Result<StageId, ShaderError>;

    fn create_program(&mut self, label: &str) -> ProgramId;

    fn attach_stage(&mut self, program: ProgramId, stage: StageId);

    fn link(&mut self, program: ProgramId) -> Result<(), ShaderError>;

    /// Allocate the RGBA float output image. Called once at startup.
    fn create_output_image(&mut self, width: u32, height: u32) -> ImageId;

    /// Upload `vec3` positions (three floats per vertex). Called once at startup.
    fn create_vertex_array(&mut self, positions: &[f32]) -> VertexArrayId;

    /// Clear the color and depth targets of the frame being built.
    fn clear(&mut self, color: [f32; 4]);

    fn use_program(&mut self, program: Option<ProgramId>);

    fn set_uniform_vec3(&mut self, program: ProgramId, name: &str, value: Vec3);

    fn set_uniform_float(&mut self, program: ProgramId, name: &str, value: f32);

    fn set_uniform_int(&mut self, program: ProgramId, name: &str, value: i32);

    /// Bind (or with `None`, unbind) an image for compute load/store.
    fn bind_image(&mut self, slot: u32, image: Option<ImageId>, access: ImageAccess);

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32);

    fn memory_barrier(&mut self, barrier: MemoryBarrier);

    /// Bind (or with `None`, unbind) an image for sampling by the raster program.
    fn bind_texture(&mut self, slot: u32, image: Option<ImageId>);

    fn draw_triangles(&mut self, vertex_array: VertexArrayId, vertex_count: u32);

    /// Read back the pixels the current frame is about to present.
    fn read_pixels(&mut self) -> Result<CapturedFrame, CaptureError>;

    fn present_frame(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_modes_that_write() {
        assert!(ImageAccess::ReadWrite.writes());
        assert!(ImageAccess::WriteOnly.writes());
        assert!(!ImageAccess::ReadOnly.writes());
    }

    #[test]
    fn capture_error_messages() {
        let err = CaptureError::SizeMismatch {
            expected: 16,
            actual: 12,
        };
        assert_eq!(err.to_string(), "captured buffer holds 12 bytes, expected 16");
        assert_eq!(
            CaptureError::NoFrame.to_string(),
            "no frame is in flight to read back"
        );
    }
}
