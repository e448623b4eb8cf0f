//! Progressive rendering core: camera frustum math and the compute/present
//! frame loop, written against an abstract [`GpuBackend`].
//!
//! # Invariants
//! - A camera's derived frustum always matches its current pose.
//! - Within a frame, the raster stage never samples the output image before a
//!   memory barrier has made that frame's compute stores visible.
//! - The sample counter is 1 on every frame that moves the camera and grows by
//!   exactly 1 on each idle frame after it.
//!
//! # Testing
//! [`RecordingBackend`] stands in for a GPU: it logs every call and simulates
//! the output image so ordering can be checked without a device. Swap in the
//! wgpu backend without changing the scheduler.

mod accumulation;
mod backend;
mod camera;
mod export;
mod programs;
mod recording;
mod scene;
mod scheduler;
mod shader;

pub use accumulation::{AccumulationPolicy, FrameState};
pub use backend::{
    CaptureError, CapturedFrame, GpuBackend, ImageAccess, ImageId, MemoryBarrier, ProgramId,
    StageId, VertexArrayId,
};
pub use camera::{Camera, Frustum, Projection, REFERENCE_DEPTH};
pub use export::{SCREENSHOT_FILE, save_png, save_screenshot};
pub use programs::Programs;
pub use recording::{GpuCall, RecordingBackend};
pub use scene::{Scene, UniformNames};
pub use scheduler::{
    FULLSCREEN_QUAD, FrameInput, FramePhase, FrameReport, FrameScheduler, OUTPUT_IMAGE_SLOT,
    OUTPUT_TEXTURE_SLOT, OutputSurface, QUAD_VERTEX_COUNT,
};
pub use shader::{
    COMPUTE_FILE, FRAGMENT_FILE, ProgramSources, ShaderError, ShaderSource, StageKind, VERTEX_FILE,
};

pub fn crate_info() -> &'static str {
    "lumen-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
