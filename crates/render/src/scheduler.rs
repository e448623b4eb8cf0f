use lumen_common::SurfaceConfig;
use lumen_input::{InteractionController, PointerState};

use crate::accumulation::FrameState;
use crate::backend::{
    CaptureError, CapturedFrame, GpuBackend, ImageAccess, ImageId, MemoryBarrier, VertexArrayId,
};
use crate::camera::Camera;
use crate::programs::Programs;
use crate::scene::{Scene, UniformNames};

/// Full-screen quad as two triangles of `(x, y, 0)` positions.
#[rustfmt::skip]
pub const FULLSCREEN_QUAD: [f32; 18] = [
    -1.0, -1.0, 0.0,
     1.0, -1.0, 0.0,
    -1.0,  1.0, 0.0,
     1.0, -1.0, 0.0,
    -1.0,  1.0, 0.0,
     1.0,  1.0, 0.0,
];

pub const QUAD_VERTEX_COUNT: u32 = (FULLSCREEN_QUAD.len() / 3) as u32;

/// Image slot the compute program stores into.
pub const OUTPUT_IMAGE_SLOT: u32 = 0;
/// Texture slot the raster program samples from.
pub const OUTPUT_TEXTURE_SLOT: u32 = 0;

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Where the scheduler is within one presented frame. Always cyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramePhase {
    Clearing,
    Dispatching,
    Barrier,
    Drawing,
    Presenting,
    PollingInput,
}

impl FramePhase {
    pub fn next(self) -> Self {
        match self {
            FramePhase::Clearing => FramePhase::Dispatching,
            FramePhase::Dispatching => FramePhase::Barrier,
            FramePhase::Barrier => FramePhase::Drawing,
            FramePhase::Drawing => FramePhase::Presenting,
            FramePhase::Presenting => FramePhase::PollingInput,
            FramePhase::PollingInput => FramePhase::Clearing,
        }
    }
}

/// The output image and the quad that presents it. Created once, never
/// reallocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSurface {
    pub image: ImageId,
    pub quad: VertexArrayId,
    pub vertex_count: u32,
}

/// Input gathered while polling, consumed by the next frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInput {
    pub pointer: PointerState,
    /// Read back this frame's pixels before presenting.
    pub capture: bool,
}

impl FrameInput {
    pub fn idle(pointer: PointerState) -> Self {
        Self {
            pointer,
            capture: false,
        }
    }
}

/// What one frame did.
#[derive(Debug)]
pub struct FrameReport {
    /// Zero-based index of the frame.
    pub frame: u64,
    /// Counter value uploaded to the compute program.
    pub sample_count: u32,
    pub pose_changed: bool,
    pub capture: Option<Result<CapturedFrame, CaptureError>>,
}

/// Per-frame orchestrator for the compute/present loop.
///
/// Owns the output surface and the accumulation counter; the camera is owned
/// by the caller and passed in each frame.
pub struct FrameScheduler {
    surface: SurfaceConfig,
    programs: Programs,
    uniforms: UniformNames,
    controller: InteractionController,
    output: OutputSurface,
    state: FrameState,
    phase: FramePhase,
    frames: u64,
}

impl FrameScheduler {
    /// Allocate the output surface and upload the initial uniforms.
    pub fn new<B: GpuBackend>(
        backend: &mut B,
        scene: &Scene,
        surface: SurfaceConfig,
        programs: Programs,
        camera: &Camera,
    ) -> Self {
        let image = backend.create_output_image(surface.width(), surface.height());
        let quad = backend.create_vertex_array(&FULLSCREEN_QUAD);
        let output = OutputSurface {
            image,
            quad,
            vertex_count: QUAD_VERTEX_COUNT,
        };

        let scheduler = Self {
            surface,
            programs,
            uniforms: scene.uniforms,
            controller: scene.controller(),
            output,
            state: scene.frame_state(),
            phase: FramePhase::PollingInput,
            frames: 0,
        };

        backend.use_program(Some(programs.compute));
        scheduler.upload_camera(backend, camera);
        backend.set_uniform_float(
            programs.compute,
            scheduler.uniforms.sample_count,
            scheduler.state.sample_count() as f32,
        );
        backend.use_program(Some(programs.raster));
        backend.set_uniform_int(
            programs.raster,
            scheduler.uniforms.sampler,
            OUTPUT_TEXTURE_SLOT as i32,
        );
        backend.use_program(None);

        let (x, y, _) = surface.workgroups();
        tracing::info!(
            width = surface.width(),
            height = surface.height(),
            workgroups_x = x,
            workgroups_y = y,
            scene = scene.name,
            "frame scheduler ready"
        );
        scheduler
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn sample_count(&self) -> u32 {
        self.state.sample_count()
    }

    pub fn frame_state(&self) -> &FrameState {
        &self.state
    }

    pub fn output(&self) -> &OutputSurface {
        &self.output
    }

    pub fn surface(&self) -> &SurfaceConfig {
        &self.surface
    }

    /// Run one full cycle, ending in [`FramePhase::PollingInput`].
    ///
    /// The barrier between dispatch and draw is what keeps the raster stage
    /// from sampling the image while compute writes are still in flight.
    pub fn run_frame<B: GpuBackend>(
        &mut self,
        backend: &mut B,
        camera: &mut Camera,
        input: &FrameInput,
    ) -> FrameReport {
        let _span = tracing::trace_span!("frame", index = self.frames).entered();

        self.enter(FramePhase::Clearing);
        backend.clear(CLEAR_COLOR);

        let candidate = self.controller.candidate_position(&input.pointer);
        if let Some(position) = candidate {
            camera.set_position(position);
            tracing::debug!(?position, "camera moved, restarting accumulation");
        }
        let sample_count = self.state.advance(candidate.is_some());

        self.enter(FramePhase::Dispatching);
        let compute = self.programs.compute;
        backend.use_program(Some(compute));
        self.upload_camera(backend, camera);
        backend.set_uniform_float(compute, self.uniforms.sample_count, sample_count as f32);
        backend.bind_image(
            OUTPUT_IMAGE_SLOT,
            Some(self.output.image),
            ImageAccess::ReadWrite,
        );
        let (x, y, z) = self.surface.workgroups();
        backend.dispatch_workgroups(x, y, z);

        self.enter(FramePhase::Barrier);
        backend.bind_image(OUTPUT_IMAGE_SLOT, None, ImageAccess::ReadWrite);
        backend.memory_barrier(MemoryBarrier::ShaderImageAccess);

        self.enter(FramePhase::Drawing);
        backend.use_program(Some(self.programs.raster));
        backend.bind_texture(OUTPUT_TEXTURE_SLOT, Some(self.output.image));
        backend.draw_triangles(self.output.quad, self.output.vertex_count);
        backend.bind_texture(OUTPUT_TEXTURE_SLOT, None);
        backend.use_program(None);

        self.enter(FramePhase::Presenting);
        let capture = input.capture.then(|| backend.read_pixels());
        backend.present_frame();

        self.enter(FramePhase::PollingInput);
        let report = FrameReport {
            frame: self.frames,
            sample_count,
            pose_changed: candidate.is_some(),
            capture,
        };
        self.frames += 1;
        report
    }

    fn enter(&mut self, phase: FramePhase) {
        debug_assert_eq!(self.phase.next(), phase, "frame phases out of order");
        tracing::trace!(?phase, "frame phase");
        self.phase = phase;
    }

    fn upload_camera<B: GpuBackend>(&self, backend: &mut B, camera: &Camera) {
        let program = self.programs.compute;
        backend.set_uniform_vec3(program, self.uniforms.camera_position, camera.position());
        let rays = camera.frustum().corner_rays();
        for (name, ray) in self.uniforms.corner_rays().into_iter().zip(rays) {
            backend.set_uniform_vec3(program, name, ray);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{GpuCall, RecordingBackend};
    use glam::Vec3;

    fn small_surface() -> SurfaceConfig {
        SurfaceConfig::new(32, 16, 16, 8).unwrap()
    }

    fn setup(scene: &Scene) -> (RecordingBackend, FrameScheduler, Camera) {
        let surface = small_surface();
        let mut backend = RecordingBackend::new().counter_fill(scene.uniforms.sample_count);
        let programs = Programs::build(&mut backend, &RecordingBackend::sources()).unwrap();
        let camera = scene.camera();
        let scheduler = FrameScheduler::new(&mut backend, scene, surface, programs, &camera);
        backend.clear_calls();
        (backend, scheduler, camera)
    }

    fn index_of(calls: &[GpuCall], pred: impl Fn(&GpuCall) -> bool) -> usize {
        calls.iter().position(|c| pred(c)).unwrap()
    }

    fn idle() -> FrameInput {
        FrameInput::idle(PointerState::idle(32, 16))
    }

    fn dragging(x: f32, y: f32) -> FrameInput {
        FrameInput::idle(PointerState::idle(32, 16).pressed_at(x, y))
    }

    #[test]
    fn phases_cycle_back_to_polling() {
        let mut phase = FramePhase::PollingInput;
        for _ in 0..6 {
            phase = phase.next();
        }
        assert_eq!(phase, FramePhase::PollingInput);
    }

    #[test]
    fn frame_issues_calls_in_contract_order() {
        let scene = Scene::orbit(&small_surface());
        let (mut backend, mut scheduler, mut camera) = setup(&scene);
        scheduler.run_frame(&mut backend, &mut camera, &idle());
        assert_eq!(scheduler.phase(), FramePhase::PollingInput);

        let calls = backend.calls();
        let clear = index_of(calls, |c| matches!(c, GpuCall::Clear));
        let dispatch = index_of(calls, |c| matches!(c, GpuCall::Dispatch { .. }));
        let unbind = index_of(calls, |c| matches!(c, GpuCall::BindImage { image: None, .. }));
        let barrier = index_of(calls, |c| matches!(c, GpuCall::MemoryBarrier(_)));
        let draw = index_of(calls, |c| matches!(c, GpuCall::DrawTriangles { .. }));
        let present = index_of(calls, |c| matches!(c, GpuCall::Present));
        assert!(clear < dispatch);
        assert!(dispatch < unbind && unbind < barrier);
        assert!(barrier < draw && draw < present);
        assert_eq!(*calls.last().unwrap(), GpuCall::Present);
    }

    #[test]
    fn dispatch_covers_surface_exactly() {
        let scene = Scene::orbit(&small_surface());
        let (mut backend, mut scheduler, mut camera) = setup(&scene);
        scheduler.run_frame(&mut backend, &mut camera, &idle());
        assert!(
            backend
                .calls()
                .contains(&GpuCall::Dispatch { x: 2, y: 2, z: 1 })
        );
        assert!(backend.calls().contains(&GpuCall::DrawTriangles {
            vertex_array: scheduler.output().quad,
            vertex_count: 6,
        }));
    }

    #[test]
    fn counter_law_over_interaction_and_idle_frames() {
        let scene = Scene::orbit(&small_surface());
        let (mut backend, mut scheduler, mut camera) = setup(&scene);
        for _ in 0..4 {
            scheduler.run_frame(&mut backend, &mut camera, &idle());
        }
        assert_eq!(scheduler.sample_count(), 4);

        let mut seq = vec![
            scheduler
                .run_frame(&mut backend, &mut camera, &dragging(5.0, 5.0))
                .sample_count,
        ];
        for _ in 0..5 {
            seq.push(scheduler.run_frame(&mut backend, &mut camera, &idle()).sample_count);
        }
        assert_eq!(seq, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(
            backend.uniform_float(scheduler.programs.compute, "count"),
            Some(6.0)
        );
    }

    #[test]
    fn drag_moves_camera_and_uploads_new_rays() {
        let scene = Scene::orbit(&small_surface());
        let (mut backend, mut scheduler, mut camera) = setup(&scene);
        let report = scheduler.run_frame(&mut backend, &mut camera, &dragging(0.0, 0.0));
        assert!(report.pose_changed);
        assert!((camera.position().length() - 3.0).abs() < 1e-5);
        assert_ne!(camera.position(), Vec3::new(0.0, 0.0, 3.0));

        let compute = scheduler.programs.compute;
        assert_eq!(
            backend.uniform_vec3(compute, "camPos"),
            Some(camera.position())
        );
        assert_eq!(
            backend.uniform_vec3(compute, "ray11"),
            Some(camera.frustum().ray11)
        );
    }

    #[test]
    fn idle_frame_leaves_pose_alone() {
        let scene = Scene::orbit(&small_surface());
        let (mut backend, mut scheduler, mut camera) = setup(&scene);
        let before = camera;
        let report = scheduler.run_frame(&mut backend, &mut camera, &idle());
        assert!(!report.pose_changed);
        assert_eq!(before, camera);
    }

    #[test]
    fn presented_image_matches_same_frame_counter() {
        let scene = Scene::orbit(&small_surface());
        let (mut backend, mut scheduler, mut camera) = setup(&scene);
        let inputs = [idle(), idle(), dragging(3.0, 9.0), idle(), idle(), idle()];
        for input in &inputs {
            let report = scheduler.run_frame(&mut backend, &mut camera, input);
            assert_eq!(
                backend.last_presented(),
                Some(report.sample_count as f32),
                "frame {} presented stale pixels",
                report.frame
            );
        }
        assert_eq!(backend.presented_frames(), inputs.len());
    }

    #[test]
    fn free_running_scene_never_resets() {
        let scene = Scene::overlook(&small_surface());
        let (mut backend, mut scheduler, mut camera) = setup(&scene);
        let counts: Vec<u32> = [idle(), dragging(1.0, 1.0), dragging(2.0, 2.0), idle()]
            .iter()
            .map(|i| scheduler.run_frame(&mut backend, &mut camera, i).sample_count)
            .collect();
        assert_eq!(counts, vec![1, 2, 3, 4]);
        assert_eq!(
            backend.uniform_float(scheduler.programs.compute, "frame"),
            Some(4.0)
        );
    }

    #[test]
    fn capture_reads_back_before_present() {
        let scene = Scene::orbit(&small_surface());
        let (mut backend, mut scheduler, mut camera) = setup(&scene);
        let mut input = idle();
        input.capture = true;
        let report = scheduler.run_frame(&mut backend, &mut camera, &input);
        let frame = report.capture.unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (32, 16));
        assert_eq!(frame.rgba.len(), 32 * 16 * 4);

        let calls = backend.calls();
        let read = calls.iter().position(|c| *c == GpuCall::ReadPixels).unwrap();
        let present = calls.iter().position(|c| *c == GpuCall::Present).unwrap();
        assert!(read < present);
    }

    #[test]
    fn startup_uploads_initial_uniforms() {
        let scene = Scene::orbit(&small_surface());
        let surface = small_surface();
        let mut backend = RecordingBackend::new();
        let programs = Programs::build(&mut backend, &RecordingBackend::sources()).unwrap();
        let camera = scene.camera();
        let scheduler = FrameScheduler::new(&mut backend, &scene, surface, programs, &camera);
        assert_eq!(scheduler.frames(), 0);
        assert_eq!(backend.uniform_int(programs.raster, "tex"), Some(0));
        assert_eq!(backend.uniform_float(programs.compute, "count"), Some(1.0));
        assert_eq!(
            backend.uniform_vec3(programs.compute, "ray00"),
            Some(camera.frustum().ray00)
        );
        assert_eq!(backend.image_size(scheduler.output().image), Some((32, 16)));
    }
}
