use std::collections::HashMap;

use glam::Vec3;

use crate::backend::{
    CaptureError, CapturedFrame, GpuBackend, ImageAccess, ImageId, MemoryBarrier, ProgramId,
    StageId, VertexArrayId,
};
use crate::shader::{ProgramSources, ShaderError, ShaderSource, StageKind};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CompileStage { stage: StageKind, label: String },
    CreateProgram { program: ProgramId, label: String },
    AttachStage { program: ProgramId, stage: StageId },
    Link(ProgramId),
    CreateImage { image: ImageId, width: u32, height: u32 },
    CreateVertexArray { vertex_array: VertexArrayId, vertex_count: u32 },
    Clear,
    UseProgram(Option<ProgramId>),
    SetUniformVec3 { program: ProgramId, name: String, value: Vec3 },
    SetUniformFloat { program: ProgramId, name: String, value: f32 },
    SetUniformInt { program: ProgramId, name: String, value: i32 },
    BindImage { slot: u32, image: Option<ImageId>, access: ImageAccess },
    Dispatch { x: u32, y: u32, z: u32 },
    MemoryBarrier(MemoryBarrier),
    BindTexture { slot: u32, image: Option<ImageId> },
    DrawTriangles { vertex_array: VertexArrayId, vertex_count: u32 },
    ReadPixels,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum UniformValue {
    Vec3(Vec3),
    Float(f32),
    Int(i32),
}

#[derive(Debug, Default)]
struct ProgramRecord {
    label: String,
    stages: Vec<StageKind>,
    linked: bool,
    uniforms: HashMap<String, UniformValue>,
}

/// Output image with compute stores held back until a barrier.
#[derive(Debug)]
struct SimulatedImage {
    width: u32,
    height: u32,
    visible: Vec<f32>,
    pending: Option<Vec<f32>>,
}

/// What the simulated compute program writes on dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ComputeModel {
    /// Re-stores what the image already holds.
    Passthrough,
    /// Stores the named float uniform into every pixel.
    CounterFill(String),
}

/// In-memory [`GpuBackend`] that logs every call and simulates the output
/// image.
///
/// Compute stores land in a pending buffer and only become visible to
/// sampling after a [`MemoryBarrier`], so a draw that is not ordered after the
/// barrier presents stale pixels, the same hazard a real GPU exhibits.
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<GpuCall>,
    stages: Vec<StageKind>,
    programs: Vec<ProgramRecord>,
    images: Vec<SimulatedImage>,
    vertex_arrays: Vec<u32>,
    current_program: Option<ProgramId>,
    image_units: HashMap<u32, (ImageId, ImageAccess)>,
    texture_units: HashMap<u32, ImageId>,
    compute_model: ComputeModel,
    fail_compile_marker: Option<String>,
    fail_link_label: Option<String>,
    frame_open: bool,
    drawn: Option<(u32, u32, Vec<f32>)>,
    last_presented: Option<Vec<f32>>,
    presented_frames: usize,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            stages: Vec::new(),
            programs: Vec::new(),
            images: Vec::new(),
            vertex_arrays: Vec::new(),
            current_program: None,
            image_units: HashMap::new(),
            texture_units: HashMap::new(),
            compute_model: ComputeModel::Passthrough,
            fail_compile_marker: None,
            fail_link_label: None,
            frame_open: false,
            drawn: None,
            last_presented: None,
            presented_frames: 0,
        }
    }

    /// Make the simulated compute program store the float uniform `name` into
    /// every pixel.
    pub fn counter_fill(mut self, name: &str) -> Self {
        self.compute_model = ComputeModel::CounterFill(name.to_string());
        self
    }

    /// Fail compilation of any source containing `marker`.
    pub fn fail_compile_on(mut self, marker: &str) -> Self {
        self.fail_compile_marker = Some(marker.to_string());
        self
    }

    /// Fail linking of the program labelled `label`.
    pub fn fail_link_on(mut self, label: &str) -> Self {
        self.fail_link_label = Some(label.to_string());
        self
    }

    /// Stand-in stage sources. The simulated programs never look at the code.
    pub fn sources() -> ProgramSources {
        ProgramSources {
            compute: ShaderSource::Embedded {
                label: "recorded_compute",
                code: "// simulated",
            },
            vertex: ShaderSource::Embedded {
                label: "recorded_quad_vs",
                code: "// simulated",
            },
            fragment: ShaderSource::Embedded {
                label: "recorded_quad_fs",
                code: "// simulated",
            },
        }
    }

    pub fn calls(&self) -> &[GpuCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn stage_kind(&self, stage: StageId) -> Option<StageKind> {
        self.stages.get(stage.0 as usize).copied()
    }

    pub fn is_linked(&self, program: ProgramId) -> bool {
        self.program(program).is_some_and(|p| p.linked)
    }

    pub fn uniform_vec3(&self, program: ProgramId, name: &str) -> Option<Vec3> {
        match self.uniform(program, name)? {
            UniformValue::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn uniform_float(&self, program: ProgramId, name: &str) -> Option<f32> {
        match self.uniform(program, name)? {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn uniform_int(&self, program: ProgramId, name: &str) -> Option<i32> {
        match self.uniform(program, name)? {
            UniformValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn image_size(&self, image: ImageId) -> Option<(u32, u32)> {
        self.images
            .get(image.0 as usize)
            .map(|img| (img.width, img.height))
    }

    /// The value every pixel of the last presented frame holds, or `None` if
    /// nothing was presented or the pixels disagree.
    pub fn last_presented(&self) -> Option<f32> {
        let pixels = self.last_presented.as_ref()?;
        let first = *pixels.first()?;
        pixels.iter().all(|p| *p == first).then_some(first)
    }

    pub fn presented_frames(&self) -> usize {
        self.presented_frames
    }

    fn program(&self, program: ProgramId) -> Option<&ProgramRecord> {
        self.programs.get(program.0 as usize)
    }

    fn uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        self.program(program)?.uniforms.get(name).copied()
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue) {
        match self.programs.get_mut(program.0 as usize) {
            Some(record) => {
                record.uniforms.insert(name.to_string(), value);
            }
            None => tracing::warn!(?program, name, "uniform set on unknown program"),
        }
    }
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuBackend for RecordingBackend {
    fn compile_stage(
        &mut self,
        stage: StageKind,
        label: &str,
        code: &str,
    ) -> Result<StageId, ShaderError> {
        self.calls.push(GpuCall::CompileStage {
            stage,
            label: label.to_string(),
        });
        if let Some(marker) = self.fail_compile_marker.as_deref() {
            if let Some(line) = code.lines().position(|l| l.contains(marker)) {
                return Err(ShaderError::Compile {
                    stage,
                    label: label.to_string(),
                    code: code.to_string(),
                    diagnostic_log: format!("{}:1: error: unexpected `{marker}`", line + 1),
                });
            }
        }
        self.stages.push(stage);
        Ok(StageId(self.stages.len() as u32 - 1))
    }

    fn create_program(&mut self, label: &str) -> ProgramId {
        let program = ProgramId(self.programs.len() as u32);
        self.programs.push(ProgramRecord {
            label: label.to_string(),
            ..ProgramRecord::default()
        });
        self.calls.push(GpuCall::CreateProgram {
            program,
            label: label.to_string(),
        });
        program
    }

    fn attach_stage(&mut self, program: ProgramId, stage: StageId) {
        self.calls.push(GpuCall::AttachStage { program, stage });
        let kind = self.stage_kind(stage);
        if let (Some(record), Some(kind)) = (self.programs.get_mut(program.0 as usize), kind) {
            record.stages.push(kind);
        }
    }

    fn link(&mut self, program: ProgramId) -> Result<(), ShaderError> {
        self.calls.push(GpuCall::Link(program));
        let fail = self.fail_link_label.clone();
        let Some(record) = self.programs.get_mut(program.0 as usize) else {
            return Err(ShaderError::Link {
                program: format!("{program:?}"),
                diagnostic_log: "no such program".to_string(),
                stages: Vec::new(),
            });
        };
        if record.stages.is_empty() || fail.as_deref() == Some(record.label.as_str()) {
            return Err(ShaderError::Link {
                program: record.label.clone(),
                diagnostic_log: format!("link failed with stages {:?}", record.stages),
                stages: Vec::new(),
            });
        }
        record.linked = true;
        Ok(())
    }

    fn create_output_image(&mut self, width: u32, height: u32) -> ImageId {
        let image = ImageId(self.images.len() as u32);
        let len = width as usize * height as usize;
        self.images.push(SimulatedImage {
            width,
            height,
            visible: vec![0.0; len],
            pending: None,
        });
        self.calls.push(GpuCall::CreateImage {
            image,
            width,
            height,
        });
        image
    }

    fn create_vertex_array(&mut self, positions: &[f32]) -> VertexArrayId {
        let vertex_array = VertexArrayId(self.vertex_arrays.len() as u32);
        let vertex_count = (positions.len() / 3) as u32;
        self.vertex_arrays.push(vertex_count);
        self.calls.push(GpuCall::CreateVertexArray {
            vertex_array,
            vertex_count,
        });
        vertex_array
    }

    fn clear(&mut self, _color: [f32; 4]) {
        self.calls.push(GpuCall::Clear);
        self.frame_open = true;
        self.drawn = None;
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        self.calls.push(GpuCall::UseProgram(program));
        self.current_program = program;
    }

    fn set_uniform_vec3(&mut self, program: ProgramId, name: &str, value: Vec3) {
        self.calls.push(GpuCall::SetUniformVec3 {
            program,
            name: name.to_string(),
            value,
        });
        self.set_uniform(program, name, UniformValue::Vec3(value));
    }

    fn set_uniform_float(&mut self, program: ProgramId, name: &str, value: f32) {
        self.calls.push(GpuCall::SetUniformFloat {
            program,
            name: name.to_string(),
            value,
        });
        self.set_uniform(program, name, UniformValue::Float(value));
    }

    fn set_uniform_int(&mut self, program: ProgramId, name: &str, value: i32) {
        self.calls.push(GpuCall::SetUniformInt {
            program,
            name: name.to_string(),
            value,
        });
        self.set_uniform(program, name, UniformValue::Int(value));
    }

    fn bind_image(&mut self, slot: u32, image: Option<ImageId>, access: ImageAccess) {
        self.calls.push(GpuCall::BindImage {
            slot,
            image,
            access,
        });
        match image {
            Some(image) => {
                self.image_units.insert(slot, (image, access));
            }
            None => {
                self.image_units.remove(&slot);
            }
        }
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.calls.push(GpuCall::Dispatch { x, y, z });
        let Some(program) = self.current_program.filter(|p| self.is_linked(*p)) else {
            tracing::warn!("dispatch without a linked program");
            return;
        };
        let Some((image, access)) = self.image_units.get(&0).copied() else {
            tracing::warn!("dispatch without an image bound to slot 0");
            return;
        };
        if !access.writes() {
            return;
        }
        let fill = match &self.compute_model {
            ComputeModel::Passthrough => None,
            ComputeModel::CounterFill(name) => Some(self.uniform_float(program, name).unwrap_or(0.0)),
        };
        if let Some(img) = self.images.get_mut(image.0 as usize) {
            let stored = match fill {
                Some(value) => vec![value; img.visible.len()],
                None => img.visible.clone(),
            };
            img.pending = Some(stored);
        }
    }

    fn memory_barrier(&mut self, barrier: MemoryBarrier) {
        self.calls.push(GpuCall::MemoryBarrier(barrier));
        for img in &mut self.images {
            if let Some(pending) = img.pending.take() {
                img.visible = pending;
            }
        }
    }

    fn bind_texture(&mut self, slot: u32, image: Option<ImageId>) {
        self.calls.push(GpuCall::BindTexture { slot, image });
        match image {
            Some(image) => {
                self.texture_units.insert(slot, image);
            }
            None => {
                self.texture_units.remove(&slot);
            }
        }
    }

    fn draw_triangles(&mut self, vertex_array: VertexArrayId, vertex_count: u32) {
        self.calls.push(GpuCall::DrawTriangles {
            vertex_array,
            vertex_count,
        });
        let Some(image) = self.texture_units.get(&0).copied() else {
            tracing::warn!("draw without a texture bound to slot 0");
            return;
        };
        if let Some(img) = self.images.get(image.0 as usize) {
            self.drawn = Some((img.width, img.height, img.visible.clone()));
        }
    }

    fn read_pixels(&mut self) -> Result<CapturedFrame, CaptureError> {
        self.calls.push(GpuCall::ReadPixels);
        if !self.frame_open {
            return Err(CaptureError::NoFrame);
        }
        let Some((width, height, pixels)) = &self.drawn else {
            return Err(CaptureError::Readback("nothing drawn this frame".to_string()));
        };
        let rgba = pixels
            .iter()
            .flat_map(|v| {
                let c = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                [c, c, c, 255]
            })
            .collect();
        Ok(CapturedFrame {
            width: *width,
            height: *height,
            rgba,
        })
    }

    fn present_frame(&mut self) {
        self.calls.push(GpuCall::Present);
        self.frame_open = false;
        self.last_presented = self.drawn.take().map(|(_, _, pixels)| pixels);
        self.presented_frames += 1;
    }
}
