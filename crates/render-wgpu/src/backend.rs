use std::collections::HashMap;

use glam::Vec3;
use lumen_common::SurfaceConfig;
use lumen_render::{
    CaptureError, CapturedFrame, GpuBackend, ImageAccess, ImageId, MemoryBarrier, ProgramId,
    ShaderError, StageId, StageKind, UniformNames, VertexArrayId,
};
use wgpu::util::DeviceExt;

use crate::capture;
use crate::context::{GpuContext, OUTPUT_FORMAT};
use crate::shaders::{self, COMPUTE_ENTRY, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::uniforms::{ComputeUniforms, UniformSlot, UniformSlots};

const VERTEX_STRIDE: u64 = 3 * std::mem::size_of::<f32>() as u64;

struct Stage {
    kind: StageKind,
    label: String,
    module: wgpu::ShaderModule,
}

enum Linked {
    Compute {
        pipeline: wgpu::ComputePipeline,
        uniform_buffer: wgpu::Buffer,
    },
    Raster {
        pipeline: wgpu::RenderPipeline,
    },
}

struct Program {
    label: String,
    stages: Vec<StageId>,
    uniforms: ComputeUniforms,
    linked: Option<Linked>,
}

struct Image {
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

struct VertexArray {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

/// Surface texture being built this frame plus its pending commands.
struct Frame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// [`GpuBackend`] over a wgpu device and window surface.
///
/// Each dispatch is submitted on its own, so the submission boundary orders
/// image stores before any later sampling. Raster work for a frame is recorded
/// into one encoder and submitted at present time.
pub struct WgpuBackend {
    ctx: GpuContext,
    surface: SurfaceConfig,
    slots: UniformSlots,
    compute_layout: wgpu::BindGroupLayout,
    raster_layout: wgpu::BindGroupLayout,
    compute_pipeline_layout: wgpu::PipelineLayout,
    raster_pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,

    stages: Vec<Stage>,
    programs: Vec<Program>,
    images: Vec<Image>,
    vertex_arrays: Vec<VertexArray>,
    compute_bind_groups: HashMap<(ProgramId, ImageId), wgpu::BindGroup>,
    raster_bind_groups: HashMap<ImageId, wgpu::BindGroup>,

    active_program: Option<ProgramId>,
    bound_image: Option<(ImageId, ImageAccess)>,
    bound_texture: Option<ImageId>,
    pending_clear: Option<wgpu::Color>,
    unflushed_writes: bool,
    frame: Option<Frame>,
}

impl WgpuBackend {
    pub fn new(ctx: GpuContext, surface: SurfaceConfig, names: &UniformNames) -> Self {
        let device = &ctx.device;

        let compute_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("compute_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::ReadWrite,
                        format: OUTPUT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
            ],
        });

        let raster_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("raster_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                    count: None,
                },
            ],
        });

        let compute_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("compute_pipeline_layout"),
                bind_group_layouts: &[&compute_layout],
                push_constant_ranges: &[],
            });
        let raster_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("raster_pipeline_layout"),
                bind_group_layouts: &[&raster_layout],
                push_constant_ranges: &[],
            });

        // rgba32float is not filterable
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("output_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            surface,
            slots: UniformSlots::new(names),
            compute_layout,
            raster_layout,
            compute_pipeline_layout,
            raster_pipeline_layout,
            sampler,
            stages: Vec::new(),
            programs: Vec::new(),
            images: Vec::new(),
            vertex_arrays: Vec::new(),
            compute_bind_groups: HashMap::new(),
            raster_bind_groups: HashMap::new(),
            active_program: None,
            bound_image: None,
            bound_texture: None,
            pending_clear: None,
            unflushed_writes: false,
            frame: None,
            ctx,
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Reconfigure the window surface. The output image keeps its size and is
    /// stretched over the new surface.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.frame = None;
        self.ctx.config.width = width;
        self.ctx.config.height = height;
        self.ctx.surface.configure(&self.ctx.device, &self.ctx.config);
        tracing::debug!(width, height, "surface resized");
    }

    fn program_mut(&mut self, program: ProgramId) -> Option<&mut Program> {
        let found = self.programs.get_mut(program.0 as usize);
        if found.is_none() {
            tracing::warn!(?program, "unknown program handle");
        }
        found
    }

    /// Acquire the next surface texture unless one is already in flight.
    fn acquire_frame(&mut self) -> Option<&mut Frame> {
        if self.frame.is_none() {
            let texture = match self.ctx.surface.get_current_texture() {
                Ok(texture) => texture,
                Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                    tracing::debug!("surface lost or outdated, reconfiguring");
                    self.ctx.surface.configure(&self.ctx.device, &self.ctx.config);
                    match self.ctx.surface.get_current_texture() {
                        Ok(texture) => texture,
                        Err(err) => {
                            tracing::warn!(%err, "surface unavailable after reconfigure");
                            return None;
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "failed to acquire surface texture");
                    return None;
                }
            };
            let view = texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            let encoder = self
                .ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame_encoder"),
                });
            self.frame = Some(Frame {
                texture,
                view,
                encoder,
            });
        }
        self.frame.as_mut()
    }

    fn load_op(&mut self) -> wgpu::LoadOp<wgpu::Color> {
        match self.pending_clear.take() {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        }
    }

    fn link_compute(&self, label: &str, stages: &[&Stage]) -> Result<Linked, String> {
        let [stage] = stages else {
            return Err(format!("expected one compute stage, found {}", stages.len()));
        };
        if stage.kind != StageKind::Compute {
            return Err(format!("stage `{}` is a {} stage", stage.label, stage.kind));
        }
        let pipeline = self
            .ctx
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(label),
                layout: Some(&self.compute_pipeline_layout),
                module: &stage.module,
                entry_point: Some(COMPUTE_ENTRY),
                compilation_options: Default::default(),
                cache: None,
            });
        let uniform_buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("compute_uniforms"),
                contents: bytemuck::bytes_of(&ComputeUniforms::default()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        Ok(Linked::Compute {
            pipeline,
            uniform_buffer,
        })
    }

    fn link_raster(&self, label: &str, stages: &[&Stage]) -> Result<Linked, String> {
        let vertex = stages.iter().find(|s| s.kind == StageKind::Vertex);
        let fragment = stages.iter().find(|s| s.kind == StageKind::Fragment);
        let (Some(vertex), Some(fragment), 2) = (vertex, fragment, stages.len()) else {
            return Err("expected one vertex and one fragment stage".into());
        };
        let pipeline = self
            .ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&self.raster_pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex.module,
                    entry_point: Some(VERTEX_ENTRY),
                    compilation_options: Default::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: VERTEX_STRIDE,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment.module,
                    entry_point: Some(FRAGMENT_ENTRY),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.ctx.config.format,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });
        Ok(Linked::Raster { pipeline })
    }
}

/// Render compiler messages as `severity line:column: message` lines.
fn format_compilation_info(info: &wgpu::CompilationInfo) -> String {
    info.messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| match &m.location {
            Some(loc) => format!(
                "error {}:{}: {}",
                loc.line_number, loc.line_position, m.message
            ),
            None => format!("error: {}", m.message),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl GpuBackend for WgpuBackend {
    fn compile_stage(
        &mut self,
        stage: StageKind,
        label: &str,
        code: &str,
    ) -> Result<StageId, ShaderError> {
        let code = match stage {
            StageKind::Compute => shaders::specialize_compute(code, &self.surface),
            StageKind::Vertex | StageKind::Fragment => code.to_owned(),
        };

        let device = &self.ctx.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(code.as_str().into()),
        });
        let info = pollster::block_on(module.get_compilation_info());
        let scope_error = pollster::block_on(device.pop_error_scope());

        let mut diagnostic_log = format_compilation_info(&info);
        if let Some(err) = scope_error {
            if diagnostic_log.is_empty() {
                diagnostic_log = err.to_string();
            }
        }
        if !diagnostic_log.is_empty() {
            return Err(ShaderError::Compile {
                stage,
                label: label.to_owned(),
                code,
                diagnostic_log,
            });
        }

        let id = StageId(self.stages.len() as u32);
        self.stages.push(Stage {
            kind: stage,
            label: label.to_owned(),
            module,
        });
        Ok(id)
    }

    fn create_program(&mut self, label: &str) -> ProgramId {
        let id = ProgramId(self.programs.len() as u32);
        self.programs.push(Program {
            label: label.to_owned(),
            stages: Vec::new(),
            uniforms: ComputeUniforms::default(),
            linked: None,
        });
        id
    }

    fn attach_stage(&mut self, program: ProgramId, stage: StageId) {
        if self.stages.get(stage.0 as usize).is_none() {
            tracing::warn!(?stage, "unknown stage handle");
            return;
        }
        if let Some(program) = self.program_mut(program) {
            program.stages.push(stage);
        }
    }

    fn link(&mut self, program: ProgramId) -> Result<(), ShaderError> {
        let Some(entry) = self.programs.get(program.0 as usize) else {
            return Err(ShaderError::Link {
                program: format!("{program:?}"),
                diagnostic_log: "unknown program handle".into(),
                stages: Vec::new(),
            });
        };
        let label = entry.label.clone();
        let stages: Vec<&Stage> = entry
            .stages
            .iter()
            .filter_map(|id| self.stages.get(id.0 as usize))
            .collect();
        let is_compute = stages.iter().any(|s| s.kind == StageKind::Compute);

        self.ctx
            .device
            .push_error_scope(wgpu::ErrorFilter::Validation);
        let linked = if is_compute {
            self.link_compute(&label, &stages)
        } else {
            self.link_raster(&label, &stages)
        };
        let scope_error = pollster::block_on(self.ctx.device.pop_error_scope());

        let linked = match (linked, scope_error) {
            (Ok(linked), None) => linked,
            (Err(diagnostic_log), _) => {
                return Err(ShaderError::Link {
                    program: label,
                    diagnostic_log,
                    stages: Vec::new(),
                });
            }
            (Ok(_), Some(err)) => {
                return Err(ShaderError::Link {
                    program: label,
                    diagnostic_log: err.to_string(),
                    stages: Vec::new(),
                });
            }
        };
        tracing::debug!(program = %label, compute = is_compute, "program linked");
        self.programs[program.0 as usize].linked = Some(linked);
        Ok(())
    }

    fn create_output_image(&mut self, width: u32, height: u32) -> ImageId {
        let texture = self.ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("output_image"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = ImageId(self.images.len() as u32);
        self.images.push(Image {
            view,
            width,
            height,
        });
        tracing::debug!(?id, width, height, "output image created");
        id
    }

    fn create_vertex_array(&mut self, positions: &[f32]) -> VertexArrayId {
        let buffer = self
            .ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quad_vertices"),
                contents: bytemuck::cast_slice(positions),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let id = VertexArrayId(self.vertex_arrays.len() as u32);
        self.vertex_arrays.push(VertexArray {
            buffer,
            vertex_count: (positions.len() / 3) as u32,
        });
        id
    }

    fn clear(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color.map(f64::from);
        self.pending_clear = Some(wgpu::Color { r, g, b, a });
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        if let Some(id) = program {
            if self.programs.get(id.0 as usize).is_none() {
                tracing::warn!(program = ?id, "unknown program handle");
                return;
            }
        }
        self.active_program = program;
    }

    fn set_uniform_vec3(&mut self, program: ProgramId, name: &str, value: Vec3) {
        let Some(slot) = self.slots.resolve(name) else {
            tracing::warn!(name, "unknown uniform");
            return;
        };
        if let Some(entry) = self.program_mut(program) {
            if !entry.uniforms.set_vec3(slot, value) {
                tracing::warn!(name, ?slot, "uniform is not a vec3");
            }
        }
    }

    fn set_uniform_float(&mut self, program: ProgramId, name: &str, value: f32) {
        let Some(slot) = self.slots.resolve(name) else {
            tracing::warn!(name, "unknown uniform");
            return;
        };
        if let Some(entry) = self.program_mut(program) {
            if !entry.uniforms.set_float(slot, value) {
                tracing::warn!(name, ?slot, "uniform is not a float");
            }
        }
    }

    fn set_uniform_int(&mut self, _program: ProgramId, name: &str, value: i32) {
        match self.slots.resolve(name) {
            Some(UniformSlot::Sampler) if value == 0 => {}
            Some(UniformSlot::Sampler) => {
                tracing::warn!(name, value, "only texture unit 0 is available");
            }
            Some(slot) => tracing::warn!(name, ?slot, "uniform is not an int"),
            None => tracing::warn!(name, "unknown uniform"),
        }
    }

    fn bind_image(&mut self, slot: u32, image: Option<ImageId>, access: ImageAccess) {
        if slot != 0 {
            tracing::warn!(slot, "only image slot 0 is available");
            return;
        }
        self.bound_image = image.map(|id| (id, access));
    }

    fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        let Some(program_id) = self.active_program else {
            tracing::warn!("dispatch without an active program");
            return;
        };
        let Some((image_id, access)) = self.bound_image else {
            tracing::warn!("dispatch without a bound image");
            return;
        };
        let Some(image) = self.images.get(image_id.0 as usize) else {
            tracing::warn!(image = ?image_id, "unknown image handle");
            return;
        };
        let program = &self.programs[program_id.0 as usize];
        let Some(Linked::Compute {
            pipeline,
            uniform_buffer,
        }) = &program.linked
        else {
            tracing::warn!(program = %program.label, "dispatch with a non-compute program");
            return;
        };

        let device = &self.ctx.device;
        let bind_group = self
            .compute_bind_groups
            .entry((program_id, image_id))
            .or_insert_with(|| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("compute_bind_group"),
                    layout: &self.compute_layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: uniform_buffer.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&image.view),
                        },
                    ],
                })
            });

        self.ctx
            .queue
            .write_buffer(uniform_buffer, 0, bytemuck::bytes_of(&program.uniforms));

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("compute_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("accumulate_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &*bind_group, &[]);
            pass.dispatch_workgroups(x, y, z);
        }
        self.ctx.queue.submit(std::iter::once(encoder.finish()));

        tracing::trace!(
            x,
            y,
            z,
            width = image.width,
            height = image.height,
            "compute dispatched"
        );
        if access.writes() {
            self.unflushed_writes = true;
        }
    }

    fn memory_barrier(&mut self, barrier: MemoryBarrier) {
        match barrier {
            MemoryBarrier::ShaderImageAccess => {
                // dispatches are already submitted, so later passes observe their stores
                self.unflushed_writes = false;
            }
        }
    }

    fn bind_texture(&mut self, slot: u32, image: Option<ImageId>) {
        if slot != 0 {
            tracing::warn!(slot, "only texture slot 0 is available");
            return;
        }
        self.bound_texture = image;
    }

    fn draw_triangles(&mut self, vertex_array: VertexArrayId, vertex_count: u32) {
        if self.unflushed_writes {
            tracing::error!("draw issued before image stores were made visible");
        }
        let Some(program_id) = self.active_program else {
            tracing::warn!("draw without an active program");
            return;
        };
        let Some(image_id) = self.bound_texture else {
            tracing::warn!("draw without a bound texture");
            return;
        };
        if self.images.get(image_id.0 as usize).is_none()
            || self.vertex_arrays.get(vertex_array.0 as usize).is_none()
        {
            tracing::warn!(image = ?image_id, ?vertex_array, "unknown draw handle");
            return;
        }
        if !matches!(
            self.programs[program_id.0 as usize].linked,
            Some(Linked::Raster { .. })
        ) {
            tracing::warn!(program = ?program_id, "draw with a non-raster program");
            return;
        }

        let load = self.load_op();
        if self.acquire_frame().is_none() {
            return;
        }
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let Some(Linked::Raster { pipeline }) = &self.programs[program_id.0 as usize].linked else {
            return;
        };
        let image = &self.images[image_id.0 as usize];
        let vertices = &self.vertex_arrays[vertex_array.0 as usize];
        let device = &self.ctx.device;
        let bind_group = self.raster_bind_groups.entry(image_id).or_insert_with(|| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("raster_bind_group"),
                layout: &self.raster_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&image.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            })
        });

        let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("present_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &*bind_group, &[]);
        pass.set_vertex_buffer(0, vertices.buffer.slice(..));
        pass.draw(0..vertex_count.min(vertices.vertex_count), 0..1);
    }

    fn read_pixels(&mut self) -> Result<CapturedFrame, CaptureError> {
        let Some(frame) = self.frame.as_mut() else {
            return Err(CaptureError::NoFrame);
        };
        // the encoder holds this frame's present pass, keep it if readback is impossible
        let target = &frame.texture.texture;
        let order = capture::readable(target.format(), target.usage())?;
        let encoder = std::mem::replace(
            &mut frame.encoder,
            self.ctx
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("frame_encoder"),
                }),
        );
        capture::read_texture(
            &self.ctx.device,
            &self.ctx.queue,
            encoder,
            &frame.texture.texture,
            order,
        )
    }

    fn present_frame(&mut self) {
        if let Some(color) = self.pending_clear.take() {
            // nothing was drawn, still honour the clear
            if let Some(frame) = self.acquire_frame() {
                let _pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("clear_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(color),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    ..Default::default()
                });
            }
        }
        let Some(frame) = self.frame.take() else {
            return;
        };
        self.ctx.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.texture.present();
    }
}
