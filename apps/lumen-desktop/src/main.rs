use anyhow::{Context, Result};
use clap::Parser;
use clap::builder::PossibleValuesParser;
use glam::Vec2;
use lumen_common::SurfaceConfig;
use lumen_input::PointerState;
use lumen_render::{Camera, FrameInput, FrameScheduler, ProgramSources, Programs, Scene};
use lumen_render_wgpu::{GpuContext, WgpuBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

const TITLE: &str = "Lumen";
/// Frames between window title refreshes while accumulating.
const TITLE_INTERVAL: u64 = 30;

#[derive(Parser)]
#[command(name = "lumen-desktop", about = "Progressive GPU renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Scene preset
    #[arg(long, default_value = "orbit", value_parser = PossibleValuesParser::new(Scene::PRESETS))]
    scene: String,

    /// Load compute.wgsl, quad.vert.wgsl and quad.frag.wgsl from this directory
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Replace the path tracer with the counter-fill debug kernel
    #[arg(long)]
    debug_fill: bool,

    /// Directory F3 screenshots are written to
    #[arg(long, default_value = ".")]
    screenshot_dir: PathBuf,
}

/// Everything that exists once the window and GPU are up.
struct Viewer {
    window: Arc<Window>,
    backend: WgpuBackend,
    scheduler: FrameScheduler,
    camera: Camera,
}

struct App {
    surface: SurfaceConfig,
    scene: Scene,
    sources: ProgramSources,
    screenshot_dir: PathBuf,
    viewer: Option<Viewer>,
    pointer: PointerState,
    capture_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(cli: Cli, surface: SurfaceConfig, scene: Scene) -> Self {
        let sources = match &cli.shader_dir {
            Some(dir) => ProgramSources::from_dir(dir),
            None => lumen_render_wgpu::embedded_sources(cli.debug_fill),
        };
        Self {
            surface,
            scene,
            sources,
            screenshot_dir: cli.screenshot_dir,
            viewer: None,
            pointer: PointerState::idle(surface.width(), surface.height()),
            capture_requested: false,
            fatal: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<Viewer> {
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(PhysicalSize::new(self.surface.width(), self.surface.height()));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );
        let size = window.inner_size();
        self.pointer = PointerState::idle(size.width, size.height);

        let ctx = GpuContext::new(window.clone(), size.width, size.height)
            .context("failed to initialize GPU")?;
        let mut backend = WgpuBackend::new(ctx, self.surface, &self.scene.uniforms);
        let programs = Programs::build(&mut backend, &self.sources)
            .context("failed to build shader programs")?;

        let camera = self.scene.camera();
        let scheduler =
            FrameScheduler::new(&mut backend, &self.scene, self.surface, programs, &camera);

        Ok(Viewer {
            window,
            backend,
            scheduler,
            camera,
        })
    }

    fn redraw(&mut self) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        let input = FrameInput {
            pointer: self.pointer,
            capture: std::mem::take(&mut self.capture_requested),
        };
        let report = viewer
            .scheduler
            .run_frame(&mut viewer.backend, &mut viewer.camera, &input);

        match report.capture {
            Some(Ok(frame)) => {
                if let Err(err) = lumen_render::save_screenshot(&frame, &self.screenshot_dir) {
                    tracing::error!("screenshot failed: {err}");
                }
            }
            Some(Err(err)) => tracing::error!("screenshot capture failed: {err}"),
            None => {}
        }

        if report.pose_changed || report.frame % TITLE_INTERVAL == 0 {
            viewer.window.set_title(&format!(
                "{TITLE} | {} | samples: {}",
                self.scene.name, report.sample_count
            ));
        }
        viewer.window.request_redraw();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::F3 => {
                self.capture_requested = true;
                tracing::debug!("screenshot requested");
            }
            _ => {}
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.viewer.is_some() {
            return;
        }
        match self.start(event_loop) {
            Ok(viewer) => {
                viewer.window.request_redraw();
                self.viewer = Some(viewer);
            }
            Err(err) => {
                self.fatal = Some(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.pointer.window_size = Vec2::new(new_size.width as f32, new_size.height as f32);
                if let Some(viewer) = &mut self.viewer {
                    viewer.backend.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.pointer.position = Vec2::new(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.pointer.primary_pressed = state == ElementState::Pressed;
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.handle_key(event_loop, key);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("lumen-desktop starting");

    let surface = SurfaceConfig::reference();
    let scene = Scene::preset(&cli.scene, &surface)
        .with_context(|| format!("unknown scene `{}`", cli.scene))?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(cli, surface, scene);
    event_loop.run_app(&mut app)?;

    if let Some(err) = app.fatal.take() {
        return Err(err);
    }
    Ok(())
}
