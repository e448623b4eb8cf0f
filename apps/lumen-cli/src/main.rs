use anyhow::{Context, Result, ensure};
use clap::builder::PossibleValuesParser;
use clap::{Parser, Subcommand};
use glam::Vec3;
use lumen_common::SurfaceConfig;
use lumen_input::PointerState;
use lumen_render::{FrameInput, FrameScheduler, Programs, RecordingBackend, Scene};
use serde::Serialize;
use std::ops::Range;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lumen-cli", about = "Headless tooling for the progressive renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, crate info and the fixed surface configuration
    Info,
    /// Derive and print the frustum corner rays for a camera pose
    Frustum {
        /// Scene preset supplying target, up and projection
        #[arg(long, default_value = "orbit", value_parser = PossibleValuesParser::new(Scene::PRESETS))]
        scene: String,
        /// Camera position as x,y,z (defaults to the preset's)
        #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
        position: Option<Vec3>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Drive the frame scheduler against the recording backend
    Simulate {
        #[arg(long, default_value = "overlook", value_parser = PossibleValuesParser::new(Scene::PRESETS))]
        scene: String,
        /// Number of frames to run
        #[arg(short, long, default_value = "12")]
        frames: u64,
        /// First frame with the primary button held
        #[arg(long, default_value = "4")]
        drag_start: u64,
        /// Number of frames the drag lasts
        #[arg(long, default_value = "3")]
        drag_frames: u64,
        /// Print every backend call
        #[arg(long)]
        calls: bool,
        /// Emit the trace as JSON
        #[arg(long)]
        json: bool,
    },
}

/// One line of the simulate trace.
#[derive(Debug, Serialize)]
struct FrameTrace {
    frame: u64,
    dragging: bool,
    sample_count: u32,
    pose_changed: bool,
    presented: Option<f32>,
    position: Vec3,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid component: {e}"))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected 3 components, got {}", parts.len())),
    }
}

fn preset(name: &str, surface: &SurfaceConfig) -> Result<Scene> {
    Scene::preset(name, surface).with_context(|| format!("unknown scene `{name}`"))
}

/// Run `frames` frames against a counter-filling [`RecordingBackend`], holding
/// the primary button during `drag`. Returns the trace and the number of
/// frames presented.
fn simulate(
    scene: &Scene,
    surface: SurfaceConfig,
    frames: u64,
    drag: Range<u64>,
    calls: bool,
) -> Result<(Vec<FrameTrace>, usize)> {
    let mut backend = RecordingBackend::new().counter_fill(scene.uniforms.sample_count);
    let programs = Programs::build(&mut backend, &RecordingBackend::sources())?;
    let mut camera = scene.camera();
    let mut scheduler = FrameScheduler::new(&mut backend, scene, surface, programs, &camera);

    let rest = PointerState::idle(surface.width(), surface.height());
    // drag towards the upper-right quadrant
    let held = rest.pressed_at(surface.width() as f32 * 0.75, surface.height() as f32 * 0.25);

    tracing::info!(scene = %scene.name, frames, ?drag, "simulating");
    let mut trace = Vec::new();
    for frame in 0..frames {
        let dragging = drag.contains(&frame);
        let pointer = if dragging { held } else { rest };
        if calls {
            backend.clear_calls();
        }
        let report = scheduler.run_frame(&mut backend, &mut camera, &FrameInput::idle(pointer));
        if calls {
            for call in backend.calls() {
                eprintln!("  {call:?}");
            }
        }
        trace.push(FrameTrace {
            frame: report.frame,
            dragging,
            sample_count: report.sample_count,
            pose_changed: report.pose_changed,
            presented: backend.last_presented(),
            position: camera.position(),
        });
    }
    Ok((trace, backend.presented_frames()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("lumen-cli starting");

    let surface = SurfaceConfig::reference();

    match cli.command {
        Commands::Info => {
            println!("lumen-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", lumen_common::crate_info());
            println!("input: {}", lumen_input::crate_info());
            println!("render: {}", lumen_render::crate_info());
            let (x, y, z) = surface.workgroups();
            println!(
                "surface: {}x{}, tile {}x{}, workgroups {x}x{y}x{z}",
                surface.width(),
                surface.height(),
                surface.tile_width(),
                surface.tile_height()
            );
            println!("scenes: {}", Scene::PRESETS.join(", "));
        }
        Commands::Frustum {
            scene,
            position,
            json,
        } => {
            let scene = preset(&scene, &surface)?;
            let mut camera = scene.camera();
            if let Some(position) = position {
                camera.set_position(position);
            }
            ensure!(
                camera.frustum().is_finite(),
                "degenerate pose: position {} looking at {}",
                camera.position(),
                camera.target()
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&camera)?);
            } else {
                let frustum = camera.frustum();
                println!(
                    "scene={} position={} target={}",
                    scene.name,
                    camera.position(),
                    camera.target()
                );
                let names = ["ray00", "ray01", "ray10", "ray11"];
                for (name, ray) in names.iter().zip(frustum.corner_rays()) {
                    println!("{name} = {ray}");
                }
            }
        }
        Commands::Simulate {
            scene,
            frames,
            drag_start,
            drag_frames,
            calls,
            json,
        } => {
            let scene = preset(&scene, &surface)?;
            let drag = drag_start..drag_start.saturating_add(drag_frames);
            let (trace, presented_frames) = simulate(&scene, surface, frames, drag, calls)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&trace)?);
            } else {
                println!(
                    "Simulate: scene={}, policy={:?}, frames={frames}",
                    scene.name, scene.accumulation
                );
                for t in &trace {
                    println!(
                        "frame {:>3}: count={:<4} presented={:<6} drag={} moved={}",
                        t.frame,
                        t.sample_count,
                        t.presented.map_or_else(|| "-".to_string(), |v| v.to_string()),
                        t.dragging,
                        t.pose_changed
                    );
                }
            }

            let mismatched = trace
                .iter()
                .filter(|t| t.presented != Some(t.sample_count as f32))
                .count();
            ensure!(
                mismatched == 0,
                "{mismatched} frame(s) presented pixels from a different frame's dispatch"
            );
            tracing::info!(presented = presented_frames, "simulation matched");
            if !json {
                println!("Match: OK ({presented_frames} frames presented)");
            }
        }
    }

    Ok(())
}
