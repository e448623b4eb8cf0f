//! wgpu backend for the progressive renderer.
//!
//! Implements [`lumen_render::GpuBackend`] on a window surface and ships the
//! embedded WGSL programs: a path-tracing accumulation kernel, a counter-fill
//! debug kernel and the full-screen present quad.
//!
//! # Invariants
//! - The output image is `rgba32float`, bound read-write to compute and
//!   sampled with a non-filtering sampler by the present pass.
//! - Every dispatch is its own submission, so stores precede later sampling.
//! - Screenshot readback copies the surface before it is presented.

mod backend;
mod capture;
mod context;
mod shaders;
mod uniforms;

pub use backend::WgpuBackend;
pub use context::{GpuContext, InitError, OUTPUT_FORMAT};
pub use shaders::{
    ACCUMULATE_SHADER, COMPUTE_ENTRY, COUNTER_FILL_SHADER, FRAGMENT_ENTRY, QUAD_FRAGMENT_SHADER,
    QUAD_VERTEX_SHADER, VERTEX_ENTRY, embedded_sources, specialize_compute,
};
pub use uniforms::{ComputeUniforms, UniformSlot, UniformSlots};
