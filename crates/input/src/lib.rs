//! Pointer input mapped to camera pose changes.
//!
//! # Invariants
//! - The controller never mutates the camera itself; it only proposes a
//!   position. The frame scheduler applies it and resets accumulation.
//! - While the primary button is released no pose change is produced.

pub mod controller;
pub mod pointer;

pub use controller::InteractionController;
pub use pointer::PointerState;

pub fn crate_info() -> &'static str {
    "lumen-input v0.1.0"
}
