//! Per-window shader overlays for a compositing renderer.
//!
//! The engine keeps a registry of compiled window shaders, tracks which shader
//! each window gets from its window rules and from explicit toggle commands,
//! and swaps the winning shader's programs into the renderer around that
//! window's draw.

mod assign;
pub mod builtin;
mod engine;
mod error;
mod host;
mod registry;
mod resolve;
mod specifier;
mod swap;
mod variant;

#[cfg(test)]
mod testing;

pub use assign::{AssignmentSource, Assignments};
pub use engine::{WindowShade, DEFAULT_RULE_PROPERTY};
pub use error::{Result, ShadeError};
pub use host::{Compositor, WindowId};
pub use registry::{ShaderDefinition, ShaderRegistry, ShaderSource};
pub use resolve::effective;
pub use specifier::Specifier;
pub use swap::SwapState;
pub use variant::{ShaderVariant, SharedPrograms};

pub use glprog::{ProgramKind, ProgramSet, ProgramSlots, UniformSet, UniformValue};
