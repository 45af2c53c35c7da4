//! Compiled window-shader programs for the compositor's texture pass.
//!
//! A window shader is a single GLSL function, `windowShader(inout vec4 color)`,
//! that gets spliced into each of the renderer's four texture programs:
//!
//! ```text
//!   window shader source
//!          │ assemble(kind, ..) x4
//!          ▼
//!   ProgramCompiler::compile ──▶ ProgramSet { ext, rgba, rgbx, cm }
//!          ▲                              │
//!          │                              └─▶ prime(UniformSet) ─▶ bound uniforms
//! ```
//!
//! The renderer owns a live `ProgramSet` of its own; swapping a shaded set in
//! and out of it is done through [`ProgramSlots`] and [`exchange`].

mod compile;
mod headless;
mod program;
mod uniform;

pub use compile::{
    assemble, compile_program_set, uniform_declarations, CompileError, CompiledProgram,
    ProgramCompiler, UniformDeclaration,
};
pub use headless::HeadlessCompiler;
pub use program::{exchange, BoundUniform, Program, ProgramId, ProgramKind, ProgramSet, ProgramSlots};
pub use uniform::{UniformParseError, UniformSet, UniformValue};
