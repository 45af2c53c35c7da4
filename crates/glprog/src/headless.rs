use crate::compile::{uniform_declarations, CompileError, CompiledProgram, ProgramCompiler};
use crate::program::{ProgramId, ProgramKind};

/// Compile service that never touches a GPU.
///
/// It checks that the assembled source defines the window shader entry point,
/// hands out increasing program ids, and reports every declared uniform as
/// active with locations in declaration order. Used for configuration checks
/// and wherever a real GL context is unavailable.
#[derive(Debug, Default)]
pub struct HeadlessCompiler {
    next_id: u32,
    compiled: u32,
    released: u32,
}

impl HeadlessCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts numbering programs at `first`, leaving lower ids free for the
    /// renderer's own programs.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next_id: first,
            ..Self::default()
        }
    }

    /// Number of programs compiled so far.
    pub fn compiled(&self) -> u32 {
        self.compiled
    }

    /// Programs compiled and not yet released.
    pub fn live(&self) -> u32 {
        self.compiled - self.released
    }
}

impl ProgramCompiler for HeadlessCompiler {
    fn compile(&mut self, kind: ProgramKind, source: &str) -> Result<CompiledProgram, CompileError> {
        if source.trim().is_empty() {
            return Err(CompileError::EmptySource);
        }
        if !source.contains("void windowShader(") {
            return Err(CompileError::MissingEntryPoint);
        }
        if source.matches('{').count() != source.matches('}').count() {
            return Err(CompileError::Rejected {
                kind,
                message: "unbalanced braces".to_string(),
            });
        }

        let uniforms = uniform_declarations(source)
            .into_iter()
            .enumerate()
            .map(|(location, decl)| (decl.name, location as i32))
            .collect();

        let id = ProgramId(self.next_id);
        self.next_id += 1;
        self.compiled += 1;
        Ok(CompiledProgram { id, uniforms })
    }

    fn release(&mut self, program: ProgramId) {
        tracing::trace!(program = program.0, "released headless program");
        self.released += 1;
    }
}
