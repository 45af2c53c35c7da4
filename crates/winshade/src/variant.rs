use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glprog::{ProgramId, ProgramSet, UniformSet, UniformValue};

use crate::error::{Result, ShadeError};

/// Compiled programs that may be aliased by several registry entries.
pub type SharedPrograms = Rc<RefCell<ProgramSet>>;

/// One named shader: its compiled programs, current uniform values, and the
/// transparency flag compositing has to respect.
#[derive(Debug)]
pub struct ShaderVariant {
    id: String,
    source: Rc<str>,
    programs: SharedPrograms,
    args: RefCell<UniformSet>,
    transparent: bool,
}

impl ShaderVariant {
    pub(crate) fn new(
        id: impl Into<String>,
        source: Rc<str>,
        programs: SharedPrograms,
        args: UniformSet,
        transparent: bool,
    ) -> Self {
        Self {
            id: id.into(),
            source,
            programs,
            args: RefCell::new(args),
            transparent,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// GLSL the programs were compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether this shader can make opaque pixels translucent.
    pub fn transparent(&self) -> bool {
        self.transparent
    }

    pub fn args(&self) -> Ref<'_, UniformSet> {
        self.args.borrow()
    }

    pub fn argument(&self, name: &str) -> Option<UniformValue> {
        self.args.borrow().get(name).copied()
    }

    /// Changes the value of a declared uniform. The new value is bound the next
    /// time the shader is installed for a draw.
    pub fn set_argument(&self, name: &str, value: UniformValue) -> Result<()> {
        let mut args = self.args.borrow_mut();
        let existing = args.get(name).ok_or_else(|| ShadeError::UnknownUniform {
            shader: self.id.clone(),
            uniform: name.to_string(),
        })?;
        if !existing.same_shape(&value) {
            return Err(ShadeError::UniformTypeMismatch {
                shader: self.id.clone(),
                uniform: name.to_string(),
                expected: existing.glsl_type(),
                found: value.glsl_type(),
            });
        }
        args.insert(name, value);
        Ok(())
    }

    /// True when both variants alias one compiled program set.
    pub fn shares_programs_with(&self, other: &ShaderVariant) -> bool {
        Rc::ptr_eq(&self.programs, &other.programs)
    }

    /// Ids of the programs currently held by this variant. While the variant is
    /// installed these are the renderer's own programs.
    pub fn program_ids(&self) -> [ProgramId; 4] {
        self.programs.borrow().ids()
    }

    pub(crate) fn shared_source(&self) -> &Rc<str> {
        &self.source
    }

    pub(crate) fn programs(&self) -> &SharedPrograms {
        &self.programs
    }

    /// Binds the current uniform values onto the compiled programs.
    pub(crate) fn prime(&self) -> bool {
        self.programs.borrow_mut().prime(&self.args.borrow())
    }
}
