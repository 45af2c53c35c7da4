use std::rc::Rc;

use glprog::{exchange, ProgramSlots};
use tracing::debug;

use crate::variant::ShaderVariant;

/// Tracks the shader whose programs currently sit in the renderer's slots.
///
/// Installing exchanges the variant's four programs with the renderer's;
/// restoring exchanges them again, which puts both sides back as they were.
#[derive(Debug, Default)]
pub struct SwapState {
    active: Option<Rc<ShaderVariant>>,
}

impl SwapState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&Rc<ShaderVariant>> {
        self.active.as_ref()
    }

    /// Primes `variant` with its current uniform values and swaps its programs
    /// into `live`. Any outstanding swap must have been restored beforehand.
    pub(crate) fn install(&mut self, variant: Rc<ShaderVariant>, live: &mut dyn ProgramSlots) {
        debug_assert!(self.active.is_none(), "installing over an outstanding swap");

        let reprimed = variant.prime();
        exchange(&mut *variant.programs().borrow_mut(), live);
        debug!(shader = variant.id(), reprimed, "installed window shader");
        self.active = Some(variant);
    }

    /// Swaps the active variant's programs back out of `live`. Does nothing
    /// when no swap is outstanding.
    pub fn restore(&mut self, live: &mut dyn ProgramSlots) -> Option<Rc<ShaderVariant>> {
        let variant = self.active.take()?;
        exchange(&mut *variant.programs().borrow_mut(), live);
        debug!(shader = variant.id(), "restored renderer programs");
        Some(variant)
    }
}
