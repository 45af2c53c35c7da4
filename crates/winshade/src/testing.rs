use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glprog::{Program, ProgramId, ProgramKind, ProgramSet, UniformSet};

use crate::host::{Compositor, WindowId};
use crate::variant::ShaderVariant;

pub(crate) fn placeholder_set(first: u32) -> ProgramSet {
    ProgramSet {
        ext: Program::placeholder(ProgramId(first), ProgramKind::Ext),
        rgba: Program::placeholder(ProgramId(first + 1), ProgramKind::Rgba),
        rgbx: Program::placeholder(ProgramId(first + 2), ProgramKind::Rgbx),
        cm: Program::placeholder(ProgramId(first + 3), ProgramKind::Cm),
    }
}

pub(crate) fn variant(id: &str, first_program: u32) -> Rc<ShaderVariant> {
    Rc::new(ShaderVariant::new(
        id,
        Rc::from("void windowShader(inout vec4 color) {}"),
        Rc::new(RefCell::new(placeholder_set(first_program))),
        UniformSet::new(),
        false,
    ))
}

/// Renderer stand-in whose stock programs use ids 0-3.
pub(crate) fn renderer_slots() -> ProgramSet {
    placeholder_set(0)
}

#[derive(Debug, Default)]
pub(crate) struct FakeCompositor {
    pub windows: Vec<WindowId>,
    pub rules: HashMap<WindowId, String>,
    pub damaged: Vec<WindowId>,
}

impl FakeCompositor {
    pub fn with_windows(ids: &[u64]) -> Self {
        Self {
            windows: ids.iter().copied().map(WindowId).collect(),
            ..Self::default()
        }
    }

    pub fn set_rule(&mut self, window: WindowId, shader: &str) {
        self.rules.insert(window, shader.to_string());
    }

    pub fn damage_count(&self, window: WindowId) -> usize {
        self.damaged.iter().filter(|damaged| **damaged == window).count()
    }
}

impl Compositor for FakeCompositor {
    fn windows(&self) -> Vec<WindowId> {
        self.windows.clone()
    }

    fn window_rule(&self, window: WindowId, property: &str) -> Option<String> {
        if property != "shade" {
            return None;
        }
        self.rules.get(&window).cloned()
    }

    fn damage_window(&mut self, window: WindowId) {
        self.damaged.push(window);
    }
}
