use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::host::WindowId;
use crate::variant::ShaderVariant;

/// Which mechanism assigned a shader to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentSource {
    /// Derived from window rules; rebuilt whenever rules may have changed.
    Rule,
    /// Toggled explicitly by a command; kept until toggled off.
    Dispatch,
}

impl fmt::Display for AssignmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentSource::Rule => f.write_str("rule"),
            AssignmentSource::Dispatch => f.write_str("dispatch"),
        }
    }
}

/// Per-window shader assignments, one table per [`AssignmentSource`].
///
/// Entries are keyed by window id and live until removed; window destruction
/// has to be reported through [`Assignments::forget`].
#[derive(Debug, Default)]
pub struct Assignments {
    rule: HashMap<WindowId, Rc<ShaderVariant>>,
    dispatch: HashMap<WindowId, Rc<ShaderVariant>>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, source: AssignmentSource) -> &HashMap<WindowId, Rc<ShaderVariant>> {
        match source {
            AssignmentSource::Rule => &self.rule,
            AssignmentSource::Dispatch => &self.dispatch,
        }
    }

    fn table_mut(&mut self, source: AssignmentSource) -> &mut HashMap<WindowId, Rc<ShaderVariant>> {
        match source {
            AssignmentSource::Rule => &mut self.rule,
            AssignmentSource::Dispatch => &mut self.dispatch,
        }
    }

    pub fn get(&self, source: AssignmentSource, window: WindowId) -> Option<&Rc<ShaderVariant>> {
        self.table(source).get(&window)
    }

    /// Id of the shader `source` currently assigns to `window`.
    pub fn current_id(&self, source: AssignmentSource, window: WindowId) -> Option<&str> {
        self.get(source, window).map(|variant| variant.id())
    }

    pub fn set(
        &mut self,
        source: AssignmentSource,
        window: WindowId,
        variant: Rc<ShaderVariant>,
    ) -> Option<Rc<ShaderVariant>> {
        self.table_mut(source).insert(window, variant)
    }

    pub fn remove(&mut self, source: AssignmentSource, window: WindowId) -> Option<Rc<ShaderVariant>> {
        self.table_mut(source).remove(&window)
    }

    /// Drops both assignments for `window`; true if either existed.
    pub fn forget(&mut self, window: WindowId) -> bool {
        let rule = self.rule.remove(&window).is_some();
        let dispatch = self.dispatch.remove(&window).is_some();
        rule || dispatch
    }

    /// Empties one table, returning what it held.
    pub fn take(&mut self, source: AssignmentSource) -> HashMap<WindowId, Rc<ShaderVariant>> {
        std::mem::take(self.table_mut(source))
    }

    pub fn clear(&mut self) {
        self.rule.clear();
        self.dispatch.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.rule.is_empty() && self.dispatch.is_empty()
    }
}
