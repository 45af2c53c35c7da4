/// Stable identifier of a compositor window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

/// What the engine needs from the compositor it runs inside.
pub trait Compositor {
    /// Windows that are currently alive.
    fn windows(&self) -> Vec<WindowId>;

    /// Value of a window rule property for `window`, if any rule sets it.
    fn window_rule(&self, window: WindowId, property: &str) -> Option<String>;

    /// Marks the window's visible region as needing a repaint.
    fn damage_window(&mut self, window: WindowId);
}
