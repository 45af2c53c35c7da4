//! The window shader engine as a compositor sees it.
//!
//! `WindowShade` ties the registry, the two assignment tables and the swap
//! state together. The compositor calls it from its frame loop:
//!
//! ```text
//!   window rules / config reload ──▶ shade_if_matches / reapply_all_rules
//!   toggle command               ──▶ toggle_shade
//!   window destroyed             ──▶ forget
//!
//!   for each window:  before_draw(window) ─▶ draw ─▶ after_draw()
//! ```
//!
//! Everything runs on the render thread. `before_draw` and `after_draw` must
//! bracket exactly one window draw, against the same live program slots.
use std::path::Path;
use std::rc::Rc;

use glprog::{ProgramCompiler, ProgramSlots, UniformValue};
use shadeconf::ShadeConfig;
use tracing::{debug, warn};

use crate::assign::{AssignmentSource, Assignments};
use crate::error::{Result, ShadeError};
use crate::host::{Compositor, WindowId};
use crate::registry::{ShaderDefinition, ShaderRegistry};
use crate::swap::SwapState;
use crate::variant::ShaderVariant;

pub const DEFAULT_RULE_PROPERTY: &str = "shade";

pub struct WindowShade {
    registry: ShaderRegistry,
    assignments: Assignments,
    swap: SwapState,
    rule_property: String,
}

impl WindowShade {
    pub fn new(compiler: impl ProgramCompiler + 'static) -> Self {
        Self {
            registry: ShaderRegistry::new(compiler),
            assignments: Assignments::new(),
            swap: SwapState::new(),
            rule_property: DEFAULT_RULE_PROPERTY.to_string(),
        }
    }

    /// Builds an engine and loads everything `config` declares.
    pub fn from_config(
        compiler: impl ProgramCompiler + 'static,
        config: &ShadeConfig,
        base_dir: &Path,
    ) -> Result<Self> {
        let mut engine = Self::new(compiler);
        engine.load_config(config, base_dir)?;
        Ok(engine)
    }

    pub fn load_config(&mut self, config: &ShadeConfig, base_dir: &Path) -> Result<()> {
        self.registry.load_config(config, base_dir)?;
        self.rule_property = config.rule_property.clone();
        Ok(())
    }

    pub fn rule_property(&self) -> &str {
        &self.rule_property
    }

    pub fn registry(&self) -> &ShaderRegistry {
        &self.registry
    }

    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    pub fn define_builtin(&mut self, name: &str) -> Result<()> {
        self.registry.define_builtin(name)
    }

    pub fn define_shader(&mut self, def: ShaderDefinition) -> Result<Rc<ShaderVariant>> {
        self.registry.define(def)
    }

    pub fn resolve(&mut self, specifier: &str) -> Result<Rc<ShaderVariant>> {
        self.registry.resolve(specifier)
    }

    /// Edits a uniform of a registered shader; picked up on its next draw.
    pub fn set_argument(&mut self, id: &str, name: &str, value: UniformValue) -> Result<()> {
        let variant = self
            .registry
            .get(id)
            .ok_or_else(|| ShadeError::ShaderNotFound(id.to_string()))?;
        variant.set_argument(name, value)
    }

    /// Sets the rule-sourced shader of `window`. Returns whether the assignment
    /// changed; only a change damages the window. On error the previous
    /// assignment is kept.
    pub fn apply_rule(
        &mut self,
        host: &mut dyn Compositor,
        window: WindowId,
        specifier: Option<&str>,
    ) -> Result<bool> {
        if self.assignments.current_id(AssignmentSource::Rule, window) == specifier {
            return Ok(false);
        }

        match specifier {
            Some(specifier) => {
                let variant = self.registry.resolve(specifier)?;
                debug!(window = window.0, shader = variant.id(), "rule shader assigned");
                self.assignments.set(AssignmentSource::Rule, window, variant);
            }
            None => {
                debug!(window = window.0, "rule shader cleared");
                self.assignments.remove(AssignmentSource::Rule, window);
            }
        }

        host.damage_window(window);
        Ok(true)
    }

    /// Reads the window's rule property from the compositor and applies it.
    pub fn shade_if_matches(&mut self, host: &mut dyn Compositor, window: WindowId) -> Result<bool> {
        let specifier = host.window_rule(window, &self.rule_property);
        self.apply_rule(host, window, specifier.as_deref())
    }

    /// Toggles the dispatch-sourced shader of `window`: the same specifier
    /// again turns it off, anything else replaces it. Returns whether a
    /// dispatch shader is assigned afterwards.
    pub fn toggle_shade(
        &mut self,
        host: &mut dyn Compositor,
        window: WindowId,
        specifier: &str,
    ) -> Result<bool> {
        let assigned = if self.assignments.current_id(AssignmentSource::Dispatch, window)
            == Some(specifier)
        {
            debug!(window = window.0, shader = specifier, "dispatch shader toggled off");
            self.assignments.remove(AssignmentSource::Dispatch, window);
            false
        } else {
            let variant = self.registry.resolve(specifier)?;
            debug!(window = window.0, shader = variant.id(), "dispatch shader toggled on");
            self.assignments
                .set(AssignmentSource::Dispatch, window, variant);
            true
        };

        host.damage_window(window);
        Ok(assigned)
    }

    /// Drops every assignment of a destroyed window.
    pub fn forget(&mut self, window: WindowId) {
        if self.assignments.forget(window) {
            debug!(window = window.0, "forgot window shader assignments");
        }
    }

    /// Rebuilds all rule assignments from the compositor's current rules.
    ///
    /// Windows that fail to resolve keep no rule shader and are reported back;
    /// the remaining windows are still processed. Windows that lose their rule
    /// shader in the process are damaged.
    pub fn reapply_all_rules(&mut self, host: &mut dyn Compositor) -> Vec<(WindowId, ShadeError)> {
        let previous = self.assignments.take(AssignmentSource::Rule);
        let mut failures = Vec::new();

        for window in host.windows() {
            if let Err(err) = self.shade_if_matches(host, window) {
                warn!(window = window.0, error = %err, "failed to apply window shader rule");
                failures.push((window, err));
            }

            let had_rule = previous.contains_key(&window);
            let has_rule = self.assignments.get(AssignmentSource::Rule, window).is_some();
            if had_rule && !has_rule {
                host.damage_window(window);
            }
        }

        failures
    }

    /// The shader that would be installed for `window`, without installing it.
    pub fn effective(&self, window: WindowId) -> Option<Rc<ShaderVariant>> {
        self.assignments
            .effective(window)
            .map(|(variant, _)| variant.clone())
    }

    /// Installs the effective shader of `window` into `live`, if it has one.
    pub fn before_draw(
        &mut self,
        window: WindowId,
        live: &mut dyn ProgramSlots,
    ) -> Option<Rc<ShaderVariant>> {
        if let Some(stale) = self.swap.restore(live) {
            warn!(shader = stale.id(), "previous window draw was never finished; restored renderer programs");
        }

        let (variant, source) = self.assignments.effective(window)?;
        let variant = variant.clone();
        debug!(window = window.0, shader = variant.id(), %source, "shading window");
        self.swap.install(variant.clone(), live);
        Some(variant)
    }

    /// Restores `live` after a draw started by [`WindowShade::before_draw`].
    /// Safe to call after every draw.
    pub fn after_draw(&mut self, live: &mut dyn ProgramSlots) {
        self.swap.restore(live);
    }

    /// The shader currently installed in the renderer, if any.
    pub fn active(&self) -> Option<&Rc<ShaderVariant>> {
        self.swap.active()
    }

    /// Restores any outstanding swap, then drops all assignments and shaders.
    pub fn unload(&mut self, live: &mut dyn ProgramSlots) {
        self.swap.restore(live);
        self.assignments.clear();
        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{renderer_slots, FakeCompositor};
    use glprog::{HeadlessCompiler, ProgramSet, UniformSet};

    fn engine() -> WindowShade {
        let mut engine = WindowShade::new(HeadlessCompiler::starting_at(100));
        engine.define_builtin("all").unwrap();
        engine
    }

    #[test]
    fn end_to_end_chromakey_draw() {
        let mut engine = WindowShade::new(HeadlessCompiler::starting_at(100));
        engine.define_builtin("chromakey").unwrap();
        let mut host = FakeCompositor::with_windows(&[1]);
        let window = WindowId(1);
        let mut live = renderer_slots();
        let original = live.clone();

        assert!(engine.apply_rule(&mut host, window, Some("chromakey")).unwrap());
        let chromakey = engine.registry().get("chromakey").unwrap();
        let shader_programs = chromakey.program_ids();

        let installed = engine.before_draw(window, &mut live).unwrap();
        assert!(Rc::ptr_eq(&installed, &chromakey));
        assert!(installed.transparent());
        assert_eq!(live.ids(), shader_programs);
        assert_eq!(chromakey.program_ids(), original.ids());
        assert_eq!(
            live.rgba.bound("similarity").unwrap().value,
            UniformValue::Scalar(0.1)
        );

        engine.after_draw(&mut live);
        assert_eq!(live, original);
        assert_eq!(chromakey.program_ids(), shader_programs);
        assert!(engine.active().is_none());
    }

    #[test]
    fn every_builtin_round_trips_renderer_slots() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let mut live = renderer_slots();
        let original = live.clone();

        let ids: Vec<String> = engine.registry().ids().into_iter().map(String::from).collect();
        for id in ids {
            engine.toggle_shade(&mut host, WindowId(1), &id).unwrap();
            assert!(engine.before_draw(WindowId(1), &mut live).is_some());
            assert_ne!(live.ids(), original.ids());
            engine.after_draw(&mut live);
            assert_eq!(live, original, "{id}");
        }
    }

    #[test]
    fn window_without_shader_draws_untouched() {
        let mut engine = engine();
        let mut live = renderer_slots();
        let original = live.clone();

        assert!(engine.before_draw(WindowId(9), &mut live).is_none());
        assert_eq!(live, original);
        engine.after_draw(&mut live);
        assert_eq!(live, original);
    }

    #[test]
    fn repeated_rule_damages_once() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let window = WindowId(1);

        assert!(engine.apply_rule(&mut host, window, Some("tint")).unwrap());
        assert!(!engine.apply_rule(&mut host, window, Some("tint")).unwrap());
        assert_eq!(host.damage_count(window), 1);

        assert!(engine.apply_rule(&mut host, window, None).unwrap());
        assert!(!engine.apply_rule(&mut host, window, None).unwrap());
        assert_eq!(host.damage_count(window), 2);
    }

    #[test]
    fn failed_rule_keeps_previous_assignment() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let window = WindowId(1);

        engine.apply_rule(&mut host, window, Some("tint")).unwrap();
        let err = engine
            .apply_rule(&mut host, window, Some("doesNotExist"))
            .unwrap_err();
        assert!(matches!(err, ShadeError::ShaderNotFound(_)));
        assert_eq!(engine.effective(window).unwrap().id(), "tint");
        assert_eq!(host.damage_count(window), 1);
    }

    #[test]
    fn failed_toggle_keeps_previous_dispatch() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let window = WindowId(1);

        assert!(engine.toggle_shade(&mut host, window, "invert").unwrap());
        let damage = host.damage_count(window);

        assert!(matches!(
            engine.toggle_shade(&mut host, window, "invert glow=1"),
            Err(ShadeError::UnknownUniform { .. })
        ));
        assert!(matches!(
            engine.toggle_shade(&mut host, window, "nope"),
            Err(ShadeError::ShaderNotFound(_))
        ));

        assert_eq!(engine.effective(window).unwrap().id(), "invert");
        assert_eq!(host.damage_count(window), damage);
        assert_eq!(
            engine.registry().ids(),
            vec!["chromablur", "chromakey", "invert", "tint"]
        );
    }

    #[test]
    fn dispatch_overrides_rule_and_toggles_off() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let window = WindowId(1);

        engine.apply_rule(&mut host, window, Some("tint")).unwrap();
        assert!(engine.toggle_shade(&mut host, window, "invert").unwrap());
        assert_eq!(engine.effective(window).unwrap().id(), "invert");

        assert!(!engine.toggle_shade(&mut host, window, "invert").unwrap());
        assert_eq!(engine.effective(window).unwrap().id(), "tint");
        assert_eq!(host.damage_count(window), 3);

        engine.apply_rule(&mut host, window, None).unwrap();
        assert!(engine.effective(window).is_none());
    }

    #[test]
    fn toggle_replaces_different_dispatch_shader() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let window = WindowId(1);

        engine.toggle_shade(&mut host, window, "invert").unwrap();
        assert!(engine
            .toggle_shade(&mut host, window, "tint tintStrength=0.5")
            .unwrap());
        let effective = engine.effective(window).unwrap();
        assert_eq!(effective.id(), "tint tintStrength=0.5");
        assert_eq!(effective.argument("tintStrength"), Some(UniformValue::Scalar(0.5)));
    }

    #[test]
    fn forget_removes_both_without_damage() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let window = WindowId(1);

        engine.apply_rule(&mut host, window, Some("tint")).unwrap();
        engine.toggle_shade(&mut host, window, "invert").unwrap();
        let damage = host.damaged.len();

        engine.forget(window);
        assert!(engine.effective(window).is_none());
        assert!(engine.assignments().is_empty());
        assert_eq!(host.damaged.len(), damage);
    }

    #[test]
    fn reapply_rebuilds_rule_assignments() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1, 2, 3]);
        host.set_rule(WindowId(1), "tint");
        host.set_rule(WindowId(2), "chromakey similarity=0.3");

        assert!(engine.reapply_all_rules(&mut host).is_empty());
        assert_eq!(engine.effective(WindowId(1)).unwrap().id(), "tint");
        assert_eq!(
            engine.effective(WindowId(2)).unwrap().id(),
            "chromakey similarity=0.3"
        );
        assert!(engine.effective(WindowId(3)).is_none());

        host.rules.clear();
        host.set_rule(WindowId(2), "missing");
        host.damaged.clear();
        let failures = engine.reapply_all_rules(&mut host);

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, WindowId(2));
        assert!(engine.effective(WindowId(1)).is_none());
        assert!(engine.effective(WindowId(2)).is_none());
        assert_eq!(host.damage_count(WindowId(1)), 1);
        assert_eq!(host.damage_count(WindowId(2)), 1);
        assert_eq!(host.damage_count(WindowId(3)), 0);
    }

    #[test]
    fn edited_arguments_are_primed_on_next_draw() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let mut live = renderer_slots();
        engine.apply_rule(&mut host, WindowId(1), Some("tint")).unwrap();

        engine
            .set_argument("tint", "tintStrength", UniformValue::Scalar(0.75))
            .unwrap();
        engine.before_draw(WindowId(1), &mut live).unwrap();
        assert_eq!(
            live.cm.bound("tintStrength").unwrap().value,
            UniformValue::Scalar(0.75)
        );
        engine.after_draw(&mut live);

        assert!(matches!(
            engine.set_argument("tint", "glow", UniformValue::Scalar(1.0)),
            Err(ShadeError::UnknownUniform { .. })
        ));
        assert!(matches!(
            engine.set_argument("nope", "glow", UniformValue::Scalar(1.0)),
            Err(ShadeError::ShaderNotFound(_))
        ));
    }

    #[test]
    fn derived_shaders_prime_their_own_values() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1, 2]);
        let mut live = renderer_slots();
        engine
            .define_shader(ShaderDefinition::derived(
                "strong",
                "tint",
                UniformSet::new().with("tintStrength", UniformValue::Scalar(0.9)),
            ))
            .unwrap();
        engine.apply_rule(&mut host, WindowId(1), Some("tint")).unwrap();
        engine.apply_rule(&mut host, WindowId(2), Some("strong")).unwrap();

        for (window, expected) in [(WindowId(1), 0.1), (WindowId(2), 0.9)] {
            engine.before_draw(window, &mut live).unwrap();
            assert_eq!(
                live.rgba.bound("tintStrength").unwrap().value,
                UniformValue::Scalar(expected)
            );
            engine.after_draw(&mut live);
        }
    }

    #[test]
    fn skipped_after_draw_is_recovered() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1, 2]);
        let mut live = renderer_slots();
        let original = live.clone();
        engine.apply_rule(&mut host, WindowId(1), Some("tint")).unwrap();
        engine.apply_rule(&mut host, WindowId(2), Some("invert")).unwrap();

        let tint = engine.registry().get("tint").unwrap();
        let tint_programs = tint.program_ids();

        engine.before_draw(WindowId(1), &mut live).unwrap();
        let invert = engine.before_draw(WindowId(2), &mut live).unwrap();
        assert_eq!(engine.active().unwrap().id(), "invert");
        assert_eq!(tint.program_ids(), tint_programs);
        assert_eq!(invert.program_ids(), original.ids());
        engine.after_draw(&mut live);

        assert_eq!(live, original);
        assert_ne!(invert.program_ids(), original.ids());
    }

    #[test]
    fn unload_restores_and_clears() {
        let mut engine = engine();
        let mut host = FakeCompositor::with_windows(&[1]);
        let mut live: ProgramSet = renderer_slots();
        let original = live.clone();
        engine.apply_rule(&mut host, WindowId(1), Some("invert")).unwrap();
        engine.before_draw(WindowId(1), &mut live).unwrap();

        engine.unload(&mut live);
        assert_eq!(live, original);
        assert!(engine.registry().is_empty());
        assert!(engine.assignments().is_empty());
        assert!(engine.active().is_none());
    }

    #[test]
    fn loads_rule_property_from_config() {
        let config = ShadeConfig::from_toml_str(
            r#"
rule_property = "overlay"
builtins = ["invert"]
"#,
        )
        .unwrap();
        let engine =
            WindowShade::from_config(HeadlessCompiler::new(), &config, Path::new(".")).unwrap();
        assert_eq!(engine.rule_property(), "overlay");
        assert_eq!(engine.registry().ids(), vec!["invert"]);
    }
}
