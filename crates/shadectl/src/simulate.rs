//! Dry run of one window through the overlay engine.
//!
//! A single window is given the requested rule, optionally toggled, and then
//! drawn once against a stand-in renderer whose stock programs hold ids
//! `0..4`. The draw bracket must leave those programs exactly as they were.

use std::path::Path;

use anyhow::{bail, Result};
use glprog::{Program, ProgramId, ProgramKind, ProgramSet};
use tracing::info;
use winshade::{Compositor, WindowId};

use crate::cli::SimulateArgs;
use crate::run::load_engine;

const WINDOW: WindowId = WindowId(1);

/// A compositor with one mapped window and one rule value.
#[derive(Debug)]
struct SingleWindow {
    property: String,
    rule: String,
    damaged: usize,
}

impl Compositor for SingleWindow {
    fn windows(&self) -> Vec<WindowId> {
        vec![WINDOW]
    }

    fn window_rule(&self, window: WindowId, property: &str) -> Option<String> {
        (window == WINDOW && property == self.property).then(|| self.rule.clone())
    }

    fn damage_window(&mut self, window: WindowId) {
        if window == WINDOW {
            self.damaged += 1;
        }
    }
}

fn stock_programs() -> ProgramSet {
    ProgramSet {
        ext: Program::placeholder(ProgramId(0), ProgramKind::Ext),
        rgba: Program::placeholder(ProgramId(1), ProgramKind::Rgba),
        rgbx: Program::placeholder(ProgramId(2), ProgramKind::Rgbx),
        cm: Program::placeholder(ProgramId(3), ProgramKind::Cm),
    }
}

pub fn run(config: Option<&Path>, args: SimulateArgs) -> Result<()> {
    let mut engine = load_engine(config)?;
    let mut host = SingleWindow {
        property: engine.rule_property().to_string(),
        rule: args.rule,
        damaged: 0,
    };

    let failures = engine.reapply_all_rules(&mut host);
    if let Some((window, err)) = failures.into_iter().next() {
        return Err(anyhow::Error::new(err)
            .context(format!("failed to apply rule to window {}", window.0)));
    }

    if let Some(toggle) = args.toggle.as_deref() {
        let assigned = engine.toggle_shade(&mut host, WINDOW, toggle)?;
        info!(shader = toggle, assigned, "toggled dispatch shader");
    }

    let mut live = stock_programs();
    let stock = live.clone();
    let Some(variant) = engine.before_draw(WINDOW, &mut live) else {
        println!("window {}: unshaded", WINDOW.0);
        return Ok(());
    };

    let source = engine
        .assignments()
        .effective(WINDOW)
        .map(|(_, source)| source.to_string())
        .unwrap_or_default();
    let installed = live.ids();
    engine.after_draw(&mut live);

    if live != stock {
        bail!("renderer programs were not restored after drawing window {}", WINDOW.0);
    }

    println!("window {}: {} (from {source})", WINDOW.0, variant.id());
    println!(
        "installed programs: {}",
        installed
            .iter()
            .map(|id| id.0.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    );
    for (name, value) in variant.args().iter() {
        println!("  {name} = {value}");
    }
    if variant.transparent() {
        println!("  transparent");
    }
    println!("renderer programs restored; damaged {} time(s)", host.damaged);
    Ok(())
}
