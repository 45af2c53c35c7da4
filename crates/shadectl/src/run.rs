use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glprog::{assemble, HeadlessCompiler, ProgramKind};
use serde::Serialize;
use shadeconf::ShadeConfig;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use winshade::builtin::BUILTINS;
use winshade::WindowShade;

use crate::paths::AppPaths;

/// Program ids below this are reserved for the renderer's stock programs.
pub const FIRST_SHADER_PROGRAM: u32 = 4;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Serialize)]
struct BuiltinSummary {
    name: &'static str,
    transparent: bool,
    defaults: BTreeMap<String, Vec<f32>>,
}

pub fn list_builtins(json: bool) -> Result<()> {
    let summaries: Vec<BuiltinSummary> = BUILTINS
        .iter()
        .map(|builtin| BuiltinSummary {
            name: builtin.name,
            transparent: builtin.transparent,
            defaults: builtin
                .defaults()
                .iter()
                .map(|(name, value)| (name.to_string(), value.components().to_vec()))
                .collect(),
        })
        .collect();

    if json {
        let rendered = serde_json::to_string_pretty(&summaries)
            .context("failed to serialise builtin catalog")?;
        println!("{rendered}");
        return Ok(());
    }

    for builtin in BUILTINS {
        let defaults = builtin
            .defaults()
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ");
        let marker = if builtin.transparent { " (transparent)" } else { "" };
        if defaults.is_empty() {
            println!("{}{marker}", builtin.name);
        } else {
            println!("{}{marker}: {defaults}", builtin.name);
        }
    }
    Ok(())
}

pub fn check(config: Option<&Path>) -> Result<()> {
    let engine = load_engine(config)?;
    let registry = engine.registry();
    println!("rule property: {}", engine.rule_property());
    for id in registry.ids() {
        let Some(variant) = registry.get(id) else {
            continue;
        };
        let marker = if variant.transparent() { " (transparent)" } else { "" };
        println!("{id}{marker}");
    }
    info!(shaders = registry.len(), "configuration ok");
    Ok(())
}

pub fn emit(config: Option<&Path>, specifier: &str, kind: ProgramKind) -> Result<()> {
    let mut engine = load_engine(config)?;
    let variant = engine
        .resolve(specifier)
        .with_context(|| format!("failed to resolve shader '{specifier}'"))?;
    debug!(shader = variant.id(), %kind, "emitting assembled program");
    print!("{}", assemble(kind, variant.source()));
    Ok(())
}

/// Builds an engine from the selected configuration file. An explicit file
/// must exist; a missing default file means builtins only.
pub fn load_engine(config: Option<&Path>) -> Result<WindowShade> {
    let (config_path, required) = match config {
        Some(path) => (path.to_path_buf(), true),
        None => {
            let paths = AppPaths::discover()?;
            debug!(config = %paths.config_dir().display(), "resolved shadectl paths");
            (paths.config_file(), false)
        }
    };

    let config = read_config(&config_path, required)?;
    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    WindowShade::from_config(
        HeadlessCompiler::starting_at(FIRST_SHADER_PROGRAM),
        &config,
        &base_dir,
    )
    .with_context(|| format!("failed to load shaders from {}", config_path.display()))
}

fn read_config(path: &Path, required: bool) -> Result<ShadeConfig> {
    if !required && !path.exists() {
        debug!(path = %path.display(), "no configuration file; using builtins only");
        return Ok(ShadeConfig::default());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration {}", path.display()))?;
    let config = ShadeConfig::from_toml_str(&text)
        .with_context(|| format!("failed to parse configuration {}", path.display()))?;
    debug!(path = %path.display(), shaders = config.shaders.len(), "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_config_must_exist() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("absent.toml");
        assert!(load_engine(Some(&missing)).is_err());
    }

    #[test]
    fn resolves_relative_shader_paths_against_config_dir() {
        let root = TempDir::new().unwrap();
        fs::write(
            root.path().join("sepia.glsl"),
            "uniform float amount;\nvoid windowShader(inout vec4 color) { color.rgb *= amount; }\n",
        )
        .unwrap();
        let config_path = root.path().join("shade.toml");
        fs::write(
            &config_path,
            r#"
builtins = []

[shaders.sepia]
path = "sepia.glsl"
args = { amount = 0.5 }
"#,
        )
        .unwrap();

        let engine = load_engine(Some(&config_path)).unwrap();
        assert_eq!(engine.registry().ids(), vec!["sepia"]);
    }
}
