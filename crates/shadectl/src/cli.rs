use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use glprog::ProgramKind;

#[derive(Parser, Debug)]
#[command(
    name = "shadectl",
    author,
    version,
    about = "Per-window shader overlay tool"
)]
pub struct Cli {
    /// Shader configuration file (defaults to `shade.toml` in the config directory).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the predefined window shaders and their default uniforms.
    Builtins(BuiltinsArgs),
    /// Load the configuration and report every shader it defines.
    Check,
    /// Print the assembled fragment program for a shader specifier.
    Emit(EmitArgs),
    /// Run one window through rule matching, a toggle, and a draw.
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
pub struct BuiltinsArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct EmitArgs {
    /// Shader id, or `<id> <name=value,...>`.
    #[arg(value_name = "SPECIFIER")]
    pub specifier: String,

    /// Program kind: `ext`, `rgba`, `rgbx`, or `cm`.
    #[arg(
        long,
        value_name = "KIND",
        value_parser = parse_program_kind,
        default_value = "rgba"
    )]
    pub kind: ProgramKind,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Shader specifier the window's rule resolves to.
    #[arg(value_name = "SPECIFIER")]
    pub rule: String,

    /// Shader specifier toggled on the window by a command.
    #[arg(long, value_name = "SPECIFIER")]
    pub toggle: Option<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_program_kind(value: &str) -> Result<ProgramKind, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("program kind must not be empty".to_string());
    }

    ProgramKind::parse(trimmed).ok_or_else(|| {
        format!("unknown program kind '{trimmed}'; expected ext, rgba, rgbx, or cm")
    })
}
