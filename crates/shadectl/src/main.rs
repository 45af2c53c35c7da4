mod cli;
mod paths;
mod run;
mod simulate;

use anyhow::Result;
use cli::Command;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Command::Builtins(args) => run::list_builtins(args.json),
        Command::Check => run::check(cli.config.as_deref()),
        Command::Emit(args) => run::emit(cli.config.as_deref(), &args.specifier, args.kind),
        Command::Simulate(args) => simulate::run(cli.config.as_deref(), args),
    }
}
