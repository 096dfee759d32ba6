mod cli;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use colored::*;
use treesh::{Outcome, ShellContext, run_tree};

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<Outcome> {
    let session = config::load_session(&cli.session, cli.env_file.as_deref())?;

    let mut ctx = ShellContext::new();
    ctx.env.extend(session.env);

    let mut outcome = Outcome::Success;
    for (i, line) in session.lines.iter().enumerate() {
        if cli.dry_run {
            println!("{} [DRY-RUN] line {}: {:#?}", "::".yellow(), i + 1, line);
            continue;
        }
        log::info!("Evaluating line {}", i + 1);
        outcome = run_tree(line, &mut ctx);
    }
    Ok(outcome)
}
