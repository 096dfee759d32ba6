use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "treesh", version, about = "Treesh: evaluate pre-parsed shell command trees")]
pub struct Cli {
    /// Session document (TOML) holding one or more [[line]] command trees
    pub session: PathBuf,

    /// Load extra variables from a dotenv file (overrides the document's [env])
    #[arg(short = 'e', long = "env-file")]
    pub env_file: Option<PathBuf>,

    /// Print each line's tree instead of evaluating it
    #[arg(short = 'd', long = "dry-run")]
    pub dry_run: bool,
}
