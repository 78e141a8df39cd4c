//! Trellis editor: replays a scripted editing session and prints the result.

mod config;
mod script;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use trellis_core::Board;

use crate::config::EditorConfig;
use crate::script::{Script, ScriptError};

#[derive(Parser, Debug)]
#[command(
    name = "trellis-editor",
    version,
    about = "Replay a diagram editing session with undo/redo"
)]
struct Args {
    /// Session script (TOML with a [[step]] array)
    #[arg(long)]
    script: PathBuf,

    /// Editor configuration (TOML with an [undo] table)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the diagram as single-line JSON
    #[arg(long)]
    compact: bool,
}

fn run(args: &Args) -> Result<(), ScriptError> {
    let config = EditorConfig::load_or_default(args.config.as_deref());
    let script = Script::load(&args.script)?;
    log::info!(
        "replaying {} step(s) from {}",
        script.steps.len(),
        args.script.display()
    );

    let mut board = Board::with_config(config.undo);
    script.run(&mut board)?;

    println!("{}", script::render(&board, !args.compact)?);
    let reactor = board.reactor();
    eprintln!(
        "history: {}, future: {}, open transactions: {}",
        reactor.history_len(),
        reactor.future_len(),
        reactor.depth()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    trellis_core::init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
