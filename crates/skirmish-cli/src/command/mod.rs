use clap::{Parser, Subcommand};

use self::{replay::ReplayArg, train::TrainArg};

mod replay;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Co-train both sides' populations against each other
    Train(#[clap(flatten)] TrainArg),
    /// Rank archived episodes and play them back
    Replay(#[clap(flatten)] ReplayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Train(TrainArg::default())) {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
    }
    Ok(())
}
