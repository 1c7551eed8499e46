use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cadview-view")]
#[command(about = "CadView viewport controller, headless tools")]
pub struct CliArgs {
    #[command(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand)]
pub enum Mode {
    Headless {
        #[command(subcommand)]
        command: HeadlessCommand,
    },
}

#[derive(Subcommand)]
pub enum HeadlessCommand {
    /// Feed a JSON list of input events through a viewer.
    Replay(ReplayArgs),
    /// Cast a seek ray through one window point.
    Pick(PickArgs),
    /// Write the default viewer configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct SessionArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub scene: Option<PathBuf>,
    #[arg(long, default_value_t = 800)]
    pub width: i32,
    #[arg(long, default_value_t = 600)]
    pub height: i32,
}

#[derive(Args)]
pub struct ReplayArgs {
    #[arg(long)]
    pub script: PathBuf,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args)]
pub struct PickArgs {
    #[arg(long)]
    pub x: i32,
    #[arg(long)]
    pub y: i32,
    #[command(flatten)]
    pub session: SessionArgs,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub out: PathBuf,
}
