mod cmd_config;
mod cmd_handoff;
mod cmd_hook;
mod cmd_loop;
mod logging;

use clap::{Parser, Subcommand};
use hookloop_bridge::HookKind;
use hookloop_store::ProjectPaths;

#[derive(Parser)]
#[command(
    name = "hookloop",
    version,
    about = "Autonomous loop control and command guard for coding-agent hooks"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Hook entrypoints (read the host's stdin JSON)
    Hook {
        #[command(subcommand)]
        cmd: HookCmd,
    },
    /// Start, inspect or cancel the loop
    Loop {
        #[command(subcommand)]
        cmd: cmd_loop::LoopCmd,
    },
    /// Maintain the handoff document
    Handoff {
        #[command(subcommand)]
        cmd: cmd_handoff::HandoffCmd,
    },
    /// Manage .claude/hookloop.json
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum HookCmd {
    /// Stop: advance the loop and inject the continuation prompt
    Stop,
    /// PreToolUse:Bash: block, warn about or rewrite risky commands
    PreBash,
    /// PostToolUse:Edit|Write: report progress while a loop runs
    PostEdit,
    /// SessionStart: summarise a running loop
    SessionStart,
}

impl From<HookCmd> for HookKind {
    fn from(cmd: HookCmd) -> Self {
        match cmd {
            HookCmd::Stop => HookKind::Stop,
            HookCmd::PreBash => HookKind::PreBash,
            HookCmd::PostEdit => HookKind::PostEdit,
            HookCmd::SessionStart => HookKind::SessionStart,
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Hook { cmd } => cmd_hook::execute(cmd.into()),
        Command::Loop { cmd } => cmd_loop::run(cmd, &ProjectPaths::from_env()?),
        Command::Handoff { cmd } => cmd_handoff::run(cmd, &ProjectPaths::from_env()?),
        Command::Config { cmd } => cmd_config::run(cmd, &ProjectPaths::from_env()?),
    }
}
