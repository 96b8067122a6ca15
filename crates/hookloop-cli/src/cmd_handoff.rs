use clap::Subcommand;
use hookloop_bridge::advance_run;
use hookloop_store::{append_event, local_now, ProjectPaths};
use time::OffsetDateTime;

#[derive(Subcommand)]
pub enum HandoffCmd {
    /// Start the next handoff run (bumps `Run #`, stamps `Last Updated`)
    Bump,
}

pub fn run(cmd: HandoffCmd, paths: &ProjectPaths) -> anyhow::Result<()> {
    match cmd {
        HandoffCmd::Bump => {
            let run = bump(paths, local_now())?;
            println!("Handoff run #{run}");
            Ok(())
        }
    }
}

/// `hookloop handoff bump`
pub fn bump(paths: &ProjectPaths, now: OffsetDateTime) -> anyhow::Result<u32> {
    let run = advance_run(&paths.handoff_md, now)?;
    append_event(paths, &format!("Handoff run advanced to #{run}"))?;
    Ok(run)
}
