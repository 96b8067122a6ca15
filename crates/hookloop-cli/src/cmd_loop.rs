use clap::Subcommand;
use hookloop_bridge::render::{format_elapsed, truncate_chars};
use hookloop_bridge::{resolve_mode, Driver, Settings, Sources};
use hookloop_core::{LoopMode, LoopState, LoopStatus};
use hookloop_store::{append_event, load_state, recent_events, save_state, ProjectPaths};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum LoopCmd {
    /// Activate the loop (resets the iteration counter)
    Start {
        /// Loop mode: ralph|todo, continuous|handoff, research, review, auto
        #[arg(long, default_value = "auto")]
        mode: LoopMode,
        /// Iteration cap for this run (default: settings)
        #[arg(long)]
        max_iterations: Option<u32>,
    },
    /// Show the loop state
    Status {
        /// Print the raw state document
        #[arg(long)]
        json: bool,
    },
    /// Stop the loop now
    Cancel,
}

// ── Dispatch ──

pub fn run(cmd: LoopCmd, paths: &ProjectPaths) -> anyhow::Result<()> {
    let settings = Settings::resolve(paths);
    match cmd {
        LoopCmd::Start {
            mode,
            max_iterations,
        } => {
            let state = start(paths, &settings, mode, max_iterations, OffsetDateTime::now_utc())?;
            println!(
                "Loop started: mode={}, max iterations={}",
                state.mode, state.max_iterations
            );
            Ok(())
        }
        LoopCmd::Status { json } => status(paths, &settings, json),
        LoopCmd::Cancel => {
            match cancel(paths, &settings)? {
                Some(state) => println!("Loop cancelled at iteration {}", state.iteration),
                None => println!("No active loop."),
            }
            Ok(())
        }
    }
}

// ── Command Implementations ──

/// `hookloop loop start`
pub fn start(
    paths: &ProjectPaths,
    settings: &Settings,
    mode: LoopMode,
    max_iterations: Option<u32>,
    now: OffsetDateTime,
) -> anyhow::Result<LoopState> {
    let mut state = load_state(paths, settings.max_iterations);
    let mode = if mode.is_explicit() {
        mode
    } else {
        let scratch = LoopState {
            mode: LoopMode::Auto,
            ..LoopState::default()
        };
        resolve_mode(&scratch, &Sources::read(paths))
    };
    if mode == LoopMode::Idle {
        anyhow::bail!(
            "Nothing to loop over: add items to {} or next steps to {}, or pass --mode",
            paths.todo_md.display(),
            paths.handoff_md.display()
        );
    }
    if let Some(max) = max_iterations {
        if max == 0 {
            anyhow::bail!("--max-iterations must be at least 1");
        }
        state.max_iterations = max;
    }
    state.activate(mode, now.format(&Rfc3339)?);
    save_state(paths, &mut state)?;
    append_event(
        paths,
        &format!(
            "Loop started: mode={mode}, max={}",
            state.max_iterations
        ),
    )?;
    Ok(state)
}

/// `hookloop loop cancel`. `None` when no loop was running.
pub fn cancel(paths: &ProjectPaths, settings: &Settings) -> anyhow::Result<Option<LoopState>> {
    let mut state = load_state(paths, settings.max_iterations);
    if !state.active {
        return Ok(None);
    }
    state.active = false;
    state.mode = LoopMode::Idle;
    state.status = LoopStatus::Cancelled;
    save_state(paths, &mut state)?;
    append_event(
        paths,
        &format!("Loop cancelled by operator at iteration {}", state.iteration),
    )?;
    Ok(Some(state))
}

/// `hookloop loop status`
fn status(paths: &ProjectPaths, settings: &Settings, json: bool) -> anyhow::Result<()> {
    let mut state = load_state(paths, settings.max_iterations);
    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let sources = Sources::read(paths);
    let mode = resolve_mode(&state, &sources);
    state.todos = sources.todos;
    state.handoff = sources.handoff;

    println!("Mode: {} (resolved: {mode})", state.mode);
    println!("Status: {}", state.status);
    println!("Active: {}", state.active);
    println!("Iteration: {}/{}", state.iteration, state.max_iterations);
    println!(
        "Elapsed: {}",
        format_elapsed(state.start_time.as_deref(), OffsetDateTime::now_utc())
    );
    println!(
        "Todos: {} pending, {} in progress, {} done",
        state.todos.pending.len(),
        state.todos.in_progress.len(),
        state.todos.completed.len()
    );
    if mode != LoopMode::Idle {
        let next = Driver::for_mode(mode).next_task(&state);
        println!("Next: {}", truncate_chars(&next, settings.task_chars));
    }

    let events = recent_events(paths, 3);
    if !events.is_empty() {
        println!("Recent events:");
        for e in events {
            println!("  {e}");
        }
    }
    Ok(())
}
