pub mod config;
pub mod dispatch;
pub mod engine;
pub mod guard;
pub mod handoff;
pub mod mode;
mod parse;
pub mod progress;
mod redact;
pub mod render;
pub mod signals;

pub use config::Settings;
pub use dispatch::{dispatch, hook_entrypoint_from_stdin, settle, HookKind, HookResult};
pub use engine::{advance, run_stop, Driver, Transition};
pub use handoff::{advance_run, HandoffRecord};
pub use mode::{resolve_mode, Sources};
