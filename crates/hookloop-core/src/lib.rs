pub mod error;
pub mod state;

pub use error::LoopError;
pub use state::{
    HandoffMirror, LoopMode, LoopState, LoopStatus, TodoList, DEFAULT_MAX_ITERATIONS,
};
