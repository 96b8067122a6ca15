use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("unknown loop mode: {0} (expected idle, ralph, continuous, research, review or auto)")]
    UnknownMode(String),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed state file {}: {source}", path.display())]
    MalformedState {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_path() {
        let err = LoopError::Read {
            path: PathBuf::from("/tmp/x/agent-state.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("agent-state.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn unknown_mode_lists_choices() {
        let msg = LoopError::UnknownMode("turbo".into()).to_string();
        assert!(msg.contains("turbo"));
        assert!(msg.contains("ralph"));
    }
}
