use std::io::Read;

use hookloop_bridge::{hook_entrypoint_from_stdin, HookKind};
use tracing::debug;

/// Hook entrypoint: stdin JSON in, at most one JSON line out.
///
/// Never returns an error to the host; the exit code comes from the result
/// (0, or 2 when the bash guard blocks).
pub fn execute(kind: HookKind) -> anyhow::Result<()> {
    let mut stdin_buf = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut stdin_buf) {
        debug!(hook = %kind, error = %e, "stdin read failed");
        return Ok(());
    }
    debug!(hook = %kind, bytes = stdin_buf.len(), "hook stdin");

    let result = hook_entrypoint_from_stdin(kind, &stdin_buf);
    if let Some(output) = &result.stdout {
        println!("{output}");
    }
    if let Some(msg) = &result.stderr {
        eprintln!("{msg}");
    }
    if result.exit_code != 0 {
        std::process::exit(result.exit_code);
    }
    Ok(())
}
