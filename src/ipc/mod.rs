//! Newline-delimited JSON request/response protocol over stdin/stdout.

mod error;
mod handlers;
mod router;
mod types;

use std::io::{BufRead, Write};

use serde_json::json;
use tracing::{debug, warn};

pub use router::handle_request;
pub use types::{AppState, Request};

/// Answers one response line per request line until the input closes.
pub fn serve<R: BufRead, W: Write>(
    state: &mut AppState,
    input: R,
    mut output: W,
) -> anyhow::Result<()> {
    for line in input.lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "stdin read failed, stopping");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<Request>(&line) {
            Ok(req) => {
                debug!(id = %req.id, method = %req.method, "ipc request");
                handle_request(state, req)
            }
            // Without a parsed id there is nothing to correlate; reply anyway.
            Err(e) => json!({
                "ok": false,
                "error": { "code": "bad_json", "message": e.to_string() }
            }),
        };
        writeln!(output, "{resp}")?;
        output.flush()?;
    }
    Ok(())
}
