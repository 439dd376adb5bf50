mod admission;
mod catalog;
mod interchange;
mod ipc;
mod logging;
mod sortkey;
mod store;
mod table;
mod validate;

use std::io::{self, BufRead, Write};

use serde_json::json;

// Line-delimited JSON over stdin/stdout: one request per line, one response
// per line, flushed immediately so the presentation layer never waits.
fn main() {
    let mut state = ipc::AppState::new();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                // No parseable id to echo back.
                json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                })
            }
        };

        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
