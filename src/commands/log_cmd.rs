//! Log Commands
//!
//! Exposes the in-memory log tail to the admin shell's diagnostics panel.

/// Most recent log lines, oldest first. Empty when file logging is off.
pub async fn recent_log_lines(limit: Option<usize>) -> Result<Vec<String>, String> {
    let lines = rolling_logger::recent_logs();
    Ok(match limit {
        Some(n) if n < lines.len() => lines[lines.len() - n..].to_vec(),
        _ => lines,
    })
}
