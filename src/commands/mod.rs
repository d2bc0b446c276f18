pub mod auth;
pub mod board;
pub mod init;
pub mod project;
pub mod task;
pub mod workspace;

use anyhow::Result;
use std::io::{self, Write};
use tracing::warn;

use crate::client::{ApiError, Client};

/// Terminal handler for resource-client failures. An unauthenticated
/// response anywhere invalidates the whole session, so the stored
/// tokens are dropped before the user is told to log in again.
pub(crate) fn surface(client: &mut Client, err: ApiError) -> anyhow::Error {
    if err == ApiError::Unauthenticated {
        if let Err(e) = client.session_mut().clear() {
            warn!("could not clear session: {e:#}");
        }
        return anyhow::anyhow!("Not logged in (or session expired). Run 'taskdeck login <username>'.");
    }
    anyhow::Error::new(err)
}

/// y/N confirmation on stdin.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars - 3).collect();
        format!("{}...", truncated)
    }
}
