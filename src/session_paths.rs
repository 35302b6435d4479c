//! Purpose: Resolve where the persistent session file lives on disk.
//! Exports: `default_session_path`.
//! Role: Keep CLI and library session-file defaults aligned from one source.
//! Invariants: Default location remains `~/.dogear/session.json`.

use std::path::PathBuf;

pub(crate) fn default_session_path() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    PathBuf::from(home).join(".dogear").join("session.json")
}
