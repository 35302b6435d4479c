//! Purpose: Shared core library crate used by the `dogear` CLI and tests.
//! Exports: `api` (client, DTOs, validation), `error`, `session`, `render`.
//! Role: Internal library backing the binary; not yet a stable public SDK.
//! Invariants: Treat the crate API as internal until a dedicated library release.
//! Invariants: The CLI layer owns all terminal output; the library never prints.
pub mod api;
pub mod error;
pub mod render;
pub mod session;
mod session_paths;

pub use error::{Error, ErrorKind, to_exit_code};
pub use session::Session;
