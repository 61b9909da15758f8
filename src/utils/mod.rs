//! Process-level helpers shared by binaries and embedding applications.

pub mod bootstrap;
pub mod retry;
