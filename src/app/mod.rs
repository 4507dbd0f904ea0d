//! Runtime plumbing for the binary: settings, progress output and terminal setup.

pub(crate) mod context;
pub(crate) mod progress_manager;
pub(crate) mod terminal;
