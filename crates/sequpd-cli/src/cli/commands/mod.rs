//! CLI command handlers, one per file.

mod check;
mod components;
mod status;
mod update;

pub use check::run_check;
pub use components::run_components;
pub use status::run_status;
pub use update::run_update;

#[cfg(test)]
pub(crate) use check::{build_request, select_ids};
