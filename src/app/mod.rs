mod runner;
mod summary;

pub(crate) use runner::run_plan;
pub(crate) use summary::{print_listing, print_report};
