//! E2E test suite entry point.

mod bundle_workflow;
mod fixture;
mod fresh_install;
mod local_edits;
mod update_workflow;
