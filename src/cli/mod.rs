//! CLI-only building blocks: install/uninstall orchestration.

pub mod install;
