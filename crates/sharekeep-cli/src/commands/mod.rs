//! Subcommand implementations: thin glue over the engine.

pub mod add;
pub mod daemon;
pub mod edit;
pub mod list;
pub mod mount;
pub mod password;
pub mod remove;
pub mod status;
pub mod unmount;
