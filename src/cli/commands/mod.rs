//! CLI command implementations.

pub mod details;
pub mod history;
pub mod init;
pub mod manage;
pub mod markets;
pub mod overview;
pub mod performers;
pub mod profile;
pub mod refresh;
pub mod roster;
pub mod validate;
pub mod watch;
