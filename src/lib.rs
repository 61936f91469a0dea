//! issuebot - chat bot that answers `#123` with the tracker issue behind it

pub mod channel_log;
pub mod commands;
pub mod config;
pub mod error;
pub mod guard;
pub mod issues;
pub mod karma;
pub mod reply;
pub mod scheduler;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod triggers;
