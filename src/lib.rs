// Library root: exposes the bot's internals to the binary and to
// integration tests. The binary entry point is src/main.rs.

pub mod config;
pub mod error;
pub mod logger;
pub mod subsystems;
