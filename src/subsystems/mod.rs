//! Subsystem modules for the PYQ bot.

pub mod auth;
pub mod comms;
pub mod conversation;
pub mod papers;
pub mod runtime;
