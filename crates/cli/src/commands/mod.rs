//! CLI Commands

pub mod environment;
pub mod local;
pub mod trigger;
