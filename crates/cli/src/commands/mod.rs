//! CLI Commands

pub mod demo;
pub mod generate;
pub mod layout;
pub mod probe;
