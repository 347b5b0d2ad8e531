//! CLI Commands

pub mod auth;
pub mod config;
pub mod resources;
