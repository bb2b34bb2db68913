//! Command handlers

pub mod config;
pub mod edit;
pub mod files;
pub mod relay;
pub mod suggest;
pub mod versions;
