pub mod config;
pub mod core;
pub mod error;
pub mod interfaces;
pub mod logging;
