pub mod config;
pub mod logging;

pub mod configurator;
pub mod manifest;
pub mod persisted_data;
pub mod service;
pub mod update_checker;
