#![deny(warnings)]

pub mod actions;
pub mod config;
pub mod logging;
pub mod runner;
