//! PageMark: saved scroll positions ("markers") per page URL.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod config;
pub mod database;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
