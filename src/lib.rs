pub mod auth;
pub mod commands;
pub mod config;
pub mod edit;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod logging;
pub mod manager;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod tui;
