pub mod commands;
pub mod config;
pub mod converter;
pub mod http;
pub mod suite;
