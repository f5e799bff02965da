pub mod api;
pub mod api_error;
pub mod app;
pub mod config;
pub mod fetch_error;
pub mod fetcher;
pub mod models;
pub mod parser;
pub mod render;
pub mod services;
