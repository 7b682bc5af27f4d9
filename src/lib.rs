pub mod api;
pub mod app;
pub mod components;
pub mod config;
pub mod dom;
pub mod models;
pub mod notify;
pub mod templates;
