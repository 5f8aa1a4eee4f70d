mod app;
mod auth;
mod cli;
mod config;
mod render;

pub use app::run;
