//! Application service layer - scan use cases, config, image input, export

pub mod app;
pub mod config;
pub mod export;
pub mod scanner;
