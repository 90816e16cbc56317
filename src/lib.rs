pub mod app;
pub mod concept;
pub mod config;
pub mod files;
pub mod portal;
pub mod service;
pub mod utils;
pub mod wizard;
