// src/services/mod.rs
pub mod normalizer;
pub mod prompts;
pub mod relay;
pub mod static_config;
pub mod upstream;
