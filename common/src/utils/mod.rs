pub mod config;
pub mod llm;
pub mod model_loader;
