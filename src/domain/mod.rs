pub mod content;
pub mod error;
pub mod llm_config;
pub mod summary;
pub mod test_scenario;
