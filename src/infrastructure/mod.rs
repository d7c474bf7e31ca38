pub mod config;
pub mod documents;
pub mod llm_clients;
pub mod response;
pub mod security;
