pub mod export;
pub mod generate;
pub mod normalizer;
pub mod prompt_builder;
