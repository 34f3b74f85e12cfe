//! # arbolito-providers
//!
//! Language-model completion providers.

pub mod openai;

pub use openai::OpenAiProvider;
