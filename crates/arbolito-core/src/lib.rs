//! # arbolito-core
//!
//! Core types, traits, configuration, and error handling for Arbolito.

pub mod config;
pub mod error;
pub mod message;
pub mod recipient;
pub mod traits;
