//! # arbolito-channels
//!
//! Messaging network integrations.

pub mod whatsapp;

pub use whatsapp::{Readiness, WhatsAppMessenger};
