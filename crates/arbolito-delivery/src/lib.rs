//! # arbolito-delivery
//!
//! The outbound flow: resolve a recipient, dispatch a payload, wait for
//! the server acknowledgement. Each step is an explicit async call; the
//! messaging client itself stays behind the [`arbolito_core::traits::Messenger`]
//! trait.

pub mod ack;
pub mod dispatcher;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;
