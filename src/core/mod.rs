//! Conversation state, remote session lifecycle, and the ambient services
//! (configuration, credentials) they depend on.

pub mod config;
pub mod controller;
pub mod error;
pub mod gemini;
pub mod history;
pub mod keyring;
pub mod message;
pub mod preferences;
pub mod sanitize;
pub mod session;
pub mod translate;
pub mod worker;
