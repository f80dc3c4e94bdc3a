//! Palaver is a full-screen terminal chat assistant backed by a Gemini model.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the conversation: message history, the remote session
//!   manager, the controller that runs one turn at a time, sanitizing and
//!   translation, plus configuration and credentials.
//! - [`ui`] renders the terminal interface and runs the event loop that
//!   mirrors the conversation worker.
//! - [`api`] defines the `generateContent` request and response payloads.
//! - [`utils`] holds logging setup and syntax highlighting.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into [`ui::chat_loop`] for
//! interactive sessions.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
