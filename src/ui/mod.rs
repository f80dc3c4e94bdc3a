//! Terminal UI layer for interactive chat sessions.
//!
//! - [`chat_loop`]: the interaction loop that forwards input to the
//!   conversation worker and applies the events it sends back.
//! - [`app`] and [`transcript`]: the display mirror of the conversation.
//! - [`renderer`], [`markdown`] and [`markdown_wrap`]: frame composition.
//! - [`theme`]: the light and dark palettes.
//!
//! Ownership boundary: this layer presents and captures interaction state, while
//! [`crate::core`] owns the conversation and backend coordination.

pub mod app;
pub mod chat_loop;
pub mod markdown;
pub mod markdown_wrap;
pub mod renderer;
pub mod theme;
pub mod transcript;
