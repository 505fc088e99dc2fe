//! Tandem is a terminal chat client for model-routing LLM gateways.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the encrypted credential store, config persistence, the
//!   in-memory conversation, and the gateway client, including the
//!   two-stage "reasoning approach then chat" request flow.
//! - [`api`] defines the chat-completions wire payloads.
//! - [`cli`] parses arguments and runs the interactive chat loop.
//! - [`utils`] holds small shared helpers such as URL assembly.
//!
//! The binary entrypoint (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
