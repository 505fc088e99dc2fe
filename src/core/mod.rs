pub mod config;
pub mod conversation;
pub mod gateway;
pub mod secret;
pub mod session;
