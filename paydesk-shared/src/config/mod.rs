//! # Configuration
//!
//! Server-side configuration for the edge process. The browser client reads
//! its own settings at compile time (see `paydesk-web`'s `config` module).

#[cfg(not(target_arch = "wasm32"))]
pub mod server;
