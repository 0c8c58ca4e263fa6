#![cfg_attr(not(test), forbid(unsafe_code))]

//! Types shared by the PayDesk edge server and the browser client: the
//! credential codec both gates rely on, the user and session wire models, and
//! the server configuration.

pub mod auth;
pub mod config;
pub mod models;
