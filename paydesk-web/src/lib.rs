//! PayDesk admin dashboard client.
//!
//! The [`session`] module is the client half of the admin gate; [`routes`]
//! and [`pages`] are the thin shells rendered behind it.

pub mod app;
pub mod config;
pub mod logging;
pub mod pages;
pub mod routes;
pub mod session;
