//! # PayDesk edge server
//!
//! Serves the dashboard bundle behind the admin edge guard and exposes the
//! operational endpoints (`/healthz`, `/readyz`, `/metrics`).

pub mod http;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod telemetry;
mod tracer;
