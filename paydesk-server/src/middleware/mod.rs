pub mod edge_guard;
pub mod request_context;
pub mod security;
