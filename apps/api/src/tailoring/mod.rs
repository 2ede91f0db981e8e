//! Tailoring workflow: recommendation application engine, session state
//! machine, and the HTTP handlers that drive them.

pub mod engine;
pub mod handlers;
pub mod session;
