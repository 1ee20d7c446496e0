//! HTTP route handlers.

pub mod appointments;
pub mod services;
pub mod staff;
pub mod system;
