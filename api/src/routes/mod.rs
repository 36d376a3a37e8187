//! Route handlers for the Amora API.

pub mod csrf;
pub mod session;
