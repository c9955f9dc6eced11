//! API Routes
//!
//! Route handlers organized by functionality.

pub mod ask;
pub mod health;
pub mod rebuild;
pub mod welcome;
