//! Route handlers organized by resource

pub mod canvas;
pub mod health;
