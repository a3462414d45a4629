//! PostgreSQL store implementations
//!
//! Each repository follows these patterns:
//! - Handles conflicts via ON CONFLICT (no check-then-insert)
//! - One statement per operation

pub mod canvases;

pub use canvases::PgCanvasStore;
