//! Core types for Parley.

pub mod chunk;
pub mod message;
pub mod ui;
pub mod usage;

pub use chunk::*;
pub use message::*;
pub use ui::*;
pub use usage::*;
