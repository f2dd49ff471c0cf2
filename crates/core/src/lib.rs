//! `restock-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no I/O, no logging setup).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, find_by_id};
pub use error::{DomainError, DomainResult};
pub use id::{MovementId, ProductId};
