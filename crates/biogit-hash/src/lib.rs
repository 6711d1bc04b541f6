//! Hash computation and object identity for the biogit version control engine.
//!
//! This crate provides the core `ObjectId` type (a 40-hex SHA-1), hex
//! encoding/decoding, and streaming hash computation used throughout biogit.

mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use error::HashError;
pub use hasher::Hasher;
pub use oid::ObjectId;
