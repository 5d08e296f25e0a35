//! Storekeep Core - Shared domain types.
//!
//! This crate provides the types shared by every Storekeep component:
//! - `web` - The customer and order management site
//! - `cli` - Command-line tools for migrations and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! Database encode/decode impls are gated behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, email addresses, prices, and the enumerated
//!   order status, product category and user role

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
