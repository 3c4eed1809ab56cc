//! Saleso Core - Shared types and client-side domain logic.
//!
//! This crate provides the types used across the Saleso admin client:
//! - `saleso-client` - Authenticated HTTP gateway and typed backend API
//! - `saleso-cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! storage, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, credentials, and backend payloads
//! - [`catalog`] - Category-tree lookup and stepwise navigation
//! - [`checkout`] - Splitting a cart into per-seller orders

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod checkout;
pub mod types;

pub use types::*;
