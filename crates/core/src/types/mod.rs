//! Core types for Saleso.
//!
//! This module provides type-safe wrappers and payload shapes for the
//! backend's entities.

pub mod credential;
pub mod discount;
pub mod id;
pub mod price;
pub mod product;
pub mod status;
pub mod user;

pub use credential::{RefreshedTokens, TokenPair};
pub use discount::{Discount, DiscountKind, NewDiscount};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::{Category, NewCategory, NewProduct, Product, ProductPage, ProductQuery};
pub use status::*;
pub use user::{Address, CurrentUser, NewAddress, UpdateProfile, UserDetail};
