//! Storefront
//!
//! Cart state and persistence for a small storefront: an ordered cart of
//! catalog products that survives restarts, with a command line consumer on
//! top of a remote product catalog.

pub mod cart;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod fixtures;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod storage;
