//! Persistence for products and their images.
//!
//! Every function takes any SeaORM connection, so the same code runs against
//! the pool or inside a transaction opened by the caller.

pub mod product_images;
pub mod products;
