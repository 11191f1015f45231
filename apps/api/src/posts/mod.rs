//! Post Store: write-once persistence of generation results plus the listing endpoint.

pub mod handlers;
pub mod memory;
pub mod store;
