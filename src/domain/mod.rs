//! Explorer state: navigation, the lazy tree, detail, feed and writes
//!
//! Nothing here performs I/O. Each component hands out request values and
//! accepts results tagged with the ticket it issued.

pub mod detail;
pub mod feed;
pub mod nav;
pub mod tree;
pub mod write;
