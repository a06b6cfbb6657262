//! Markdown transform tests
//!
//! End-to-end tests over the public import/export surface.

mod range;
mod round_trip;
mod table;
