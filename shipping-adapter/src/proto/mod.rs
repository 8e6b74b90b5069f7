//! Wire contract for the remote shipping service.
//!
//! `shipping.rs` is generated from `proto/shipping.proto` and checked in so the
//! crate builds without `protoc`. Regenerate it when the contract changes.

#![allow(missing_docs, missing_debug_implementations, unused_qualifications)]

mod shipping;

pub use shipping::*;
