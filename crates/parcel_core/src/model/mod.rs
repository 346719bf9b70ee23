//! Parcel tracking domain model.
//!
//! # Responsibility
//! - Define the data structures shared by the store and service layers.
//!
//! # Invariants
//! - Only the store assigns a parcel `number`.

pub mod parcel;
