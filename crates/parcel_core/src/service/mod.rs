//! Core use-case services.
//!
//! # Responsibility
//! - Apply parcel lifecycle rules on top of the repository contract.
//! - Keep callers decoupled from storage details.

pub mod parcel_service;
