//! Parcel domain model.
//!
//! # Responsibility
//! - Define the canonical parcel record persisted by the store.
//! - Encode the forward-only delivery lifecycle as a closed enum.
//!
//! # Invariants
//! - `number` is assigned by the store and never reused for another parcel.
//! - `status` only moves `registered -> sent -> delivered`.
//! - `created_at` is an RFC 3339 UTC timestamp with second precision.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned parcel identity.
pub type ParcelNumber = i64;

/// Opaque identifier of the client that owns a parcel.
pub type ClientId = i64;

/// Number carried by a parcel that has not been persisted yet.
pub const UNASSIGNED_NUMBER: ParcelNumber = 0;

/// Delivery lifecycle state.
///
/// Variants are declared in lifecycle order, so `Ord` follows the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted but not yet handed to a carrier.
    Registered,
    /// In transit.
    Sent,
    /// Terminal state.
    Delivered,
}

impl ParcelStatus {
    /// Returns the state that follows `self`, or `None` at the terminal state.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered => None,
        }
    }

    /// Stable text form used for storage and notices.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Parses the stable text form produced by [`ParcelStatus::as_str`].
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(Self::Registered),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical parcel record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Store-assigned identity. `UNASSIGNED_NUMBER` until persisted.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    /// Delivery address. Frozen once the parcel leaves `registered`.
    pub address: String,
    /// Creation time, RFC 3339 UTC, second precision.
    pub created_at: String,
}

impl Parcel {
    /// Creates an unpersisted parcel in the `registered` state stamped with
    /// the current UTC time.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self::with_created_at(client, address, format_timestamp(Utc::now()))
    }

    /// Creates an unpersisted `registered` parcel with a caller-provided
    /// creation timestamp.
    pub fn with_created_at(
        client: ClientId,
        address: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            number: UNASSIGNED_NUMBER,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: created_at.into(),
        }
    }
}

/// Formats a UTC instant in the sortable parcel timestamp format.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, Parcel, ParcelStatus, UNASSIGNED_NUMBER};
    use chrono::{DateTime, TimeZone, Utc};

    #[test]
    fn status_chain_is_forward_only() {
        assert_eq!(ParcelStatus::Registered.next(), Some(ParcelStatus::Sent));
        assert_eq!(ParcelStatus::Sent.next(), Some(ParcelStatus::Delivered));
        assert_eq!(ParcelStatus::Delivered.next(), None);
        assert!(ParcelStatus::Registered < ParcelStatus::Sent);
    }

    #[test]
    fn status_text_form_roundtrips() {
        for status in [
            ParcelStatus::Registered,
            ParcelStatus::Sent,
            ParcelStatus::Delivered,
        ] {
            assert_eq!(ParcelStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ParcelStatus::parse("lost"), None);
        assert_eq!(ParcelStatus::parse("Sent"), None);
    }

    #[test]
    fn new_parcel_is_registered_and_unassigned() {
        let parcel = Parcel::new(7, "Main st. 1");

        assert_eq!(parcel.number, UNASSIGNED_NUMBER);
        assert_eq!(parcel.status, ParcelStatus::Registered);
        assert!(DateTime::parse_from_rfc3339(&parcel.created_at).is_ok());
    }

    #[test]
    fn timestamp_uses_second_precision_utc() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 8, 5, 1).unwrap();
        assert_eq!(format_timestamp(at), "2024-03-09T08:05:01Z");
    }
}
