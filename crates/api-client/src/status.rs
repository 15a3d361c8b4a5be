//! Status and role enumerations exchanged with the backend
//!
//! Wire values are the backend's French constants. Legacy spellings seen in
//! older payloads are accepted on input and never produced on output.

use crate::error::ApiError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Lifecycle of an event or club event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventStatus {
    /// `AVENIR`
    #[default]
    Upcoming,
    /// `EN_COURS` (legacy `ACTIF`, `ACTIVE`)
    Ongoing,
    /// `PASSE` (legacy `TERMINE`)
    Past,
    /// `ANNULE` (legacy `INACTIVE`)
    Cancelled,
}

impl EventStatus {
    /// Wire value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "AVENIR",
            Self::Ongoing => "EN_COURS",
            Self::Past => "PASSE",
            Self::Cancelled => "ANNULE",
        }
    }

    /// Whether an event may move from `self` to `next`
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Upcoming, Self::Ongoing)
                | (Self::Upcoming, Self::Cancelled)
                | (Self::Ongoing, Self::Past)
        )
    }

    /// No transition leaves this status
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Past | Self::Cancelled)
    }
}

impl FromStr for EventStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AVENIR" => Ok(Self::Upcoming),
            "EN_COURS" | "ACTIF" | "ACTIVE" => Ok(Self::Ongoing),
            "PASSE" | "TERMINE" => Ok(Self::Past),
            "ANNULE" | "INACTIVE" => Ok(Self::Cancelled),
            other => Err(ApiError::validation(format!("unknown event status: {other}"))),
        }
    }
}

/// Moderation state of a club
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClubState {
    /// `EN_ATTENTE`
    #[default]
    Pending,
    /// `ACCEPTER`
    Accepted,
    /// `REFUSER`
    Rejected,
}

impl ClubState {
    /// Wire value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "EN_ATTENTE",
            Self::Accepted => "ACCEPTER",
            Self::Rejected => "REFUSER",
        }
    }

    /// Only pending clubs are moderated
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Accepted) | (Self::Pending, Self::Rejected)
        )
    }
}

impl FromStr for ClubState {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EN_ATTENTE" => Ok(Self::Pending),
            "ACCEPTER" | "ACCEPTE" => Ok(Self::Accepted),
            "REFUSER" | "REFUSE" => Ok(Self::Rejected),
            other => Err(ApiError::validation(format!("unknown club state: {other}"))),
        }
    }
}

/// Enrollment status of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParticipantStatus {
    /// `CONFIRMED`
    #[default]
    Confirmed,
    /// `PENDING`
    Pending,
    /// `CANCELLED`
    Cancelled,
}

impl ParticipantStatus {
    /// Wire value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Pending => "PENDING",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Confirmation and cancellation go forward; a cancelled enrollment may be renewed.
    /// Re-applying the current status is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next
            || matches!(
                (self, next),
                (Self::Pending, Self::Confirmed)
                    | (Self::Pending | Self::Confirmed, Self::Cancelled)
                    | (Self::Cancelled, Self::Pending | Self::Confirmed)
            )
    }
}

impl FromStr for ParticipantStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CONFIRMED" => Ok(Self::Confirmed),
            "PENDING" => Ok(Self::Pending),
            "CANCELLED" | "CANCELED" => Ok(Self::Cancelled),
            other => Err(ApiError::validation(format!(
                "unknown participant status: {other}"
            ))),
        }
    }
}

/// Role of a club member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MemberRole {
    /// `ADMIN_CLUB`
    Admin,
    /// `MEMBRE`
    #[default]
    Member,
}

impl MemberRole {
    /// Wire value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN_CLUB",
            Self::Member => "MEMBRE",
        }
    }
}

impl FromStr for MemberRole {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN_CLUB" | "ADMIN" => Ok(Self::Admin),
            "MEMBRE" | "MEMBER" => Ok(Self::Member),
            other => Err(ApiError::validation(format!("unknown member role: {other}"))),
        }
    }
}

/// Moderation status of a forum report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReportStatus {
    /// `PENDING`
    #[default]
    Pending,
    /// `REVIEWED`
    Reviewed,
    /// `RESOLVED`
    Resolved,
}

impl ReportStatus {
    /// Wire value
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Reviewed => "REVIEWED",
            Self::Resolved => "RESOLVED",
        }
    }

    /// Whether moderators still have to look at it
    #[must_use]
    pub fn is_open(self) -> bool {
        self != Self::Resolved
    }
}

impl FromStr for ReportStatus {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "REVIEWED" => Ok(Self::Reviewed),
            "RESOLVED" => Ok(Self::Resolved),
            other => Err(ApiError::validation(format!("unknown report status: {other}"))),
        }
    }
}

macro_rules! wire_serde {
    ($($ty:ty),+ $(,)?) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                match Option::<String>::deserialize(deserializer)? {
                    Some(raw) if !raw.trim().is_empty() => raw.parse().map_err(de::Error::custom),
                    _ => Ok(Self::default()),
                }
            }
        }
    )+};
}

wire_serde!(EventStatus, ClubState, ParticipantStatus, MemberRole, ReportStatus);
