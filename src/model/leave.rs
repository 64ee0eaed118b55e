use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LeaveStatus {
    #[sqlx(rename = "REQUESTED")]
    Requested,
    #[sqlx(rename = "APPROVED")]
    Approved,
    #[sqlx(rename = "REJECTED")]
    Rejected,
    #[sqlx(rename = "CANCELLED")]
    Cancelled,
    #[sqlx(rename = "CLOSED")]
    Closed,
}

impl LeaveStatus {
    /// Terminal leaves no longer count for overlap checks or balances.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Cancelled | Self::Closed)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Display, EnumString,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum LeaveType {
    #[sqlx(rename = "REGULAR")]
    Regular,
    #[sqlx(rename = "SPECIAL")]
    Special,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Display,
    EnumString, EnumIter, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SpecialLeaveType {
    #[sqlx(rename = "MOVING")]
    Moving,
    #[sqlx(rename = "WEDDING")]
    Wedding,
    #[sqlx(rename = "CHILD_BIRTH")]
    ChildBirth,
    #[sqlx(rename = "PARENTAL_CARE")]
    ParentalCare,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Leave {
    #[schema(example = "0c7c9d3e-4d6a-4b5e-9f21-0a4c7c1f2ab3")]
    pub leave_id: String,

    #[schema(example = "Summer vacation")]
    pub leave_label: String,

    #[schema(example = "K012345")]
    pub employee_id: String,

    #[schema(example = "2024-07-01T09:00:00", format = "date-time", value_type = String)]
    pub start_of_leave: NaiveDateTime,

    #[schema(example = "2024-07-05T17:00:00", format = "date-time", value_type = String)]
    pub end_of_leave: NaiveDateTime,

    #[schema(example = "K000001", nullable = true)]
    pub approver_id: Option<String>,

    #[schema(example = "REQUESTED")]
    pub status: LeaveStatus,

    #[schema(example = "REGULAR")]
    pub leave_type: LeaveType,

    #[schema(example = "MOVING", nullable = true)]
    pub special_leave_type: Option<SpecialLeaveType>,

    /// Billed working hours, stamped by the rules engine on creation.
    #[schema(example = 40.0)]
    pub total_hours: f64,

    #[schema(example = "2024-06-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,

    #[schema(example = "2024-06-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn status_tokens_round_trip() {
        for (token, status) in [
            ("REQUESTED", LeaveStatus::Requested),
            ("APPROVED", LeaveStatus::Approved),
            ("REJECTED", LeaveStatus::Rejected),
            ("CANCELLED", LeaveStatus::Cancelled),
            ("CLOSED", LeaveStatus::Closed),
        ] {
            assert_eq!(LeaveStatus::from_str(token).unwrap(), status);
            assert_eq!(status.to_string(), token);
        }
        assert!(LeaveStatus::from_str("PENDING").is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!LeaveStatus::Requested.is_terminal());
        assert!(!LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
        assert!(LeaveStatus::Cancelled.is_terminal());
        assert!(LeaveStatus::Closed.is_terminal());
    }

    #[test]
    fn special_leave_tokens_use_screaming_snake_case() {
        assert_eq!(
            SpecialLeaveType::from_str("CHILD_BIRTH").unwrap(),
            SpecialLeaveType::ChildBirth
        );
        assert_eq!(SpecialLeaveType::ParentalCare.to_string(), "PARENTAL_CARE");
    }
}
