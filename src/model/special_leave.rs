use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::leave::SpecialLeaveType;

/// Usage row keyed by (employee, year, special leave type). Created on the
/// first approval of a leave of that type.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialLeaveUsage {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "K012345")]
    pub employee_id: String,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = "MOVING")]
    pub special_leave_type: SpecialLeaveType,
    #[schema(example = 1)]
    pub used_days: i64,
    #[schema(example = 8.0)]
    pub used_hours: f64,
}

/// Per-type usage as served over the wire; covers every subtype, including
/// ones without a stored row, each with its cap for the employee's contract.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpecialLeaveUsageResponse {
    #[schema(example = "MOVING")]
    pub special_leave_type: SpecialLeaveType,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 0)]
    pub used_days: i64,
    #[schema(example = 0.0)]
    pub used_hours: f64,
    #[schema(example = 1)]
    pub max_days: i64,
    #[schema(example = 8.0)]
    pub max_hours: f64,
    #[schema(example = 8.0)]
    pub remaining_hours: f64,
}
