use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(
    example = json!({
        "employeeId": "K012345",
        "name": "Mohammad Farhadi",
        "managerId": "K000001",
        "contractHours": 40,
        "isManager": false,
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = "K012345")]
    pub employee_id: String,

    #[schema(example = "Mohammad Farhadi")]
    pub name: String,

    #[schema(example = "K000001", nullable = true)]
    pub manager_id: Option<String>,

    /// Weekly contract hours, drives the pro-rata entitlement. Always > 0.
    #[schema(example = 40)]
    pub contract_hours: u32,

    #[schema(example = false)]
    pub is_manager: bool,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,

    #[schema(example = "2024-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lightweight projection used for manager/subordinate listings.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSummary {
    #[schema(example = "K012345")]
    pub employee_id: String,
    #[schema(example = "Mohammad Farhadi")]
    pub name: String,
    #[schema(example = 40)]
    pub contract_hours: u32,
}
