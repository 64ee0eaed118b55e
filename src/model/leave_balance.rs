use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row per (employee, year), lazily created on first balance query.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalance {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "K012345")]
    pub employee_id: String,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 25)]
    pub total_days: i64,
    #[schema(example = 200.0)]
    pub total_hours: f64,
    #[schema(example = 5)]
    pub used_days: i64,
    #[schema(example = 40.0)]
    pub used_hours: f64,
}

/// Balance as served over the wire, with the derived remainder.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveBalanceResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "K012345")]
    pub employee_id: String,
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 25)]
    pub total_days: i64,
    #[schema(example = 200.0)]
    pub total_hours: f64,
    #[schema(example = 5)]
    pub used_days: i64,
    #[schema(example = 40.0)]
    pub used_hours: f64,
    #[schema(example = 20)]
    pub remaining_days: i64,
    #[schema(example = 160.0)]
    pub remaining_hours: f64,
}

impl From<LeaveBalance> for LeaveBalanceResponse {
    fn from(balance: LeaveBalance) -> Self {
        Self {
            remaining_days: balance.total_days - balance.used_days,
            remaining_hours: balance.total_hours - balance.used_hours,
            id: balance.id,
            employee_id: balance.employee_id,
            year: balance.year,
            total_days: balance.total_days,
            total_hours: balance.total_hours,
            used_days: balance.used_days,
            used_hours: balance.used_hours,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_is_total_minus_used() {
        let response: LeaveBalanceResponse = LeaveBalance {
            id: 1,
            employee_id: "K012345".into(),
            year: 2024,
            total_days: 25,
            total_hours: 200.0,
            used_days: 11,
            used_hours: 88.0,
        }
        .into();

        assert_eq!(response.remaining_days, 14);
        assert_eq!(response.remaining_hours, 112.0);
    }

    #[test]
    fn remainder_may_go_negative() {
        let response: LeaveBalanceResponse = LeaveBalance {
            id: 2,
            employee_id: "K012346".into(),
            year: 2024,
            total_days: 20,
            total_hours: 160.0,
            used_days: 22,
            used_hours: 176.0,
        }
        .into();

        assert_eq!(response.remaining_days, -2);
        assert_eq!(response.remaining_hours, -16.0);
    }
}
