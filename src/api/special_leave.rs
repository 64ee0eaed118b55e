use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local};
use serde_json::json;
use sqlx::MySqlPool;
use strum::IntoEnumIterator;
use tracing::error;

use crate::{
    api::balance::BalanceQuery,
    model::{
        leave::SpecialLeaveType,
        special_leave::{SpecialLeaveUsage, SpecialLeaveUsageResponse},
    },
    rules::LeaveRules,
};

/// Get an employee's special-leave usage for a year
///
/// Returns one entry per subtype, including the ones without any usage, each
/// carrying the cap for the employee's contract hours.
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/special-leave-usage",
    params(
        ("employee_id" = String, Path, description = "Employee id"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Usage for every special leave type", body = Vec<SpecialLeaveUsageResponse>),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        }))
    ),
    tag = "Balance"
)]
pub async fn get_special_leave_usage(
    pool: web::Data<MySqlPool>,
    rules: web::Data<LeaveRules>,
    path: web::Path<String>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let year = query.year.unwrap_or_else(|| Local::now().year());

    let contract_hours = sqlx::query_scalar::<_, u32>(
        "SELECT contract_hours FROM employees WHERE employee_id = ?",
    )
    .bind(&employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, %employee_id, "Failed to fetch employee for special leave usage");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(contract_hours) = contract_hours else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Employee not found"
        })));
    };

    let rows = sqlx::query_as::<_, SpecialLeaveUsage>(
        r#"
        SELECT id, employee_id, year, special_leave_type, used_days, used_hours
        FROM special_leave_usage
        WHERE employee_id = ? AND year = ?
        "#,
    )
    .bind(&employee_id)
    .bind(year)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, %employee_id, year, "Failed to fetch special leave usage");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let by_type: HashMap<SpecialLeaveType, SpecialLeaveUsage> = rows
        .into_iter()
        .map(|row| (row.special_leave_type, row))
        .collect();

    let usage: Vec<SpecialLeaveUsageResponse> = SpecialLeaveType::iter()
        .map(|special_leave_type| {
            let limit = rules.special_leave_limit(special_leave_type, contract_hours);
            let (used_days, used_hours) = by_type
                .get(&special_leave_type)
                .map(|row| (row.used_days, row.used_hours))
                .unwrap_or((0, 0.0));

            SpecialLeaveUsageResponse {
                special_leave_type,
                year,
                used_days,
                used_hours,
                max_days: i64::from(limit.max_days),
                max_hours: f64::from(limit.max_hours),
                remaining_hours: f64::from(limit.max_hours) - used_hours,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(usage))
}
