use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use crate::{
    model::leave_balance::{LeaveBalance, LeaveBalanceResponse},
    rules::LeaveRules,
};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    /// Balance year; defaults to the current year
    #[param(example = 2024)]
    pub year: Option<i32>,
}

/// Fetches the (employee, year) balance row, creating it from the pro-rata
/// entitlement when it does not exist yet.
pub(crate) async fn ensure_balance(
    pool: &MySqlPool,
    rules: &LeaveRules,
    employee_id: &str,
    contract_hours: u32,
    year: i32,
) -> Result<LeaveBalance, sqlx::Error> {
    let existing = sqlx::query_as::<_, LeaveBalance>(
        r#"
        SELECT id, employee_id, year, total_days, total_hours, used_days, used_hours
        FROM leave_balances
        WHERE employee_id = ? AND year = ?
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .fetch_optional(pool)
    .await?;

    if let Some(balance) = existing {
        return Ok(balance);
    }

    let entitlement = rules.pro_rata_entitlement(contract_hours);

    let inserted = sqlx::query(
        r#"
        INSERT INTO leave_balances (employee_id, year, total_days, total_hours)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .bind(i64::from(entitlement.days))
    .bind(f64::from(entitlement.hours))
    .execute(pool)
    .await?;

    Ok(LeaveBalance {
        id: inserted.last_insert_id(),
        employee_id: employee_id.to_string(),
        year,
        total_days: i64::from(entitlement.days),
        total_hours: f64::from(entitlement.hours),
        used_days: 0,
        used_hours: 0.0,
    })
}

/// Sums the stamped working hours of all approved leaves starting in `year`.
pub(crate) async fn approved_hours_in_year(
    pool: &MySqlPool,
    employee_id: &str,
    year: i32,
) -> Result<f64, sqlx::Error> {
    let year_start = jan_first(year);
    let year_end = jan_first(year + 1);

    sqlx::query_scalar::<_, f64>(
        r#"
        SELECT COALESCE(SUM(total_hours), 0)
        FROM leaves
        WHERE employee_id = ?
          AND status = 'APPROVED'
          AND start_of_leave >= ?
          AND start_of_leave < ?
        "#,
    )
    .bind(employee_id)
    .bind(year_start)
    .bind(year_end)
    .fetch_one(pool)
    .await
}

fn jan_first(year: i32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .expect("January 1st exists in every year")
        .and_hms_opt(0, 0, 0)
        .expect("midnight")
}

/// Get an employee's leave balance for a year
///
/// The year's row is created lazily from the pro-rata entitlement; usage is
/// recomputed from that year's approved leaves on every call.
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/balance",
    params(
        ("employee_id" = String, Path, description = "Employee id"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Balance with remaining days/hours", body = LeaveBalanceResponse),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        }))
    ),
    tag = "Balance"
)]
pub async fn get_employee_balance(
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
        error!(error = %e, %employee_id, "Failed to fetch employee for balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(contract_hours) = contract_hours else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Employee not found"
        })));
    };

    let mut balance = ensure_balance(pool.get_ref(), rules.get_ref(), &employee_id, contract_hours, year)
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, year, "Failed to load leave balance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let used_hours = approved_hours_in_year(pool.get_ref(), &employee_id, year)
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, year, "Failed to sum approved leaves");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;
    let used_days = (used_hours / 8.0).round() as i64;

    sqlx::query("UPDATE leave_balances SET used_days = ?, used_hours = ? WHERE id = ?")
        .bind(used_days)
        .bind(used_hours)
        .bind(balance.id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, year, "Failed to persist leave usage");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    balance.used_days = used_days;
    balance.used_hours = used_hours;

    Ok(HttpResponse::Ok().json(LeaveBalanceResponse::from(balance)))
}
