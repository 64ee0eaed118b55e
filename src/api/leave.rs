use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    api::balance::{approved_hours_in_year, ensure_balance},
    model::leave::{Leave, LeaveStatus, LeaveType, SpecialLeaveType},
    rules::LeaveRules,
};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeave {
    #[schema(example = "Summer vacation")]
    pub leave_label: String,
    #[schema(example = "K012345")]
    pub employee_id: String,
    #[schema(example = "2024-07-01T09:00:00", format = "date-time", value_type = String)]
    pub start_of_leave: NaiveDateTime,
    #[schema(example = "2024-07-05T17:00:00", format = "date-time", value_type = String)]
    pub end_of_leave: NaiveDateTime,
    /// Defaults to REGULAR
    #[schema(example = "REGULAR")]
    pub leave_type: Option<LeaveType>,
    #[schema(example = "MOVING", nullable = true)]
    pub special_leave_type: Option<SpecialLeaveType>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLeaveStatus {
    /// One of REQUESTED, APPROVED, REJECTED, CANCELLED, CLOSED
    #[schema(example = "APPROVED")]
    pub status: String,
    #[schema(example = "K000001")]
    pub approver_id: String,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteLeave {
    #[schema(example = "K012345")]
    pub employee_id: String,
}

/// Leave joined with employee and approver display names.
#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveWithNames {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub leave: Leave,
    #[schema(example = "Mohammad Farhadi", nullable = true)]
    pub employee_name: Option<String>,
    #[schema(example = "Velthoven Jeroen-van", nullable = true)]
    pub approver_name: Option<String>,
}

const LEAVE_WITH_NAMES_SQL: &str = r#"
    SELECT l.*, e.name AS employee_name, a.name AS approver_name
    FROM leaves l
    LEFT JOIN employees e ON e.employee_id = l.employee_id
    LEFT JOIN employees a ON a.employee_id = l.approver_id
"#;

async fn fetch_leave_with_names(
    pool: &MySqlPool,
    leave_id: &str,
) -> Result<Option<LeaveWithNames>, sqlx::Error> {
    let sql = format!("{} WHERE l.leave_id = ?", LEAVE_WITH_NAMES_SQL);
    sqlx::query_as::<_, LeaveWithNames>(&sql)
        .bind(leave_id)
        .fetch_optional(pool)
        .await
}

/// List an employee's leaves, newest first
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/leaves",
    params(
        ("employee_id" = String, Path, description = "Employee id")
    ),
    responses(
        (status = 200, description = "The employee's leaves", body = Vec<LeaveWithNames>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn employee_leaves(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let sql = format!(
        "{} WHERE l.employee_id = ? ORDER BY l.start_of_leave DESC",
        LEAVE_WITH_NAMES_SQL
    );

    let leaves = sqlx::query_as::<_, LeaveWithNames>(&sql)
        .bind(&employee_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, "Failed to fetch leaves");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(leaves))
}

/// List all leaves of a manager's direct reports, newest first
#[utoipa::path(
    get,
    path = "/api/managers/{manager_id}/leaves",
    params(
        ("manager_id" = String, Path, description = "Manager's employee id")
    ),
    responses(
        (status = 200, description = "Leaves of all direct reports", body = Vec<LeaveWithNames>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave"
)]
pub async fn manager_leaves(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let manager_id = path.into_inner();
    let sql = format!(
        r#"{}
        WHERE l.employee_id IN (SELECT employee_id FROM employees WHERE manager_id = ?)
        ORDER BY l.start_of_leave DESC
        "#,
        LEAVE_WITH_NAMES_SQL
    );

    let leaves = sqlx::query_as::<_, LeaveWithNames>(&sql)
        .bind(&manager_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %manager_id, "Failed to fetch manager leaves");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(leaves))
}

/// Submit a leave request
///
/// Runs the full business-rule validation, rejects overlaps with other
/// non-terminal leaves, stamps the billed working hours and checks the
/// remaining balance (regular) or the per-type cap (special) before creating
/// the leave in REQUESTED state with the employee's manager as approver.
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave created", body = LeaveWithNames),
        (status = 400, description = "Rule violation or insufficient balance", body = Object, example = json!({
            "error": "Leave request violates business rules",
            "details": ["Cannot schedule leave in the past"]
        })),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Overlapping leave exists")
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    pool: web::Data<MySqlPool>,
    rules: web::Data<LeaveRules>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    if payload.leave_label.trim().is_empty() || payload.employee_id.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "All fields are required"
        })));
    }

    let leave_type = payload.leave_type.unwrap_or(LeaveType::Regular);
    let now = Local::now().naive_local();

    let validation = rules.validate(
        payload.start_of_leave,
        payload.end_of_leave,
        leave_type,
        payload.special_leave_type,
        now,
    );
    if !validation.is_valid {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Leave request violates business rules",
            "details": validation.errors,
            "warnings": validation.warnings,
        })));
    }

    // Overlap against other non-terminal leaves of the same employee.
    let overlapping = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM leaves
        WHERE employee_id = ?
          AND status NOT IN ('REJECTED', 'CANCELLED', 'CLOSED')
          AND start_of_leave <= ?
          AND end_of_leave >= ?
        "#,
    )
    .bind(&payload.employee_id)
    .bind(payload.end_of_leave)
    .bind(payload.start_of_leave)
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = %payload.employee_id, "Failed to check overlaps");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if overlapping > 0 {
        return Ok(HttpResponse::Conflict().json(json!({
            "error": "Overlapping leave exists"
        })));
    }

    let employee = sqlx::query_as::<_, (Option<String>, u32)>(
        "SELECT manager_id, contract_hours FROM employees WHERE employee_id = ?",
    )
    .bind(&payload.employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = %payload.employee_id, "Failed to fetch employee");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let Some((manager_id, contract_hours)) = employee else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Employee not found"
        })));
    };

    let total_hours = rules.working_hours_between(payload.start_of_leave, payload.end_of_leave);
    let year = payload.start_of_leave.year();

    match leave_type {
        LeaveType::Regular => {
            let balance = ensure_balance(
                pool.get_ref(),
                rules.get_ref(),
                &payload.employee_id,
                contract_hours,
                year,
            )
            .await
            .map_err(|e| {
                error!(error = %e, employee_id = %payload.employee_id, year, "Failed to load balance");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

            let used_hours = approved_hours_in_year(pool.get_ref(), &payload.employee_id, year)
                .await
                .map_err(|e| {
                    error!(error = %e, employee_id = %payload.employee_id, year, "Failed to sum approved leaves");
                    actix_web::error::ErrorInternalServerError("Internal Server Error")
                })?;

            let remaining_hours = balance.total_hours - used_hours;
            if total_hours > remaining_hours {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "error": "Insufficient leave balance",
                    "details": [format!(
                        "Requested {total_hours} hours but only {remaining_hours} hours remain for {year}"
                    )],
                })));
            }
        }
        LeaveType::Special => {
            // validate() guarantees the subtype is present for SPECIAL leaves
            let Some(special_leave_type) = payload.special_leave_type else {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "error": "Special leave type is required for special leaves"
                })));
            };

            let limit = rules.special_leave_limit(special_leave_type, contract_hours);
            let used_hours = sqlx::query_scalar::<_, f64>(
                r#"
                SELECT COALESCE(SUM(used_hours), 0)
                FROM special_leave_usage
                WHERE employee_id = ? AND year = ? AND special_leave_type = ?
                "#,
            )
            .bind(&payload.employee_id)
            .bind(year)
            .bind(special_leave_type)
            .fetch_one(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, employee_id = %payload.employee_id, year, "Failed to fetch special leave usage");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

            if used_hours + total_hours > f64::from(limit.max_hours) {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "error": "Special leave limit exceeded",
                    "details": [format!(
                        "{special_leave_type} allows {} hours per year, {used_hours} already used",
                        limit.max_hours
                    )],
                })));
            }
        }
    }

    let leave_id = Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO leaves
            (leave_id, leave_label, employee_id, start_of_leave, end_of_leave,
             approver_id, status, leave_type, special_leave_type, total_hours)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&leave_id)
    .bind(payload.leave_label.trim())
    .bind(&payload.employee_id)
    .bind(payload.start_of_leave)
    .bind(payload.end_of_leave)
    .bind(&manager_id)
    .bind(LeaveStatus::Requested)
    .bind(leave_type)
    .bind(payload.special_leave_type)
    .bind(total_hours)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id = %payload.employee_id, "Failed to create leave");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let leave = fetch_leave_with_names(pool.get_ref(), &leave_id)
        .await
        .map_err(|e| {
            error!(error = %e, %leave_id, "Failed to fetch created leave");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Internal Server Error"))?;

    Ok(HttpResponse::Created().json(leave))
}

#[derive(sqlx::FromRow)]
struct LeaveForApproval {
    #[sqlx(flatten)]
    leave: Leave,
    manager_id: Option<String>,
}

/// An approval books special-leave usage exactly once; a repeated APPROVED
/// transition on an already-approved leave must not book again.
fn books_special_usage(current: LeaveStatus, next: LeaveStatus, leave_type: LeaveType) -> bool {
    leave_type == LeaveType::Special
        && next == LeaveStatus::Approved
        && current != LeaveStatus::Approved
}

/// Approve, reject or close a leave
///
/// Only the employee's direct manager may change the status. Approving a
/// special leave books its hours onto the per-type usage row.
#[utoipa::path(
    patch,
    path = "/api/leaves/{leave_id}/status",
    params(
        ("leave_id" = String, Path, description = "Leave id")
    ),
    request_body = UpdateLeaveStatus,
    responses(
        (status = 200, description = "Updated leave", body = LeaveWithNames),
        (status = 400, description = "Invalid status value"),
        (status = 403, description = "Approver is not the employee's manager"),
        (status = 404, description = "Leave not found")
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<UpdateLeaveStatus>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let Ok(status) = LeaveStatus::from_str(&payload.status) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Invalid status value"
        })));
    };

    let row = sqlx::query_as::<_, LeaveForApproval>(
        r#"
        SELECT l.*, e.manager_id AS manager_id
        FROM leaves l
        LEFT JOIN employees e ON e.employee_id = l.employee_id
        WHERE l.leave_id = ?
        "#,
    )
        .bind(&leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %leave_id, "Failed to fetch leave for status update");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(row) = row else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Leave not found"
        })));
    };

    if row.manager_id.as_deref() != Some(payload.approver_id.as_str()) {
        return Ok(HttpResponse::Forbidden().json(json!({
            "error": "Approver not authorized for this leave"
        })));
    }

    // The approver is recorded only on approval; other transitions keep the
    // previously assigned approver.
    let approver_id = if status == LeaveStatus::Approved {
        Some(payload.approver_id.clone())
    } else {
        row.leave.approver_id.clone()
    };

    sqlx::query("UPDATE leaves SET status = ?, approver_id = ? WHERE leave_id = ?")
        .bind(status)
        .bind(&approver_id)
        .bind(&leave_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %leave_id, "Failed to update leave status");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if books_special_usage(row.leave.status, status, row.leave.leave_type) {
        if let Some(special_leave_type) = row.leave.special_leave_type {
            let year = row.leave.start_of_leave.year();
            let days = (row.leave.total_hours / 8.0).round() as i64;

            sqlx::query(
                r#"
                INSERT INTO special_leave_usage
                    (employee_id, year, special_leave_type, used_days, used_hours)
                VALUES (?, ?, ?, ?, ?)
                ON DUPLICATE KEY UPDATE
                    used_days = used_days + VALUES(used_days),
                    used_hours = used_hours + VALUES(used_hours)
                "#,
            )
            .bind(&row.leave.employee_id)
            .bind(year)
            .bind(special_leave_type)
            .bind(days)
            .bind(row.leave.total_hours)
            .execute(pool.get_ref())
            .await
            .map_err(|e| {
                error!(error = %e, %leave_id, "Failed to book special leave usage");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;
        }
    }

    let leave = fetch_leave_with_names(pool.get_ref(), &leave_id)
        .await
        .map_err(|e| {
            error!(error = %e, %leave_id, "Failed to fetch updated leave");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Internal Server Error"))?;

    Ok(HttpResponse::Ok().json(leave))
}

/// Delete a leave request
///
/// Only the owning employee may delete, and only while the leave has not
/// started and is not approved.
#[utoipa::path(
    delete,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = String, Path, description = "Leave id")
    ),
    request_body = DeleteLeave,
    responses(
        (status = 204, description = "Leave deleted"),
        (status = 400, description = "Leave is approved"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave not found or already started")
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    payload: web::Json<DeleteLeave>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = sqlx::query_as::<_, Leave>("SELECT * FROM leaves WHERE leave_id = ?")
        .bind(&leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %leave_id, "Failed to fetch leave for delete");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(leave) = leave else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Leave not found"
        })));
    };

    if leave.employee_id != payload.employee_id {
        return Ok(HttpResponse::Forbidden().json(json!({
            "error": "Not authorized to delete this leave"
        })));
    }

    if leave.start_of_leave <= Local::now().naive_local() {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Cannot delete leave that has started or passed"
        })));
    }

    if leave.status == LeaveStatus::Approved {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Cannot delete an approved leave. Please contact your manager to cancel it."
        })));
    }

    if leave.status.is_terminal() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "Cannot delete a leave that has already been finalized"
        })));
    }

    sqlx::query("DELETE FROM leaves WHERE leave_id = ?")
        .bind(&leave_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %leave_id, "Failed to delete leave");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::books_special_usage;
    use crate::model::leave::{LeaveStatus, LeaveType};

    #[test]
    fn first_approval_books_special_usage() {
        assert!(books_special_usage(
            LeaveStatus::Requested,
            LeaveStatus::Approved,
            LeaveType::Special
        ));
    }

    #[test]
    fn repeated_approval_books_nothing() {
        assert!(!books_special_usage(
            LeaveStatus::Approved,
            LeaveStatus::Approved,
            LeaveType::Special
        ));
    }

    #[test]
    fn regular_leaves_and_non_approval_transitions_book_nothing() {
        assert!(!books_special_usage(
            LeaveStatus::Requested,
            LeaveStatus::Approved,
            LeaveType::Regular
        ));
        assert!(!books_special_usage(
            LeaveStatus::Requested,
            LeaveStatus::Rejected,
            LeaveType::Special
        ));
        assert!(!books_special_usage(
            LeaveStatus::Approved,
            LeaveStatus::Closed,
            LeaveType::Special
        ));
    }
}
