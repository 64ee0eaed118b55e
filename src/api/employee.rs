use std::collections::HashMap;

use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

use crate::{
    model::employee::{Employee, EmployeeSummary},
    rules::LeaveRules,
};

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    #[schema(example = "K012348")]
    pub employee_id: String,
    #[schema(example = "Jane Smith")]
    pub name: String,
    #[schema(example = "K000001", nullable = true)]
    pub manager_id: Option<String>,
    #[schema(example = 40)]
    pub contract_hours: Option<u32>,
    #[schema(example = false)]
    pub is_manager: Option<bool>,
}

/// Short reference to a direct report, embedded in employee responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubordinateSummary {
    #[schema(example = "K012345")]
    pub employee_id: String,
    #[schema(example = "Mohammad Farhadi")]
    pub name: String,
}

/// Employee joined with its manager's display name and direct reports.
#[derive(Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeWithManager {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub employee: Employee,
    #[schema(example = "Velthoven Jeroen-van", nullable = true)]
    pub manager_name: Option<String>,
    #[sqlx(skip)]
    pub subordinates: Vec<SubordinateSummary>,
}

/// Employee ids are the personnel number: a `K` followed by six digits.
fn is_valid_employee_id(id: &str) -> bool {
    let mut chars = id.chars();
    id.len() == 7 && chars.next() == Some('K') && chars.all(|c| c.is_ascii_digit())
}

/// Weekly contract hours are bounded by the hours in a week.
const MAX_CONTRACT_HOURS: u32 = 168;

fn is_valid_contract_hours(hours: u32) -> bool {
    (1..=MAX_CONTRACT_HOURS).contains(&hours)
}

const EMPLOYEE_WITH_MANAGER_SQL: &str = r#"
    SELECT e.*, m.name AS manager_name
    FROM employees e
    LEFT JOIN employees m ON m.employee_id = e.manager_id
"#;

const SUBORDINATES_SQL: &str = r#"
    SELECT employee_id, name
    FROM employees
    WHERE manager_id = ?
    ORDER BY name ASC
"#;

async fn load_subordinates(
    pool: &MySqlPool,
    manager_id: &str,
) -> Result<Vec<SubordinateSummary>, sqlx::Error> {
    sqlx::query_as::<_, SubordinateSummary>(SUBORDINATES_SQL)
        .bind(manager_id)
        .fetch_all(pool)
        .await
}

#[derive(sqlx::FromRow)]
struct SubordinateRow {
    manager_id: String,
    #[sqlx(flatten)]
    summary: SubordinateSummary,
}

fn subordinates_by_manager(
    rows: Vec<SubordinateRow>,
) -> HashMap<String, Vec<SubordinateSummary>> {
    let mut grouped: HashMap<String, Vec<SubordinateSummary>> = HashMap::new();
    for row in rows {
        grouped.entry(row.manager_id).or_default().push(row.summary);
    }
    grouped
}

/// List all employees with manager name and direct reports, ordered by name
#[utoipa::path(
    get,
    path = "/api/employees",
    responses(
        (status = 200, description = "All employees", body = Vec<EmployeeWithManager>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn list_employees(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let sql = format!("{} ORDER BY e.name ASC", EMPLOYEE_WITH_MANAGER_SQL);

    let mut employees = sqlx::query_as::<_, EmployeeWithManager>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch employees");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let reports = sqlx::query_as::<_, SubordinateRow>(
        r#"
        SELECT manager_id, employee_id, name
        FROM employees
        WHERE manager_id IS NOT NULL
        ORDER BY name ASC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch direct reports");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let mut by_manager = subordinates_by_manager(reports);
    for employee in &mut employees {
        if let Some(subordinates) = by_manager.remove(&employee.employee.employee_id) {
            employee.subordinates = subordinates;
        }
    }

    Ok(HttpResponse::Ok().json(employees))
}

/// Get a single employee by id
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id" = String, Path, description = "Employee id, e.g. K012345")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeWithManager),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        }))
    ),
    tag = "Employee"
)]
pub async fn get_employee(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let sql = format!("{} WHERE e.employee_id = ?", EMPLOYEE_WITH_MANAGER_SQL);

    let employee = sqlx::query_as::<_, EmployeeWithManager>(&sql)
        .bind(&employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, "Failed to fetch employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(mut employee) = employee else {
        return Ok(HttpResponse::NotFound().json(json!({
            "error": "Employee not found"
        })));
    };

    employee.subordinates = load_subordinates(pool.get_ref(), &employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, "Failed to fetch direct reports");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(employee))
}

/// Create an employee and seed the current year's leave balance
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created", body = EmployeeWithManager),
        (status = 400, description = "Missing or malformed fields", body = Object, example = json!({
            "error": "EmployeeId must be in format K012345"
        })),
        (status = 409, description = "Duplicate employee id", body = Object, example = json!({
            "error": "Employee ID already exists"
        }))
    ),
    tag = "Employee"
)]
pub async fn create_employee(
    pool: web::Data<MySqlPool>,
    rules: web::Data<LeaveRules>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    let employee_id = payload.employee_id.trim();
    let name = payload.name.trim();

    if employee_id.is_empty() || name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "EmployeeId and name are required"
        })));
    }

    if !is_valid_employee_id(employee_id) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "EmployeeId must be in format K012345"
        })));
    }

    let contract_hours = payload.contract_hours.unwrap_or(40);
    if !is_valid_contract_hours(contract_hours) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": "contractHours must be between 1 and 168"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO employees (employee_id, name, manager_id, contract_hours, is_manager)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(name)
    .bind(&payload.manager_id)
    .bind(contract_hours)
    .bind(payload.is_manager.unwrap_or(false))
    .execute(pool.get_ref())
    .await;

    if let Err(e) = result {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some("23000") {
                return Ok(HttpResponse::Conflict().json(json!({
                    "error": "Employee ID already exists"
                })));
            }
        }
        error!(error = %e, %employee_id, "Failed to create employee");
        return Ok(HttpResponse::InternalServerError().json(json!({
            "error": "Failed to create employee"
        })));
    }

    // Seed this year's balance so the first balance query is cheap.
    let entitlement = rules.pro_rata_entitlement(contract_hours);
    let year = Local::now().year();

    sqlx::query(
        r#"
        INSERT INTO leave_balances (employee_id, year, total_days, total_hours)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(year)
    .bind(i64::from(entitlement.days))
    .bind(f64::from(entitlement.hours))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, %employee_id, year, "Failed to seed leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let sql = format!("{} WHERE e.employee_id = ?", EMPLOYEE_WITH_MANAGER_SQL);
    let mut employee = sqlx::query_as::<_, EmployeeWithManager>(&sql)
        .bind(employee_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, "Failed to fetch created employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    // Pre-existing employees may already point at the new id as their manager.
    employee.subordinates = load_subordinates(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            error!(error = %e, %employee_id, "Failed to fetch direct reports");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Created().json(employee))
}

/// List an employee's direct reports
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/subordinates",
    params(
        ("employee_id" = String, Path, description = "Manager's employee id")
    ),
    responses(
        (status = 200, description = "Direct reports", body = Vec<EmployeeSummary>),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee"
)]
pub async fn get_subordinates(
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();

    let subordinates = sqlx::query_as::<_, EmployeeSummary>(
        r#"
        SELECT employee_id, name, contract_hours
        FROM employees
        WHERE manager_id = ?
        ORDER BY name ASC
        "#,
    )
    .bind(&employee_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, %employee_id, "Failed to fetch subordinates");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(subordinates))
}

#[cfg(test)]
mod tests {
    use super::{
        EmployeeWithManager, SubordinateRow, SubordinateSummary, is_valid_contract_hours,
        is_valid_employee_id, subordinates_by_manager,
    };
    use crate::model::employee::Employee;

    #[test]
    fn employee_id_format() {
        assert!(is_valid_employee_id("K012345"));
        assert!(is_valid_employee_id("K000001"));
        assert!(!is_valid_employee_id("k012345"));
        assert!(!is_valid_employee_id("K12345"));
        assert!(!is_valid_employee_id("K0123456"));
        assert!(!is_valid_employee_id("K01234a"));
        assert!(!is_valid_employee_id(""));
    }

    #[test]
    fn contract_hours_bounds() {
        assert!(is_valid_contract_hours(1));
        assert!(is_valid_contract_hours(40));
        assert!(is_valid_contract_hours(168));
        assert!(!is_valid_contract_hours(0));
        assert!(!is_valid_contract_hours(169));
        assert!(!is_valid_contract_hours(u32::MAX));
    }

    fn summary(employee_id: &str, name: &str) -> SubordinateSummary {
        SubordinateSummary {
            employee_id: employee_id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn direct_reports_group_under_their_manager() {
        let rows = vec![
            SubordinateRow {
                manager_id: "K000001".to_string(),
                summary: summary("K012345", "Mohammad Farhadi"),
            },
            SubordinateRow {
                manager_id: "K000002".to_string(),
                summary: summary("K012346", "Eva de Vries"),
            },
            SubordinateRow {
                manager_id: "K000001".to_string(),
                summary: summary("K012347", "Pieter Bakker"),
            },
        ];

        let grouped = subordinates_by_manager(rows);

        assert_eq!(grouped["K000001"].len(), 2);
        assert_eq!(grouped["K000001"][0].employee_id, "K012345");
        assert_eq!(grouped["K000001"][1].employee_id, "K012347");
        assert_eq!(grouped["K000002"].len(), 1);
        assert!(!grouped.contains_key("K012345"));
    }

    #[test]
    fn employee_response_embeds_manager_name_and_subordinates() {
        let response = EmployeeWithManager {
            employee: Employee {
                employee_id: "K000001".to_string(),
                name: "Velthoven Jeroen-van".to_string(),
                manager_id: None,
                contract_hours: 40,
                is_manager: true,
                created_at: None,
                updated_at: None,
            },
            manager_name: None,
            subordinates: vec![summary("K012345", "Mohammad Farhadi")],
        };

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["employeeId"], "K000001");
        assert_eq!(json["managerName"], serde_json::Value::Null);
        assert_eq!(json["subordinates"][0]["employeeId"], "K012345");
        assert_eq!(json["subordinates"][0]["name"], "Mohammad Farhadi");
    }
}
