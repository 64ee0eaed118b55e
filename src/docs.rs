use crate::api::balance::BalanceQuery;
use crate::api::employee::{CreateEmployee, EmployeeWithManager, SubordinateSummary};
use crate::api::leave::{CreateLeave, DeleteLeave, LeaveWithNames, UpdateLeaveStatus};
use crate::auth::directory::DirectoryUser;
use crate::auth::handlers::LoginRequest;
use crate::model::employee::{Employee, EmployeeSummary};
use crate::model::leave::{Leave, LeaveStatus, LeaveType, SpecialLeaveType};
use crate::model::leave_balance::{LeaveBalance, LeaveBalanceResponse};
use crate::model::special_leave::{SpecialLeaveUsage, SpecialLeaveUsageResponse};
use crate::rules::ValidationResult;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management System

Employees submit time-off requests, managers approve or reject them, and the
system tracks per-employee leave balances across regular and special leave
categories.

### 🔹 Key Features
- **Leave Requests**
  - Submit, approve/reject/close, and delete leave requests
  - Business-rule validation: working days and hours, public holidays,
    advance notice for special leave
- **Balances**
  - Pro-rata annual entitlement from contract hours
  - Per-type special leave caps (moving, wedding, child birth, parental care)
- **Employees**
  - Manager/subordinate hierarchy, mock login directory

### 📦 Response Format
- JSON-based RESTful responses
- Validation failures return the complete list of violations in one pass

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::employee_leaves,
        crate::api::leave::manager_leaves,
        crate::api::leave::create_leave,
        crate::api::leave::update_leave_status,
        crate::api::leave::delete_leave,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::list_employees,
        crate::api::employee::get_subordinates,

        crate::api::balance::get_employee_balance,
        crate::api::special_leave::get_special_leave_usage,

        crate::auth::handlers::login,
        crate::auth::handlers::logout
    ),
    components(
        schemas(
            Employee,
            EmployeeSummary,
            EmployeeWithManager,
            SubordinateSummary,
            CreateEmployee,
            Leave,
            LeaveStatus,
            LeaveType,
            SpecialLeaveType,
            LeaveWithNames,
            CreateLeave,
            UpdateLeaveStatus,
            DeleteLeave,
            LeaveBalance,
            LeaveBalanceResponse,
            BalanceQuery,
            SpecialLeaveUsage,
            SpecialLeaveUsageResponse,
            ValidationResult,
            DirectoryUser,
            LoginRequest
        )
    ),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Balance", description = "Leave balance and special leave usage APIs"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Auth", description = "Mock authentication APIs"),
    )
)]
pub struct ApiDoc;
