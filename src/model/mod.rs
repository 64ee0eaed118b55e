pub mod employee;
pub mod leave;
pub mod leave_balance;
pub mod special_leave;
