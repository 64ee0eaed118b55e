pub mod balance;
pub mod employee;
pub mod leave;
pub mod special_leave;
