pub mod dedup;
pub mod live_status;
pub mod month;
pub mod payroll;
