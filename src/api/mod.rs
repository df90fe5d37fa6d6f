pub mod attendance;
pub mod coach;
pub mod payroll;
pub mod pt_session;
pub mod pt_subscription;
pub mod skill;
pub mod student;
