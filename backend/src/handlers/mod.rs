pub mod auth;
pub mod billing;
pub mod health;
pub mod invitations;
pub mod leave_balances;
pub mod leave_requests;
pub mod leave_types;
pub mod organizations;
pub mod schedules;
pub mod teams;
pub mod users;
