pub mod auth;
pub mod common;
pub mod invitation;
pub mod leave_balance;
pub mod leave_request;
pub mod leave_request_repository;
pub mod leave_type;
pub mod organization;
pub mod schedule;
pub mod seat_usage;
pub mod subscription;
pub mod team;
pub mod transaction;
pub mod user;

pub use leave_request::{LeaveRequestRepository, LeaveRequestRepositoryTrait};
pub use seat_usage::load_seat_usage;
pub use transaction::*;
