//! Leave request repository.
//!
//! Re-exports the trait-based implementation from leave_request_repository.

pub use crate::repositories::leave_request_repository::{
    LeaveRequestRepository, LeaveRequestRepositoryTrait,
};

#[cfg(test)]
pub use crate::repositories::leave_request_repository::MockLeaveRequestRepositoryTrait;
