pub mod billing;
pub mod invitations;
pub mod leave;
pub mod leave_days;
pub mod members;
pub mod organizations;
pub mod reconcile;
