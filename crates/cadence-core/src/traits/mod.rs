//! Traits at the seams of the dashboard.

mod schedule_service;

#[cfg(test)]
pub use schedule_service::MockScheduleService;
pub use schedule_service::{RetrainStatus, ScheduleService, ScheduleUpdate};
