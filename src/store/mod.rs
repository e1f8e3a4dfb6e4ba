//! Transient client-side state for the active page.

pub mod attendance;
pub mod students;

pub use attendance::AttendanceStore;
pub use students::StudentStore;
