pub mod attendance;

pub use attendance::Attendance;
