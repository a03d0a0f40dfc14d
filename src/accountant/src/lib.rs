pub mod accountant;
pub mod message;
pub mod value;

pub use accountant::{log_path, Accountant};
pub use message::{AccountantMessage, AccountantStatus, SenderId};
pub use value::{MetricValue, PerformanceReport, PerformanceSample, Report};
