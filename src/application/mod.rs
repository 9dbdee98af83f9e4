mod application_impl;
pub mod data;
mod runtime_config;
mod scheduler;

pub use application_impl::{Application, ApplicationError};
pub use runtime_config::{ArgumentError, RuntimeConfig};
pub use scheduler::{Scheduler, SchedulerError};
