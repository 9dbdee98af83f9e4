mod log_level;
mod on_error;

pub use log_level::LogLevel;
pub use on_error::OnError;
