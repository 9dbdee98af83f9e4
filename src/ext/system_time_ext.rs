use std::{sync::OnceLock, time::SystemTime};

use time::{
    OffsetDateTime, UtcOffset, format_description::BorrowedFormatItem, macros::format_description,
};
use tracing::warn;

const LOG_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

pub trait SystemTimeExt {
    /// Converts to the local wall clock, or UTC when the local offset is unknown.
    fn to_local_datetime(&self) -> OffsetDateTime;

    /// `YYYY-MM-DD HH:MM:SS` in local time.
    fn to_log_timestamp(&self) -> String;
}

/// The local offset is looked up once per process and reused afterwards.
fn local_offset() -> UtcOffset {
    static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();
    *LOCAL_OFFSET.get_or_init(|| offset_or_utc(UtcOffset::current_local_offset().ok()))
}

fn offset_or_utc(offset: Option<UtcOffset>) -> UtcOffset {
    offset.unwrap_or_else(|| {
        warn!("Cannot determine the local UTC offset, timestamps are written in UTC");
        UtcOffset::UTC
    })
}

impl SystemTimeExt for SystemTime {
    fn to_local_datetime(&self) -> OffsetDateTime {
        OffsetDateTime::from(*self).to_offset(local_offset())
    }

    fn to_log_timestamp(&self) -> String {
        let datetime = self.to_local_datetime();
        datetime
            .format(LOG_TIMESTAMP_FORMAT)
            .unwrap_or_else(|_| datetime.to_string())
    }
}
