use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::types::Schedule;

/// Compute the next UTC execution time for `schedule` strictly after `from`.
///
/// Returns `None` only for a `Daily` time that does not exist (out-of-range
/// hour or minute); [`Schedule::validate`] rejects those up front.
pub fn compute_next_run(schedule: &Schedule, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match schedule {
        Schedule::Interval { every_secs } => {
            let secs = i64::try_from(*every_secs).ok()?;
            Some(from + Duration::seconds(secs.max(1)))
        }

        Schedule::Daily { hour, minute } => {
            let candidate = Utc
                .with_ymd_and_hms(
                    from.year(),
                    from.month(),
                    from.day(),
                    u32::from(*hour),
                    u32::from(*minute),
                    0,
                )
                .single()?;
            if candidate > from {
                Some(candidate)
            } else {
                Some(candidate + Duration::days(1))
            }
        }
    }
}
