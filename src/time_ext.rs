use std::time::Duration as StdDuration;

pub(crate) trait StdDurationExt {
    /// Saturates at `time::Duration::MAX` for durations not representable as a signed duration.
    fn to_time_duration(self) -> time::Duration;
}

impl StdDurationExt for StdDuration {
    fn to_time_duration(self) -> time::Duration {
        time::Duration::try_from(self).unwrap_or(time::Duration::MAX)
    }
}
