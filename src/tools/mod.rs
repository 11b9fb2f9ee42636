use self::error::{ErrorKind, FluteError, Result};
use std::time::SystemTime;

/// Handle errors
pub mod error;

const NTP_UNIX_OFFSET: u64 = 2208988800;

/// Convert a `SystemTime` to seconds since the NTP epoch.
pub fn system_time_to_ntp_seconds(time: SystemTime) -> Result<u64> {
    let duration = time
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|_| FluteError::new(ErrorKind::MalformedFdt, "Fail to get UNIX time"))?;
    Ok(duration.as_secs() + NTP_UNIX_OFFSET)
}

/// Convert seconds since the NTP epoch to a `SystemTime`.
pub fn ntp_seconds_to_system_time(seconds_ntp: u64) -> SystemTime {
    let seconds_utc = seconds_ntp.saturating_sub(NTP_UNIX_OFFSET);
    std::time::UNIX_EPOCH + std::time::Duration::from_secs(seconds_utc)
}
