//! Temporary URL expiration / 临时URL过期时间
//!
//! Callers may express an expiration as an absolute time-point, as a string
//! that parses into one, or as a number of seconds from now. Adapters only
//! ever see the normalized deadline.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiration {
    /// Absolute time-point / 绝对时间点
    At(DateTime<Utc>),
    /// Parseable time-point, e.g. `2030-01-01 08:00:00` or `+1 hour` / 可解析的时间字符串
    Text(String),
    /// Seconds from now / 相对秒数
    Seconds(u64),
}

impl From<DateTime<Utc>> for Expiration {
    fn from(value: DateTime<Utc>) -> Self {
        Expiration::At(value)
    }
}

impl From<u64> for Expiration {
    fn from(value: u64) -> Self {
        Expiration::Seconds(value)
    }
}

impl From<&str> for Expiration {
    fn from(value: &str) -> Self {
        Expiration::Text(value.to_string())
    }
}

impl From<String> for Expiration {
    fn from(value: String) -> Self {
        Expiration::Text(value)
    }
}

impl From<std::time::Duration> for Expiration {
    fn from(value: std::time::Duration) -> Self {
        Expiration::Seconds(value.as_secs())
    }
}

impl Expiration {
    /// Absolute deadline relative to `now` / 计算截止时间
    pub fn deadline(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        let deadline = match self {
            Expiration::At(at) => *at,
            Expiration::Text(text) => parse_time(text, now)?,
            Expiration::Seconds(secs) => {
                let delta = i64::try_from(*secs)
                    .ok()
                    .and_then(TimeDelta::try_seconds)
                    .ok_or_else(|| format!("expiration too large: {}", secs))?;
                now.checked_add_signed(delta)
                    .ok_or_else(|| format!("expiration too large: {}", secs))?
            }
        };
        if deadline <= now {
            return Err(format!("expiration {} is not in the future", deadline.to_rfc3339()));
        }
        Ok(deadline)
    }

    /// Whole seconds between `now` and the deadline / 距截止时间的秒数
    pub fn seconds_from(&self, now: DateTime<Utc>) -> Result<u64, String> {
        let deadline = self.deadline(now)?;
        Ok((deadline.timestamp() - now.timestamp()).max(0) as u64)
    }
}

fn parse_time(text: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let text = text.trim();

    if let Some(relative) = text.strip_prefix('+') {
        let delta = parse_relative(relative)?;
        return now
            .checked_add_signed(delta)
            .ok_or_else(|| format!("expiration out of range: {}", text));
    }
    if let Some(ts) = text.strip_prefix('@') {
        let ts: i64 = ts.parse().map_err(|_| format!("invalid timestamp: {}", text))?;
        return Utc
            .timestamp_opt(ts, 0)
            .single()
            .ok_or_else(|| format!("invalid timestamp: {}", text));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(format!("unable to parse expiration: {}", text))
}

/// `30 minutes`, `1 hour`, `2 days` ...
fn parse_relative(text: &str) -> Result<TimeDelta, String> {
    let mut parts = text.split_whitespace();
    let (Some(amount), Some(unit), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(format!("invalid relative expiration: +{}", text));
    };
    let amount: i64 = amount
        .parse()
        .map_err(|_| format!("invalid relative expiration: +{}", text))?;

    let unit = unit.to_ascii_lowercase();
    let delta = match unit.trim_end_matches('s') {
        "sec" | "second" => TimeDelta::try_seconds(amount),
        "min" | "minute" => TimeDelta::try_minutes(amount),
        "hour" => TimeDelta::try_hours(amount),
        "day" => TimeDelta::try_days(amount),
        "week" => TimeDelta::try_weeks(amount),
        _ => return Err(format!("unknown time unit: {}", unit)),
    };
    delta.ok_or_else(|| format!("relative expiration out of range: +{}", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_equivalent_forms_share_deadline() {
        let at = Expiration::At(Utc.with_ymd_and_hms(2030, 1, 1, 1, 0, 0).unwrap());
        let text = Expiration::from("2030-01-01 01:00:00");
        let rfc = Expiration::from("2030-01-01T09:00:00+08:00");
        let relative = Expiration::from("+1 hour");
        let secs = Expiration::Seconds(3600);

        let expected = at.deadline(now()).unwrap();
        for e in [text, rfc, relative, secs] {
            assert_eq!(e.deadline(now()).unwrap(), expected, "{:?}", e);
        }
        assert_eq!(at.seconds_from(now()).unwrap(), 3600);
    }

    #[test]
    fn test_past_and_garbage_rejected() {
        assert!(Expiration::from("2029-12-31").deadline(now()).is_err());
        assert!(Expiration::Seconds(0).deadline(now()).is_err());
        assert!(Expiration::from("tomorrow-ish").deadline(now()).is_err());
        assert!(Expiration::from("+3 fortnights").deadline(now()).is_err());
    }

    #[test]
    fn test_out_of_range_is_error() {
        let huge = Expiration::Seconds(i64::MAX as u64).deadline(now());
        assert!(huge.unwrap_err().contains("too large"));
        assert!(Expiration::Seconds(u64::MAX).deadline(now()).is_err());
        assert!(Expiration::Seconds(400_000_000_000_000).deadline(now()).is_err());
        assert!(Expiration::from("+99999999999999 weeks").deadline(now()).is_err());
        assert!(Expiration::from("+9223372036854775807 seconds").deadline(now()).is_err());
    }

    #[test]
    fn test_timestamp_and_date_only() {
        let ts = now().timestamp() + 60;
        assert_eq!(
            Expiration::from(format!("@{}", ts)).seconds_from(now()).unwrap(),
            60
        );
        assert_eq!(
            Expiration::from("2030-01-02").seconds_from(now()).unwrap(),
            86400
        );
        assert_eq!(Expiration::from("+90 minutes").seconds_from(now()).unwrap(), 5400);
    }
}
