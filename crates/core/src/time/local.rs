use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

pub const UNKNOWN_DATE: &str = "unknown date";

const DATE_FORMAT: &str = "%d/%m/%Y";
const DATE_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

// Used when the configured zone name is not in the tz database.
const FALLBACK_OFFSET_SECS: i32 = -3 * 3600;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Debug, Clone, Copy)]
enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

/// Renders instants as local calendar strings in one fixed zone.
#[derive(Debug, Clone, Copy)]
pub struct LocalTime {
    zone: Zone,
}

impl LocalTime {
    pub fn named(tz: Tz) -> Self {
        Self {
            zone: Zone::Named(tz),
        }
    }

    pub fn fixed(offset: FixedOffset) -> Self {
        Self {
            zone: Zone::Fixed(offset),
        }
    }

    /// Resolves an IANA zone name, falling back to UTC-03:00 when unknown.
    pub fn from_name(name: &str) -> Self {
        match name.trim().parse::<Tz>() {
            Ok(tz) => Self::named(tz),
            Err(_) => {
                tracing::warn!(zone = name, "unknown time zone; using UTC-03:00");
                Self::fixed(fallback_offset())
            }
        }
    }

    pub fn local_date(&self, iso: Option<&str>) -> String {
        self.render(iso, DATE_FORMAT)
    }

    pub fn local_date_time(&self, iso: Option<&str>) -> String {
        self.render(iso, DATE_TIME_FORMAT)
    }

    pub fn date_of(&self, at: Option<DateTime<FixedOffset>>) -> String {
        self.format(at.unwrap_or_else(now), DATE_FORMAT)
    }

    pub fn date_time_of(&self, at: Option<DateTime<FixedOffset>>) -> String {
        self.format(at.unwrap_or_else(now), DATE_TIME_FORMAT)
    }

    fn render(&self, iso: Option<&str>, fmt: &str) -> String {
        let at = match iso {
            None => now(),
            Some(s) => match parse_instant(s) {
                Some(at) => at,
                None => {
                    tracing::warn!(input = s, "failed to parse timestamp");
                    return UNKNOWN_DATE.to_string();
                }
            },
        };
        self.format(at, fmt)
    }

    fn format(&self, at: DateTime<FixedOffset>, fmt: &str) -> String {
        match self.zone {
            Zone::Named(tz) => at.with_timezone(&tz).format(fmt).to_string(),
            Zone::Fixed(offset) => at.with_timezone(&offset).format(fmt).to_string(),
        }
    }
}

impl Default for LocalTime {
    fn default() -> Self {
        Self::named(chrono_tz::America::Recife)
    }
}

/// Parses an ISO-8601 instant. Values without an offset are taken as UTC.
pub fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Some(at);
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
}

fn now() -> DateTime<FixedOffset> {
    Utc::now().fixed_offset()
}

fn fallback_offset() -> FixedOffset {
    FixedOffset::east_opt(FALLBACK_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}
