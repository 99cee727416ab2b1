//! Calendar-aware time handling for CF-style time coordinates.
//!
//! Time coordinates are stored as numbers relative to an epoch, described by a
//! units string such as `"days since 1900-01-01 00:00:00"` and interpreted under a
//! calendar attribute. Only the standard calendar can be expressed with `chrono`
//! types, so dates are carried around as [`CalendarDate`] and converted to day
//! numbers per calendar.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Cumulative day counts at the start of each month for a 365-day year.
const NO_LEAP_CUMULATIVE: [u32; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];

const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalendarError {
    #[error("Invalid time units: {0}")]
    InvalidUnits(String),

    #[error("Unknown calendar: {0}")]
    UnknownCalendar(String),

    #[error("Invalid date {date} for calendar {calendar}")]
    InvalidDate { date: String, calendar: String },

    #[error("Invalid date format: {0}")]
    InvalidFormat(String),

    #[error("Invalid window length: {0}")]
    InvalidLength(String),

    #[error("Time value {0} cannot be converted to a date")]
    OutOfRange(f64),
}

/// Calendars supported for time coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Calendar {
    /// Proleptic gregorian calendar (`standard`, `gregorian`).
    #[default]
    Standard,
    /// Twelve months of 30 days (`360_day`).
    Day360,
    /// Gregorian month lengths with February fixed at 28 days (`365_day`, `no_leap`).
    NoLeap,
}

impl Calendar {
    /// Parse a CF `calendar` attribute value (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, CalendarError> {
        match s.trim().to_lowercase().as_str() {
            "" | "standard" | "gregorian" | "proleptic_gregorian" => Ok(Calendar::Standard),
            "360_day" => Ok(Calendar::Day360),
            "365_day" | "noleap" | "no_leap" => Ok(Calendar::NoLeap),
            _ => Err(CalendarError::UnknownCalendar(s.to_string())),
        }
    }

    /// Resolve an optional attribute value, defaulting to the standard calendar.
    pub fn from_attribute(value: Option<&str>) -> Result<Self, CalendarError> {
        value.map(Calendar::parse).unwrap_or(Ok(Calendar::Standard))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Calendar::Standard => "standard",
            Calendar::Day360 => "360_day",
            Calendar::NoLeap => "365_day",
        }
    }

    pub fn is_leap_year(&self, year: i32) -> bool {
        match self {
            Calendar::Standard => (year % 4 == 0 && year % 100 != 0) || year % 400 == 0,
            Calendar::Day360 | Calendar::NoLeap => false,
        }
    }

    /// Number of days in a month. Months above 12 roll into following years.
    pub fn days_in_month(&self, year: i32, month: u32) -> u32 {
        // The month alone decides the length once the year no longer fits.
        let (year, month) =
            normalize_month(year, month).unwrap_or((year, (month.max(1) - 1) % 12 + 1));
        match self {
            Calendar::Day360 => 30,
            Calendar::NoLeap => MONTH_LENGTHS[(month - 1) as usize],
            Calendar::Standard => {
                if month == 2 && self.is_leap_year(year) {
                    29
                } else {
                    MONTH_LENGTHS[(month - 1) as usize]
                }
            }
        }
    }

    /// Day ordinal of a date within this calendar.
    fn day_number(&self, year: i32, month: u32, day: u32) -> Option<i64> {
        if !(1..=12).contains(&month) || day == 0 || day > self.days_in_month(year, month) {
            return None;
        }
        match self {
            Calendar::Standard => NaiveDate::from_ymd_opt(year, month, day)
                .map(|d| d.num_days_from_ce() as i64),
            Calendar::Day360 => {
                Some(year as i64 * 360 + (month as i64 - 1) * 30 + (day as i64 - 1))
            }
            Calendar::NoLeap => Some(
                year as i64 * 365
                    + NO_LEAP_CUMULATIVE[(month - 1) as usize] as i64
                    + (day as i64 - 1),
            ),
        }
    }

    /// Inverse of `day_number`.
    fn from_day_number(&self, n: i64) -> Option<(i32, u32, u32)> {
        match self {
            Calendar::Standard => {
                let days = i32::try_from(n).ok()?;
                NaiveDate::from_num_days_from_ce_opt(days).map(|d| (d.year(), d.month(), d.day()))
            }
            Calendar::Day360 => {
                let year = i32::try_from(n.div_euclid(360)).ok()?;
                let rem = n.rem_euclid(360) as u32;
                Some((year, rem / 30 + 1, rem % 30 + 1))
            }
            Calendar::NoLeap => {
                let year = i32::try_from(n.div_euclid(365)).ok()?;
                let rem = n.rem_euclid(365) as u32;
                let month_index = NO_LEAP_CUMULATIVE
                    .iter()
                    .rposition(|&start| start <= rem)
                    .unwrap_or(0);
                Some((
                    year,
                    month_index as u32 + 1,
                    rem - NO_LEAP_CUMULATIVE[month_index] + 1,
                ))
            }
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize_month(year: i32, month: u32) -> Option<(i32, u32)> {
    let zero_based = month.max(1) - 1;
    let year = year.checked_add(i32::try_from(zero_based / 12).ok()?)?;
    Some((year, zero_based % 12 + 1))
}

/// A calendar-agnostic broken-down date and time.
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl CalendarDate {
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self::ymd_hms(year, month, day, 0, 0, 0)
    }

    pub fn ymd_h(year: i32, month: u32, day: u32, hour: u32) -> Self {
        Self::ymd_hms(year, month, day, hour, 0, 0)
    }

    pub fn ymd_hms(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Parse `YYYY-MM-DD[ T]HH:MM[:SS[.fff]][Z]`, ignoring a trailing zone token.
    pub fn parse(s: &str) -> Result<Self, CalendarError> {
        let invalid = || CalendarError::InvalidFormat(s.to_string());

        let trimmed = s.trim();
        let (date_part, rest) = match trimmed.find(|c: char| c == 'T' || c.is_whitespace()) {
            Some(pos) => (&trimmed[..pos], trimmed[pos + 1..].trim()),
            None => (trimmed, ""),
        };

        let fields: Vec<&str> = date_part.split('-').collect();
        if fields.len() != 3 {
            return Err(invalid());
        }
        let year: i32 = fields[0].parse().map_err(|_| invalid())?;
        let month: u32 = fields[1].parse().map_err(|_| invalid())?;
        let day: u32 = fields[2].parse().map_err(|_| invalid())?;

        let (mut hour, mut minute, mut second) = (0, 0, 0);
        if let Some(time_part) = rest.split_whitespace().next() {
            let time_part = time_part.trim_end_matches('Z');
            if time_part.contains(':') {
                let hms: Vec<&str> = time_part.split(':').collect();
                hour = hms[0].parse().map_err(|_| invalid())?;
                minute = hms
                    .get(1)
                    .map(|m| m.parse())
                    .transpose()
                    .map_err(|_| invalid())?
                    .unwrap_or(0);
                let secs: f64 = hms
                    .get(2)
                    .map(|v| v.parse())
                    .transpose()
                    .map_err(|_| invalid())?
                    .unwrap_or(0.0);
                second = secs.floor() as u32;
            } else if !time_part.eq_ignore_ascii_case("utc") {
                return Err(invalid());
            }
        }

        if !(1..=12).contains(&month) || !(1..=31).contains(&day) || hour > 23 || minute > 59 || second > 60 {
            return Err(invalid());
        }

        Ok(Self::ymd_hms(year, month, day, hour, minute, second))
    }

    /// Check that the date exists in the given calendar.
    pub fn validate(&self, calendar: Calendar) -> Result<(), CalendarError> {
        if calendar.day_number(self.year, self.month, self.day).is_none()
            || self.hour > 23
            || self.minute > 59
            || self.second > 59
        {
            return Err(CalendarError::InvalidDate {
                date: self.to_string(),
                calendar: calendar.name().to_string(),
            });
        }
        Ok(())
    }

    /// Seconds since the calendar's day zero.
    fn absolute_seconds(&self, calendar: Calendar) -> Result<i64, CalendarError> {
        self.validate(calendar)?;
        let day = calendar
            .day_number(self.year, self.month, self.day)
            .ok_or_else(|| CalendarError::InvalidDate {
                date: self.to_string(),
                calendar: calendar.name().to_string(),
            })?;
        Ok(day * SECONDS_PER_DAY
            + self.hour as i64 * 3600
            + self.minute as i64 * 60
            + self.second as i64)
    }

    fn from_absolute_seconds(total: i64, calendar: Calendar) -> Option<Self> {
        let day = total.div_euclid(SECONDS_PER_DAY);
        let seconds_of_day = total.rem_euclid(SECONDS_PER_DAY) as u32;
        let (year, month, dom) = calendar.from_day_number(day)?;
        Some(Self::ymd_hms(
            year,
            month,
            dom,
            seconds_of_day / 3600,
            (seconds_of_day % 3600) / 60,
            seconds_of_day % 60,
        ))
    }

    /// Shift by whole days within the calendar.
    pub fn add_days(&self, days: i64, calendar: Calendar) -> Result<Self, CalendarError> {
        let total = self.absolute_seconds(calendar)? + days * SECONDS_PER_DAY;
        Self::from_absolute_seconds(total, calendar).ok_or(CalendarError::OutOfRange(days as f64))
    }

    /// Shift by whole months, carrying overflowing days into the following months.
    ///
    /// Fails with [`CalendarError::InvalidLength`] when the year leaves the `i32` range.
    pub fn add_months(&self, months: u32, calendar: Calendar) -> Result<Self, CalendarError> {
        let overflow = || CalendarError::InvalidLength(format!("{} months", months));
        let month = self.month.checked_add(months).ok_or_else(overflow)?;
        let (year, month) = normalize_month(self.year, month).ok_or_else(overflow)?;
        Self::normalized(year, month, self.day, self, calendar).ok_or_else(overflow)
    }

    /// Shift by whole years, carrying overflowing days into the following months.
    ///
    /// Fails with [`CalendarError::InvalidLength`] when the year leaves the `i32` range.
    pub fn add_years(&self, years: i32, calendar: Calendar) -> Result<Self, CalendarError> {
        let overflow = || CalendarError::InvalidLength(format!("{} years", years));
        let year = self.year.checked_add(years).ok_or_else(overflow)?;
        Self::normalized(year, self.month, self.day, self, calendar).ok_or_else(overflow)
    }

    fn normalized(year: i32, month: u32, day: u32, time: &Self, calendar: Calendar) -> Option<Self> {
        let (mut year, mut month, mut day) = (year, month, day);
        loop {
            let length = calendar.days_in_month(year, month);
            if day <= length {
                break;
            }
            day -= length;
            (year, month) = normalize_month(year, month + 1)?;
        }
        Some(Self::ymd_hms(year, month, day, time.hour, time.minute, time.second))
    }

    /// Convert to a chrono datetime when the date exists in the standard calendar.
    pub fn to_naive_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_opt(self.hour, self.minute, self.second)
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl From<NaiveDateTime> for CalendarDate {
    fn from(dt: NaiveDateTime) -> Self {
        Self::ymd_hms(
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
    }
}

impl From<DateTime<Utc>> for CalendarDate {
    fn from(dt: DateTime<Utc>) -> Self {
        dt.naive_utc().into()
    }
}

/// Unit of a CF time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => Some(TimeUnit::Seconds),
            "minutes" | "minute" | "mins" | "min" => Some(TimeUnit::Minutes),
            "hours" | "hour" | "hrs" | "hr" | "h" => Some(TimeUnit::Hours),
            "days" | "day" | "d" => Some(TimeUnit::Days),
            _ => None,
        }
    }

    pub fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Hours => 3600.0,
            TimeUnit::Days => 86_400.0,
        }
    }
}

/// Parsed `"<unit> since <epoch>"` time units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub epoch: CalendarDate,
}

impl TimeUnits {
    pub fn new(unit: TimeUnit, epoch: CalendarDate) -> Self {
        Self { unit, epoch }
    }

    pub fn parse(s: &str) -> Result<Self, CalendarError> {
        let invalid = || CalendarError::InvalidUnits(s.to_string());

        let mut tokens = s.split_whitespace();
        let unit = tokens.next().and_then(TimeUnit::parse).ok_or_else(invalid)?;
        match tokens.next() {
            Some(word) if word.eq_ignore_ascii_case("since") => {}
            _ => return Err(invalid()),
        }
        let epoch_str = tokens.collect::<Vec<_>>().join(" ");
        let epoch = CalendarDate::parse(&epoch_str).map_err(|_| invalid())?;
        Ok(Self { unit, epoch })
    }

    /// Encode a date as a number in these units (CF `date2num`).
    pub fn encode(&self, date: &CalendarDate, calendar: Calendar) -> Result<f64, CalendarError> {
        let offset = date.absolute_seconds(calendar)? - self.epoch.absolute_seconds(calendar)?;
        Ok(offset as f64 / self.unit.seconds())
    }

    /// Decode a number in these units to a date (CF `num2date`), rounded to the second.
    pub fn decode(&self, value: f64, calendar: Calendar) -> Result<CalendarDate, CalendarError> {
        if !value.is_finite() {
            return Err(CalendarError::OutOfRange(value));
        }
        let offset = (value * self.unit.seconds()).round();
        if offset.abs() > i64::MAX as f64 / 2.0 {
            return Err(CalendarError::OutOfRange(value));
        }
        let total = self.epoch.absolute_seconds(calendar)? + offset as i64;
        CalendarDate::from_absolute_seconds(total, calendar).ok_or(CalendarError::OutOfRange(value))
    }

    /// Decode a sequence of values.
    pub fn decode_all(
        &self,
        values: &[f64],
        calendar: Calendar,
    ) -> Result<Vec<CalendarDate>, CalendarError> {
        values.iter().map(|v| self.decode(*v, calendar)).collect()
    }
}

impl fmt::Display for TimeUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        };
        let e = &self.epoch;
        write!(
            f,
            "{} since {:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            unit, e.year, e.month, e.day, e.hour, e.minute, e.second
        )
    }
}
