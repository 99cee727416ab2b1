//! Calendar-aligned time windows and aggregation along the time axis.
//!
//! Windows start at every combination of year, month, day and hour allowed
//! by an [`OriginSpec`] and run for a [`WindowLength`] under the time
//! coordinate's calendar. Each window covers the half-open sample range
//! `start <= t < end`.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use ndarray::{ArrayD, Axis, IxDyn, Slice};
use serde::Serialize;
use tracing::{debug, info};

use cdm_common::{Calendar, CalendarDate, CalendarError, CdmResult, TimeUnits};

use crate::error::{FieldError, FieldResult};
use crate::field::Field;
use crate::reverse::time_encoding;

/// Constraints on window start times. Unset fields take every value in range:
/// the years spanned by the data, months 1 to 12 and hours 0 to 23. An unset
/// day means every day of the month for day-long windows and the first of
/// the month for month- or year-long windows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OriginSpec {
    pub years: Option<Vec<i32>>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
}

impl OriginSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(mut self, year: i32) -> Self {
        self.years = Some(vec![year]);
        self
    }

    pub fn years(mut self, years: Vec<i32>) -> Self {
        self.years = Some(years);
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn hour(mut self, hour: u32) -> Self {
        self.hour = Some(hour);
        self
    }

    fn validate(&self, calendar: Calendar) -> Result<(), CalendarError> {
        let month_ok = self.month.map_or(true, |m| (1..=12).contains(&m));
        let day_ok = self.day.map_or(true, |d| (1..=31).contains(&d));
        let hour_ok = self.hour.map_or(true, |h| h <= 23);
        if month_ok && day_ok && hour_ok {
            return Ok(());
        }
        Err(CalendarError::InvalidDate {
            date: self.to_string(),
            calendar: calendar.name().to_string(),
        })
    }
}

impl fmt::Display for OriginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(years) = &self.years {
            let years: Vec<String> = years.iter().map(i32::to_string).collect();
            parts.push(format!("year={}", years.join("/")));
        }
        if let Some(m) = self.month {
            parts.push(format!("month={}", m));
        }
        if let Some(d) = self.day {
            parts.push(format!("day={}", d));
        }
        if let Some(h) = self.hour {
            parts.push(format!("hour={}", h));
        }
        f.write_str(&parts.join(","))
    }
}

/// Parses `year=2012,month=1,day=1,hour=12`; several years are separated
/// with `/`.
impl FromStr for OriginSpec {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CalendarError::InvalidFormat(s.to_string());
        let mut spec = OriginSpec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = part.split_once('=').ok_or_else(invalid)?;
            let value = value.trim();
            match key.trim() {
                "year" | "years" => {
                    let years = value
                        .split('/')
                        .map(|y| y.trim().parse::<i32>())
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| invalid())?;
                    spec.years = Some(years);
                }
                "month" => spec.month = Some(value.parse().map_err(|_| invalid())?),
                "day" => spec.day = Some(value.parse().map_err(|_| invalid())?),
                "hour" => spec.hour = Some(value.parse().map_err(|_| invalid())?),
                _ => return Err(invalid()),
            }
        }
        Ok(spec)
    }
}

/// Unit of a window length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LengthUnit {
    Day,
    Month,
    Year,
}

/// Window length such as `"1 month"` or `"10 days"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowLength {
    pub count: u32,
    pub unit: LengthUnit,
}

impl WindowLength {
    pub fn new(count: u32, unit: LengthUnit) -> Self {
        Self { count, unit }
    }

    pub fn parse(s: &str) -> Result<Self, CalendarError> {
        let invalid = || CalendarError::InvalidLength(s.to_string());
        let mut tokens = s.split_whitespace();
        let count: u32 = tokens
            .next()
            .and_then(|t| t.parse().ok())
            .ok_or_else(invalid)?;
        let unit = match tokens.next().map(str::to_lowercase).as_deref() {
            Some("day") | Some("days") => LengthUnit::Day,
            Some("month") | Some("months") => LengthUnit::Month,
            Some("year") | Some("years") => LengthUnit::Year,
            _ => return Err(invalid()),
        };
        if count == 0 || tokens.next().is_some() {
            return Err(invalid());
        }
        Ok(Self { count, unit })
    }

    /// End of a window starting at `start`, carrying overflowing days into
    /// the following months under the calendar.
    pub fn end_of(&self, start: &CalendarDate, calendar: Calendar) -> Result<CalendarDate, CalendarError> {
        match self.unit {
            LengthUnit::Day => start.add_days(self.count as i64, calendar),
            LengthUnit::Month => start.add_months(self.count, calendar),
            LengthUnit::Year => {
                let years = i32::try_from(self.count)
                    .map_err(|_| CalendarError::InvalidLength(self.to_string()))?;
                start.add_years(years, calendar)
            }
        }
    }
}

impl Default for WindowLength {
    fn default() -> Self {
        Self::new(1, LengthUnit::Month)
    }
}

impl FromStr for WindowLength {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for WindowLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.unit {
            LengthUnit::Day => "day",
            LengthUnit::Month => "month",
            LengthUnit::Year => "year",
        };
        let plural = if self.count == 1 { "" } else { "s" };
        write!(f, "{} {}{}", self.count, unit, plural)
    }
}

/// Optional limits on window placement; default to the first and last sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBounds {
    pub after: Option<CalendarDate>,
    pub before: Option<CalendarDate>,
}

/// A window and the sample indices it covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: CalendarDate,
    pub end: CalendarDate,
    pub range: Range<usize>,
}

impl TimeWindow {
    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// Partition a sorted time axis into calendar-aligned windows.
///
/// Windows entirely outside the bounds are dropped. A window holding no
/// samples keeps an empty range positioned where its samples would go.
/// Every origin spec contributes; the result is ordered by window start. An
/// empty origin list behaves like a single unconstrained spec.
pub fn time_slices(
    times: &[f64],
    units: &TimeUnits,
    calendar: Calendar,
    origins: &[OriginSpec],
    length: &WindowLength,
    bounds: &TimeBounds,
) -> CdmResult<Vec<TimeWindow>> {
    let (first, last) = match (times.first(), times.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(Vec::new()),
    };
    let first_date = units.decode(first, calendar)?;
    let last_date = units.decode(last, calendar)?;
    let after = bounds.after.unwrap_or(first_date);
    let before = bounds.before.unwrap_or(last_date);

    let default_origin = [OriginSpec::default()];
    let origins = if origins.is_empty() {
        &default_origin[..]
    } else {
        origins
    };

    let mut windows = Vec::new();
    for origin in origins {
        origin.validate(calendar)?;
        let years = origin
            .years
            .clone()
            .unwrap_or_else(|| (first_date.year..=last_date.year).collect());
        let months: Vec<u32> = origin.month.map_or_else(|| (1..=12).collect(), |m| vec![m]);
        let hours: Vec<u32> = origin.hour.map_or_else(|| (0..=23).collect(), |h| vec![h]);

        for &year in &years {
            for &month in &months {
                let month_length = calendar.days_in_month(year, month);
                let days: Vec<u32> = match (origin.day, length.unit) {
                    (Some(day), _) => vec![day],
                    (None, LengthUnit::Day) => (1..=month_length).collect(),
                    (None, _) => vec![1],
                };
                for &day in &days {
                    if day > month_length {
                        debug!(year, month, day, calendar = %calendar, "Skipping day outside month");
                        continue;
                    }
                    for &hour in &hours {
                        let start = CalendarDate::ymd_h(year, month, day, hour);
                        let end = length.end_of(&start, calendar)?;
                        if end <= after || start > before {
                            continue;
                        }
                        let start_value = units.encode(&start, calendar)?;
                        let end_value = units.encode(&end, calendar)?;
                        let range = times.partition_point(|t| *t < start_value)
                            ..times.partition_point(|t| *t < end_value);
                        windows.push(TimeWindow { start, end, range });
                    }
                }
            }
        }
    }

    windows.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
    windows.dedup();
    debug!(windows = windows.len(), length = %length, "Computed time slices");
    Ok(windows)
}

/// Reduction applied along the time axis of each window.
#[derive(Debug, Clone, Copy)]
pub enum Reduction {
    Sum,
    Mean,
    Min,
    Max,
    Count,
    /// Custom reduction over the unmasked values; `None` marks the result missing.
    Custom(fn(&[f64]) -> Option<f64>),
}

impl Reduction {
    /// Reduce unmasked values. No values reduce to NaN.
    pub fn apply(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        match self {
            Reduction::Sum => values.iter().sum(),
            Reduction::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Reduction::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reduction::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reduction::Count => values.len() as f64,
            Reduction::Custom(f) => f(values).unwrap_or(f64::NAN),
        }
    }
}

impl FromStr for Reduction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(Reduction::Sum),
            "mean" | "avg" => Ok(Reduction::Mean),
            "min" => Ok(Reduction::Min),
            "max" => Ok(Reduction::Max),
            "count" => Ok(Reduction::Count),
            other => Err(format!("unknown reduction '{}'", other)),
        }
    }
}

/// Output of a time aggregation.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Source-shaped array with the time axis replaced by one entry per window.
    pub values: ArrayD<f64>,
    /// Time of each window's final sample, or the window start when it
    /// holds no samples.
    pub times: Vec<CalendarDate>,
    pub windows: Vec<TimeWindow>,
}

fn masked(value: f64, below: Option<f64>, above: Option<f64>) -> bool {
    value.is_nan()
        || below.map_or(false, |b| b.is_finite() && value < b)
        || above.map_or(false, |a| a.is_finite() && value > a)
}

impl<'a> Field<'a> {
    /// Position of the time axis in the field's variable.
    pub fn time_axis(&self) -> FieldResult<usize> {
        self.mapping()
            .get(cdm_common::roles::TIME)
            .and_then(|entry| entry.axes.first().copied())
            .ok_or_else(|| FieldError::MissingTimeCoordinate(self.name().to_string()))
    }

    /// Raw time coordinate values; empty without a time coordinate.
    pub fn times(&self) -> FieldResult<Vec<f64>> {
        match self.time_variable() {
            Some(var) => Ok(var.numeric_values()?.iter().copied().collect()),
            None => Ok(Vec::new()),
        }
    }

    /// Time coordinate values decoded under the variable's calendar.
    pub fn real_times(&self) -> FieldResult<Vec<CalendarDate>> {
        let var = match self.time_variable() {
            Some(var) => var,
            None => return Ok(Vec::new()),
        };
        let (units, calendar) = time_encoding(var)?;
        Ok(units.decode_all(&self.times()?, calendar)?)
    }

    pub fn time_slices(&self, origins: &[OriginSpec], length: &WindowLength) -> FieldResult<Vec<TimeWindow>> {
        self.time_slices_within(origins, length, &TimeBounds::default())
    }

    pub fn time_slices_within(
        &self,
        origins: &[OriginSpec],
        length: &WindowLength,
        bounds: &TimeBounds,
    ) -> FieldResult<Vec<TimeWindow>> {
        let var = self
            .time_variable()
            .ok_or_else(|| FieldError::MissingTimeCoordinate(self.name().to_string()))?;
        let (units, calendar) = time_encoding(var)?;
        Ok(time_slices(&self.times()?, &units, calendar, origins, length, bounds)?)
    }

    /// Reduce the field's variable over each time window.
    ///
    /// Values below `mask_below` or above `mask_above` (when finite) and NaN
    /// values are left out of the reduction.
    pub fn time_aggregation(
        &self,
        reduction: Reduction,
        origins: &[OriginSpec],
        length: &WindowLength,
        mask_below: Option<f64>,
        mask_above: Option<f64>,
    ) -> FieldResult<Aggregation> {
        let axis = self.time_axis()?;
        let windows = self.time_slices(origins, length)?;
        let source = self.variable().numeric_values()?;

        let mut shape = source.shape().to_vec();
        shape[axis] = windows.len();
        let mut values = ArrayD::from_elem(IxDyn(&shape), f64::NAN);

        for (i, window) in windows.iter().enumerate() {
            let slab = source.slice_axis(Axis(axis), Slice::from(window.range.clone()));
            let reduced = slab.map_axis(Axis(axis), |lane| {
                let kept: Vec<f64> = lane
                    .iter()
                    .copied()
                    .filter(|v| !masked(*v, mask_below, mask_above))
                    .collect();
                reduction.apply(&kept)
            });
            values.index_axis_mut(Axis(axis), i).assign(&reduced);
        }

        let times = self.times()?;
        let var = self
            .time_variable()
            .ok_or_else(|| FieldError::MissingTimeCoordinate(self.name().to_string()))?;
        let (units, calendar) = time_encoding(var)?;
        let window_times = windows
            .iter()
            .map(|w| match w.range.end.checked_sub(1) {
                Some(last) if !w.range.is_empty() => units.decode(times[last], calendar),
                _ => Ok(w.start),
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(
            field = %self.name(),
            windows = windows.len(),
            reduction = ?reduction,
            "Aggregated field over time windows"
        );
        Ok(Aggregation {
            values,
            times: window_times,
            windows,
        })
    }

    /// Samples of the field's variable falling in any window, in window
    /// order, with their decoded times.
    pub fn time_subset(
        &self,
        origins: &[OriginSpec],
        length: &WindowLength,
    ) -> FieldResult<(ArrayD<f64>, Vec<CalendarDate>)> {
        let axis = self.time_axis()?;
        let windows = self.time_slices(origins, length)?;
        let indices: Vec<usize> = windows.iter().flat_map(|w| w.range.clone()).collect();
        let source = self.variable().numeric_values()?;
        let subset = source.select(Axis(axis), &indices);

        let real_times = self.real_times()?;
        let times = indices.iter().map(|i| real_times[*i]).collect();
        Ok((subset, times))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdm_common::TimeUnit;

    fn daily_units() -> TimeUnits {
        TimeUnits::new(TimeUnit::Days, CalendarDate::ymd(2000, 1, 1))
    }

    #[test]
    fn test_window_length_parse() {
        assert_eq!(WindowLength::parse("1 day").unwrap(), WindowLength::new(1, LengthUnit::Day));
        assert_eq!(
            WindowLength::parse("3 Months").unwrap(),
            WindowLength::new(3, LengthUnit::Month)
        );
        assert!(WindowLength::parse("1 fortnight").is_err());
        assert!(WindowLength::parse("0 days").is_err());
        assert!(WindowLength::parse("month").is_err());
        assert_eq!(WindowLength::new(2, LengthUnit::Year).to_string(), "2 years");
    }

    #[test]
    fn test_origin_spec_parse() {
        let spec: OriginSpec = "year=2011/2012, hour=12".parse().unwrap();
        assert_eq!(spec, OriginSpec::new().years(vec![2011, 2012]).hour(12));
        assert!("week=1".parse::<OriginSpec>().is_err());
        assert!("month=x".parse::<OriginSpec>().is_err());
    }

    #[test]
    fn test_invalid_origin_is_calendar_error() {
        let times = vec![0.0, 1.0];
        let err = time_slices(
            &times,
            &daily_units(),
            Calendar::Standard,
            &[OriginSpec::new().month(13)],
            &WindowLength::default(),
            &TimeBounds::default(),
        )
        .unwrap_err();
        assert!(matches!(err, cdm_common::CdmError::Calendar(CalendarError::InvalidDate { .. })));
    }

    #[test]
    fn test_monthly_windows_over_daily_data() {
        // 2000 is a leap year: 366 daily samples
        let times: Vec<f64> = (0..366).map(|d| d as f64).collect();
        let windows = time_slices(
            &times,
            &daily_units(),
            Calendar::Standard,
            &[OriginSpec::new().hour(0)],
            &WindowLength::default(),
            &TimeBounds::default(),
        )
        .unwrap();
        assert_eq!(windows.len(), 12);
        assert_eq!(windows[0].range, 0..31);
        assert_eq!(windows[1].range, 31..60);
        assert_eq!(windows[11].range, 335..366);
        assert_eq!(windows[1].end, CalendarDate::ymd(2000, 3, 1));
    }

    #[test]
    fn test_windows_clamp_to_coverage() {
        // samples from 2000-01-10 to 2000-01-19
        let times: Vec<f64> = (9..19).map(|d| d as f64).collect();
        let windows = time_slices(
            &times,
            &daily_units(),
            Calendar::Standard,
            &[OriginSpec::new().year(2000).month(1).day(1).hour(0)],
            &WindowLength::default(),
            &TimeBounds::default(),
        )
        .unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].range, 0..10);
    }

    #[test]
    fn test_bounds_drop_windows_outside() {
        let times: Vec<f64> = (0..366).map(|d| d as f64).collect();
        let bounds = TimeBounds {
            after: Some(CalendarDate::ymd(2000, 6, 1)),
            before: Some(CalendarDate::ymd(2000, 8, 31)),
        };
        let windows = time_slices(
            &times,
            &daily_units(),
            Calendar::Standard,
            &[OriginSpec::new().hour(0)],
            &WindowLength::default(),
            &bounds,
        )
        .unwrap();
        let months: Vec<u32> = windows.iter().map(|w| w.start.month).collect();
        assert_eq!(months, vec![6, 7, 8]);
    }

    #[test]
    fn test_overflowing_lengths_are_errors() {
        let start = CalendarDate::ymd(2012, 1, 1);
        for length in ["2147483647 years", "4294967295 years", "4294967295 months"] {
            let length = WindowLength::parse(length).unwrap();
            assert!(matches!(
                length.end_of(&start, Calendar::Standard),
                Err(CalendarError::InvalidLength(_))
            ));
        }
        let err = time_slices(
            &[0.0, 1.0],
            &daily_units(),
            Calendar::Standard,
            &[],
            &WindowLength::parse("2147483647 years").unwrap(),
            &TimeBounds::default(),
        )
        .unwrap_err();
        assert!(matches!(err, cdm_common::CdmError::Calendar(CalendarError::InvalidLength(_))));
    }

    #[test]
    fn test_windows_without_samples_keep_empty_ranges() {
        // samples on 2000-01-01 and 2000-01-05 only
        let times = vec![0.0, 4.0];
        let windows = time_slices(
            &times,
            &daily_units(),
            Calendar::Standard,
            &[OriginSpec::new().hour(0)],
            &WindowLength::new(1, LengthUnit::Day),
            &TimeBounds::default(),
        )
        .unwrap();
        let ranges: Vec<_> = windows.iter().map(|w| w.range.clone()).collect();
        assert_eq!(ranges, vec![0..1, 1..1, 1..1, 1..1, 1..2]);
        assert!(windows[2].is_empty());
    }

    #[test]
    fn test_reductions() {
        let values = [1.0, 4.0, 2.0];
        assert_eq!(Reduction::Sum.apply(&values), 7.0);
        assert_eq!(Reduction::Min.apply(&values), 1.0);
        assert_eq!(Reduction::Max.apply(&values), 4.0);
        assert_eq!(Reduction::Count.apply(&values), 3.0);
        assert!((Reduction::Mean.apply(&values) - 7.0 / 3.0).abs() < 1e-12);
        assert!(Reduction::Sum.apply(&[]).is_nan());
        let first = Reduction::Custom(|v| v.first().copied());
        assert_eq!(first.apply(&values), 1.0);
        assert_eq!("MEAN".parse::<Reduction>().unwrap().apply(&[2.0, 4.0]), 3.0);
    }

    #[test]
    fn test_masking() {
        assert!(masked(f64::NAN, None, None));
        assert!(masked(-1.0, Some(0.0), None));
        assert!(!masked(-1.0, Some(f64::NAN), None));
        assert!(masked(11.0, None, Some(10.0)));
        assert!(!masked(5.0, Some(0.0), Some(10.0)));
    }
}
