//! Reverse lookup and time windows over generated datasets.

use cdm_common::{CalendarDate, CalendarError};
use cdm_field::{
    AxisIndex, CoordinateTarget, Field, FieldError, LengthUnit, OriginSpec, Reduction,
    TimeBounds, WindowLength,
};
use cdm_model::{AttributeList, Dataset, Dimension, MemoryArray};
use test_utils::{
    calendars, cell_value, grid_series_dataset, grid_series_with_values, hourly_offsets,
    rectilinear_dataset, regular_axis, station_dataset, units, STATIONS,
};

/// Day offsets of the first of each month in 2012.
const MONTH_STARTS_2012: [f64; 12] = [
    0.0, 31.0, 60.0, 91.0, 121.0, 152.0, 182.0, 213.0, 244.0, 274.0, 305.0, 335.0,
];

#[test]
fn test_nearest_latitude_prefers_lowest_index_on_ties() {
    let ds = rectilinear_dataset(&[-10.0, 0.0, 10.0, 20.0], &[0.0, 1.0]).unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();

    let located = field
        .reversemap(&[("latitude", CoordinateTarget::from(2.0))])
        .unwrap();
    assert_eq!(located, vec![AxisIndex::Index(1), AxisIndex::Unspecified]);

    // 5 is equidistant from 0 and 10
    let located = field
        .reversemap(&[("latitude", CoordinateTarget::from(5.0))])
        .unwrap();
    assert_eq!(located[0], AxisIndex::Index(1));
}

#[test]
fn test_targets_outside_extent_clamp_to_edges() {
    let ds = rectilinear_dataset(&[-10.0, 0.0, 10.0, 20.0], &[0.0, 1.0]).unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();
    let located = field
        .reversemap(&[
            ("latitude", CoordinateTarget::from(90.0)),
            ("longitude", CoordinateTarget::from(-100.0)),
        ])
        .unwrap();
    assert_eq!(located, vec![AxisIndex::Index(3), AxisIndex::Index(0)]);
}

#[test]
fn test_time_target_uses_coordinate_units() {
    let times = hourly_offsets(12, 6.0);
    let ds = grid_series_dataset(
        &times,
        units::HOURS_SINCE_2012,
        calendars::STANDARD,
        &[0.0, 1.0],
        &[0.0, 1.0],
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();
    let located = field
        .reversemap(&[("time", CoordinateTarget::from(CalendarDate::ymd_h(2012, 1, 2, 1)))])
        .unwrap();
    assert_eq!(located[0], AxisIndex::Index(4));
    assert_eq!(located[1], AxisIndex::Unspecified);
}

#[test]
fn test_station_name_lookup_is_exact() {
    let ds = station_dataset(STATIONS).unwrap();
    let field = Field::for_variable(ds.root(), "pr").unwrap();

    let located = field
        .reversemap(&[("name", CoordinateTarget::from("johannesburg"))])
        .unwrap();
    assert_eq!(located, vec![AxisIndex::Index(1)]);

    let located = field
        .reversemap(&[("name", CoordinateTarget::from("windhoek"))])
        .unwrap();
    assert_eq!(located, vec![AxisIndex::NotFound]);
    assert_eq!(located[0].selection(), None);
}

#[test]
fn test_coordinates_spanning_an_axis_must_share_a_shape() {
    // 2-D la(y, x) and 1-D lo(x) both span the x axis
    let mut ds = Dataset::new(Some("mixed"), None);
    let root = ds.root_id();
    ds.root_mut().add_dimension(Dimension::new("y", 2)).unwrap();
    ds.root_mut().add_dimension(Dimension::new("x", 3)).unwrap();
    ds.create_variable(
        root,
        "la",
        vec!["y".into(), "x".into()],
        AttributeList::new().with("units", "degrees_north"),
        MemoryArray::from_shape_vec(&[2, 3], vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap(),
    )
    .unwrap();
    ds.create_variable(
        root,
        "lo",
        vec!["x".into()],
        AttributeList::new().with("units", "degrees_east"),
        MemoryArray::from_vec(vec![10.0, 11.0, 12.0]),
    )
    .unwrap();
    ds.create_variable(
        root,
        "v",
        vec!["y".into(), "x".into()],
        AttributeList::new().with("coordinates", "la lo"),
        MemoryArray::from_shape_vec(&[2, 3], vec![1.0; 6]).unwrap(),
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "v").unwrap();

    let err = field
        .reversemap(&[
            ("latitude", CoordinateTarget::from(1.0)),
            ("longitude", CoordinateTarget::from(11.0)),
        ])
        .unwrap_err();
    match err {
        FieldError::CoordinateShapeMismatch {
            axis,
            first_shape,
            other_shape,
            ..
        } => {
            assert_eq!(axis, 1);
            assert_eq!(first_shape, vec![2, 3]);
            assert_eq!(other_shape, vec![3]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(field
        .reversemap(&[
            ("latitude", CoordinateTarget::from(1.0)),
            ("longitude", CoordinateTarget::from(11.0)),
        ])
        .unwrap_err()
        .is_configuration_error());
}

#[test]
fn test_daily_windows_over_six_hourly_leap_year() {
    // 2012 is a leap year: 366 days of 4 samples each
    let times = hourly_offsets(366 * 4, 6.0);
    let ds = grid_series_dataset(
        &times,
        units::HOURS_SINCE_2012,
        calendars::STANDARD,
        &[0.0, 1.0],
        &[0.0, 1.0],
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();

    let origin = OriginSpec::new().year(2012).hour(12);
    let windows = field
        .time_slices(&[origin], &WindowLength::parse("1 day").unwrap())
        .unwrap();
    assert_eq!(windows.len(), 366);
    assert_eq!(windows[0].start, CalendarDate::ymd_h(2012, 1, 1, 12));
    assert_eq!(windows[0].range, 2..6);
    assert!(windows.windows(2).all(|w| w[0].start < w[1].start));

    // the last window runs past the data and keeps the two trailing samples
    let last = windows.last().unwrap();
    assert_eq!(last.start, CalendarDate::ymd_h(2012, 12, 31, 12));
    assert_eq!(last.len(), 2);
}

#[test]
fn test_day_360_calendar_has_thirty_windows_per_month() {
    let times = regular_axis(0.0, 1.0, 360);
    let ds = grid_series_dataset(
        &times,
        units::DAYS_SINCE_2000,
        calendars::DAY_360,
        &[0.0, 1.0],
        &[0.0, 1.0],
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();

    let windows = field
        .time_slices(&[OriginSpec::new().hour(0)], &WindowLength::new(1, LengthUnit::Day))
        .unwrap();
    assert_eq!(windows.len(), 360);
    for month in 1..=12 {
        let count = windows.iter().filter(|w| w.start.month == month).count();
        assert_eq!(count, 30, "month {}", month);
    }
    assert!(windows.iter().all(|w| w.len() == 1));
}

#[test]
fn test_daily_windows_over_monthly_axis() {
    let ds = grid_series_dataset(
        &MONTH_STARTS_2012,
        units::DAYS_SINCE_2012,
        calendars::STANDARD,
        &[0.0, 1.0],
        &[0.0, 1.0],
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();
    let origins = [OriginSpec::new().year(2012).hour(12)];
    let length = WindowLength::parse("1 day").unwrap();

    // one window per calendar day of 2012
    let year = TimeBounds {
        after: Some(CalendarDate::ymd(2012, 1, 1)),
        before: Some(CalendarDate::ymd_h(2012, 12, 31, 12)),
    };
    let windows = field.time_slices_within(&origins, &length, &year).unwrap();
    assert_eq!(windows.len(), 366);
    assert_eq!(windows[0].start, CalendarDate::ymd_h(2012, 1, 1, 12));
    assert_eq!(windows[0].range, 1..1);
    assert_eq!(windows[30].range, 1..2);
    assert_eq!(windows[365].start, CalendarDate::ymd_h(2012, 12, 31, 12));
    assert_eq!(windows.iter().filter(|w| !w.is_empty()).count(), 11);

    // without bounds the windows stop at the last sample on 2012-12-01
    let windows = field.time_slices(&origins, &length).unwrap();
    assert_eq!(windows.len(), 335);
    assert_eq!(windows.last().unwrap().start, CalendarDate::ymd_h(2012, 11, 30, 12));
}

#[test]
fn test_aggregation_keeps_a_row_per_window() {
    let ds = grid_series_dataset(
        &MONTH_STARTS_2012,
        units::DAYS_SINCE_2012,
        calendars::STANDARD,
        &[0.0, 1.0],
        &[0.0, 1.0],
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();

    let aggregation = field
        .time_aggregation(
            Reduction::Sum,
            &[OriginSpec::new().year(2012).hour(12)],
            &WindowLength::new(1, LengthUnit::Day),
            None,
            None,
        )
        .unwrap();
    assert_eq!(aggregation.values.shape(), &[335, 2, 2]);
    assert_eq!(aggregation.times.len(), 335);

    // empty windows reduce to NaN and report their start
    assert!(aggregation.values[[0, 0, 0]].is_nan());
    assert_eq!(aggregation.times[0], CalendarDate::ymd_h(2012, 1, 1, 12));

    // the 2012-01-31 window holds the 2012-02-01 sample
    assert_eq!(aggregation.values[[30, 1, 1]], cell_value(1, 1, 1));
    assert_eq!(aggregation.times[30], CalendarDate::ymd(2012, 2, 1));

    let filled = (0..335)
        .filter(|i| !aggregation.values[[*i, 0, 0]].is_nan())
        .count();
    assert_eq!(filled, 11);
}

#[test]
fn test_overflowing_window_length_is_a_calendar_error() {
    let ds = grid_series_dataset(
        &MONTH_STARTS_2012,
        units::DAYS_SINCE_2012,
        calendars::STANDARD,
        &[0.0],
        &[0.0],
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();

    for length in ["2147483647 years", "4294967295 months"] {
        let err = field
            .time_slices(&[], &WindowLength::parse(length).unwrap())
            .unwrap_err();
        assert!(
            matches!(err, FieldError::Calendar(CalendarError::InvalidLength(_))),
            "{}: {:?}",
            length,
            err
        );
    }
}

#[test]
fn test_time_subset_selects_window_samples() {
    // 8 six-hourly samples from 2012-01-01 00:00 to 2012-01-02 18:00
    let ds = grid_series_dataset(
        &hourly_offsets(8, 6.0),
        units::HOURS_SINCE_2012,
        calendars::STANDARD,
        &[0.0, 1.0],
        &[0.0, 1.0],
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();

    let (values, times) = field
        .time_subset(&[OriginSpec::new().hour(12)], &WindowLength::new(1, LengthUnit::Day))
        .unwrap();
    assert_eq!(values.shape(), &[6, 2, 2]);
    assert_eq!(times.len(), 6);
    assert_eq!(times[0], CalendarDate::ymd_h(2012, 1, 1, 12));
    assert_eq!(times[5], CalendarDate::ymd_h(2012, 1, 2, 18));
    assert_eq!(values[[0, 0, 0]], cell_value(2, 0, 0));
    assert_eq!(values[[5, 1, 0]], cell_value(7, 1, 0));
}

#[test]
fn test_sum_skips_masked_values() {
    // cell 0 over time: 1, -5, 2, 3; cell 1 is negative throughout
    let values = vec![1.0, -1.0, -5.0, -2.0, 2.0, -3.0, 3.0, -4.0];
    let ds = grid_series_with_values(
        &[0.0, 1.0, 2.0, 3.0],
        units::DAYS_SINCE_2000,
        calendars::STANDARD,
        &[0.0, 1.0],
        &[0.0],
        values,
    )
    .unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();

    let aggregation = field
        .time_aggregation(
            Reduction::Sum,
            &[OriginSpec::new().hour(0)],
            &WindowLength::new(1, LengthUnit::Month),
            Some(0.0),
            None,
        )
        .unwrap();
    assert_eq!(aggregation.windows.len(), 1);
    assert_eq!(aggregation.values.shape(), &[1, 2, 1]);
    assert_eq!(aggregation.values[[0, 0, 0]], 6.0);
    assert!(aggregation.values[[0, 1, 0]].is_nan());
    assert_eq!(aggregation.times, vec![CalendarDate::ymd(2000, 1, 4)]);
}

#[test]
fn test_time_windows_need_a_time_coordinate() {
    let ds = rectilinear_dataset(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
    let field = Field::for_variable(ds.root(), "tas").unwrap();
    let err = field
        .time_slices(&[], &WindowLength::default())
        .unwrap_err();
    assert!(matches!(err, FieldError::MissingTimeCoordinate(_)));
}
