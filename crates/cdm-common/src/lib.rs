//! Common types and utilities shared across the common-data-model crates.

pub mod calendar;
pub mod error;
pub mod units;

pub use calendar::{Calendar, CalendarDate, CalendarError, TimeUnit, TimeUnits};
pub use error::{CdmError, CdmResult};
pub use units::{canonical_role, roles};
