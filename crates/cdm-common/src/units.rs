//! CF-convention unit strings used to recognise coordinate roles.

use crate::calendar::TimeUnits;

/// Well-known coordinate role names.
pub mod roles {
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const TIME: &str = "time";
}

/// Unit spellings that identify longitude and latitude coordinates.
const SPATIAL_UNITS: &[(&str, &str)] = &[
    ("degree_east", roles::LONGITUDE),
    ("degree east", roles::LONGITUDE),
    ("degrees_east", roles::LONGITUDE),
    ("degrees east", roles::LONGITUDE),
    ("degree_e", roles::LONGITUDE),
    ("degrees_e", roles::LONGITUDE),
    ("degree_north", roles::LATITUDE),
    ("degree north", roles::LATITUDE),
    ("degrees_north", roles::LATITUDE),
    ("degrees north", roles::LATITUDE),
    ("degree_n", roles::LATITUDE),
    ("degrees_n", roles::LATITUDE),
];

/// Map a `units` attribute value to a coordinate role.
///
/// Returns `None` when the units do not identify a latitude, longitude or time
/// coordinate; callers then fall back to the variable or dimension name.
pub fn canonical_role(units: &str) -> Option<&'static str> {
    let normalized = units.trim().to_lowercase();
    if let Some((_, role)) = SPATIAL_UNITS.iter().find(|(u, _)| *u == normalized) {
        return Some(*role);
    }

    TimeUnits::parse(units).ok().map(|_| roles::TIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_units() {
        assert_eq!(canonical_role("degrees_north"), Some("latitude"));
        assert_eq!(canonical_role("degree north"), Some("latitude"));
        assert_eq!(canonical_role("degrees_east"), Some("longitude"));
        assert_eq!(canonical_role("Degrees_East"), Some("longitude"));
        assert_eq!(canonical_role("degree_E"), Some("longitude"));
    }

    #[test]
    fn test_time_units() {
        assert_eq!(canonical_role("days since 1900-01-01"), Some("time"));
        assert_eq!(canonical_role("hours since 2012-01-01 00:00:00"), Some("time"));
    }

    #[test]
    fn test_unmatched_units() {
        assert_eq!(canonical_role("K"), None);
        assert_eq!(canonical_role("m"), None);
        assert_eq!(canonical_role(""), None);
    }
}
