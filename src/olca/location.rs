//! ISO 3166 country lookup and Location objects.

use anyhow::{Result, anyhow};

use super::ids::make_uuid;
use super::schema::Location;

/// (alpha-2, alpha-3, name, latitude, longitude)
static ISO_3166: &[(&str, &str, &str, f64, f64)] = &[
    ("US", "USA", "United States", 39.83, -98.58),
    ("CA", "CAN", "Canada", 56.13, -106.35),
    ("MX", "MEX", "Mexico", 23.63, -102.55),
];

/// Alpha-3 country code for an alpha-2 code.
pub fn country_code(alpha2: &str) -> Option<&'static str> {
    ISO_3166
        .iter()
        .find(|(a2, ..)| *a2 == alpha2)
        .map(|(_, a3, ..)| *a3)
}

/// Builds the Location object for an alpha-2 code.
pub fn build_location(code: &str) -> Result<Location> {
    let (a2, _, name, lat, lon) = ISO_3166
        .iter()
        .find(|(a2, ..)| *a2 == code)
        .ok_or_else(|| anyhow!("Unknown location code '{code}'"))?;

    Ok(Location {
        model_type: "Location".into(),
        id: make_uuid([*a2]),
        name: name.to_string(),
        code: a2.to_string(),
        latitude: *lat,
        longitude: *lon,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code() {
        assert_eq!(country_code("US"), Some("USA"));
        assert_eq!(country_code("XX"), None);
    }

    #[test]
    fn test_build_location() {
        let us = build_location("US").unwrap();
        assert_eq!(us.name, "United States");
        assert_eq!(us.id, make_uuid(["US"]));
        assert!(build_location("ZZ").is_err());
    }
}
