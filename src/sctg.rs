//! Standard Classification of Transported Goods (2017) commodity codes.

use std::collections::HashSet;

/// Two-digit SCTG codes and the commodity names used in the CFS tables.
static SCTG_CODES: &[(&str, &str)] = &[
    ("01", "Animals and Fish (live)"),
    ("02", "Cereal Grains (includes seed)"),
    (
        "03",
        "Agricultural Products (excludes Animal Feed, Cereal Grains, and Forage Products)",
    ),
    (
        "04",
        "Animal Feed, Eggs, Honey, and Other Products of Animal Origin",
    ),
    ("05", "Meat, Poultry, Fish, Seafood, and Their Preparations"),
    (
        "06",
        "Milled Grain Products and Preparations, and Bakery Products",
    ),
    ("07", "Other Prepared Foodstuffs, and Fats and Oils"),
    ("08", "Alcoholic Beverages and Denatured Alcohol"),
    ("09", "Tobacco Products"),
    ("10", "Monumental or Building Stone"),
    ("11", "Natural Sands"),
    ("12", "Gravel and Crushed Stone (excludes Dolomite and Slate)"),
    ("13", "Other Non-Metallic Minerals not elsewhere classified"),
    ("14", "Metallic Ores and Concentrates"),
    ("15", "Coal"),
    ("16", "Crude Petroleum"),
    (
        "17",
        "Gasoline, Aviation Turbine Fuel, and Ethanol (includes Kerosene, and Fuel Alcohols)",
    ),
    ("18", "Fuel Oils (includes Diesel, Bunker C, and Biodiesel)"),
    (
        "19",
        "Other Coal and Petroleum Products, not elsewhere classified",
    ),
    ("20", "Basic Chemicals"),
    ("21", "Pharmaceutical Products"),
    ("22", "Fertilizers"),
    ("23", "Other Chemical Products and Preparations"),
    ("24", "Plastics and Rubber"),
    ("25", "Logs and Other Wood in the Rough"),
    ("26", "Wood Products"),
    ("27", "Pulp, Newsprint, Paper, and Paperboard"),
    ("28", "Paper or Paperboard Articles"),
    ("29", "Printed Products"),
    ("30", "Textiles, Leather, and Articles of Textiles or Leather"),
    ("31", "Non-Metallic Mineral Products"),
    (
        "32",
        "Base Metal in Primary or Semi-Finished Forms and in Finished Basic Shapes",
    ),
    ("33", "Articles of Base Metal"),
    ("34", "Machinery"),
    (
        "35",
        "Electronic and Other Electrical Equipment and Components, and Office Equipment",
    ),
    ("36", "Motorized and Other Vehicles (includes parts)"),
    ("37", "Transportation Equipment, not elsewhere classified"),
    ("38", "Precision Instruments and Apparatus"),
    (
        "39",
        "Furniture, Mattresses and Mattress Supports, Lamps, Lighting Fittings, and Illuminated Signs",
    ),
    ("40", "Miscellaneous Manufactured Products"),
    (
        "41",
        "Waste and Scrap (excludes of agriculture or food, see 041xx)",
    ),
    ("43", "Mixed Freight"),
];

/// Iterates over `(code, name)` pairs in table order.
pub fn codes() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCTG_CODES.iter().copied()
}

/// Returns the commodity name for a two-digit code.
pub fn name(code: &str) -> Option<&'static str> {
    SCTG_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, n)| *n)
}

/// Reverse lookup: the two-digit code for a commodity name.
pub fn code_for(name: &str) -> Option<&'static str> {
    SCTG_CODES
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(c, _)| *c)
}

/// Normalizes a raw SCTG value from CFS microdata into a two-digit table code.
///
/// Suppressed ranges (`"01-05"`), the all-commodities code `"00"` and codes
/// outside the table yield `None`.
pub fn normalize(raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains('-') {
        return None;
    }

    // "02.0" is accepted, "2.5" is not
    let (digits, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    if !fraction.chars().all(|c| c == '0') {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    let padded = format!("{value:02}");

    SCTG_CODES
        .iter()
        .find(|(c, _)| *c == padded)
        .map(|(c, _)| *c)
}

/// Codes from the table that do not appear in `present`, in table order.
pub fn missing_codes(present: &HashSet<&str>) -> Vec<&'static str> {
    SCTG_CODES
        .iter()
        .map(|(c, _)| *c)
        .filter(|c| !present.contains(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_directions() {
        assert_eq!(name("02"), Some("Cereal Grains (includes seed)"));
        assert_eq!(code_for("Mixed Freight"), Some("43"));
        assert_eq!(name("42"), None);
        assert_eq!(code_for("Unobtainium"), None);
    }

    #[test]
    fn test_table_has_42_entries() {
        assert_eq!(codes().count(), 42);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("2"), Some("02"));
        assert_eq!(normalize("02"), Some("02"));
        assert_eq!(normalize(" 35 "), Some("35"));
        assert_eq!(normalize("15.0"), Some("15"));
        assert_eq!(normalize("01-05"), None);
        assert_eq!(normalize("00"), None);
        assert_eq!(normalize("42"), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("abc"), None);
    }

    #[test]
    fn test_normalize_fractional_codes() {
        assert_eq!(normalize("02.00"), Some("02"));
        assert_eq!(normalize("15."), Some("15"));
        assert_eq!(normalize("2.5"), None);
        assert_eq!(normalize("15.9"), None);
        assert_eq!(normalize("15.0.1"), None);
    }

    #[test]
    fn test_missing_codes() {
        let present: HashSet<&str> = codes().map(|(c, _)| c).filter(|c| *c != "09").collect();
        assert_eq!(missing_codes(&present), vec!["09"]);
    }
}
