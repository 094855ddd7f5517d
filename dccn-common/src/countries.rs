//! Country code to display name lookup
//!
//! Covers the countries that appear in conference registrations; unknown
//! codes are displayed as-is.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static COUNTRIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("AM", "Armenia"),
        ("AT", "Austria"),
        ("AU", "Australia"),
        ("AZ", "Azerbaijan"),
        ("BE", "Belgium"),
        ("BG", "Bulgaria"),
        ("BR", "Brazil"),
        ("BY", "Belarus"),
        ("CA", "Canada"),
        ("CH", "Switzerland"),
        ("CN", "China"),
        ("CZ", "Czechia"),
        ("DE", "Germany"),
        ("DK", "Denmark"),
        ("EE", "Estonia"),
        ("EG", "Egypt"),
        ("ES", "Spain"),
        ("FI", "Finland"),
        ("FR", "France"),
        ("GB", "United Kingdom"),
        ("GE", "Georgia"),
        ("GR", "Greece"),
        ("HU", "Hungary"),
        ("IE", "Ireland"),
        ("IL", "Israel"),
        ("IN", "India"),
        ("IQ", "Iraq"),
        ("IR", "Iran"),
        ("IT", "Italy"),
        ("JO", "Jordan"),
        ("JP", "Japan"),
        ("KG", "Kyrgyzstan"),
        ("KR", "South Korea"),
        ("KZ", "Kazakhstan"),
        ("LT", "Lithuania"),
        ("LV", "Latvia"),
        ("MD", "Moldova"),
        ("MN", "Mongolia"),
        ("MX", "Mexico"),
        ("NL", "Netherlands"),
        ("NO", "Norway"),
        ("PK", "Pakistan"),
        ("PL", "Poland"),
        ("PT", "Portugal"),
        ("RO", "Romania"),
        ("RS", "Serbia"),
        ("RU", "Russia"),
        ("SA", "Saudi Arabia"),
        ("SE", "Sweden"),
        ("SK", "Slovakia"),
        ("SY", "Syria"),
        ("TJ", "Tajikistan"),
        ("TM", "Turkmenistan"),
        ("TR", "Turkey"),
        ("UA", "Ukraine"),
        ("US", "United States of America"),
        ("UZ", "Uzbekistan"),
        ("VN", "Vietnam"),
    ]
    .into_iter()
    .collect()
});

/// Display name for an ISO 3166-1 alpha-2 code; falls back to the code itself
pub fn name_of(code: &str) -> &str {
    COUNTRIES.get(code).copied().unwrap_or(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code() {
        assert_eq!(name_of("DE"), "Germany");
    }

    #[test]
    fn test_unknown_code_passes_through() {
        assert_eq!(name_of("XX"), "XX");
        assert_eq!(name_of(""), "");
    }
}
