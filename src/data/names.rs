use crate::map::Country;

/// Production-table spellings that differ from the geometry's sovereign names
pub const NAME_CORRECTIONS: &[(&str, &str)] = &[
    ("Tanzania", "United Republic of Tanzania"),
    ("The Bahamas", "Bahamas"),
    ("United States", "United States of America"),
    ("Eswatini", "eSwatini"),
];

/// Map a production-table country name onto the geometry's spelling
pub fn harmonize(name: &str) -> &str {
    NAME_CORRECTIONS
        .iter()
        .find(|(from, _)| *from == name)
        .map(|(_, to)| *to)
        .unwrap_or(name)
}

/// Correction targets with no country geometry carrying that sovereign name
pub fn unmatched_corrections(countries: &[Country]) -> Vec<&'static str> {
    NAME_CORRECTIONS
        .iter()
        .map(|(_, to)| *to)
        .filter(|to| !countries.iter().any(|c| c.sovereign == *to))
        .collect()
}
