use crate::data::metrics::{SliceRow, YearSlice};
use crate::map::Country;
use std::collections::HashMap;

/// Slice rows laid out against the country list
pub struct JoinedSlice<'a> {
    pub slice: &'a YearSlice,
    /// One entry per country, `None` where no row matched its sovereign name
    pub rows: Vec<Option<&'a SliceRow>>,
}

impl<'a> JoinedSlice<'a> {
    pub fn row(&self, country: usize) -> Option<&'a SliceRow> {
        self.rows.get(country).copied().flatten()
    }

    /// Value range over matched countries only
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.rows
            .iter()
            .flatten()
            .map(|r| r.value)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    pub fn matched(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }
}

/// Left join of countries onto slice rows by sovereign name
pub fn join<'a>(slice: &'a YearSlice, countries: &[Country]) -> JoinedSlice<'a> {
    let by_name: HashMap<&str, &SliceRow> = slice
        .rows
        .iter()
        .map(|r| (r.country.as_str(), r))
        .collect();

    JoinedSlice {
        slice,
        rows: countries
            .iter()
            .map(|c| by_name.get(c.sovereign.as_str()).copied())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::sample_table;
    use crate::data::metrics::{year_slice, Selector};

    #[test]
    fn test_left_join_by_sovereign() {
        let table = sample_table();
        let slice = year_slice(&table, Selector::Year(1902)).unwrap();
        let countries = vec![
            Country::square("United States of America", -120.0, 30.0, 40.0),
            Country::square("Atlantis", -30.0, 0.0, 5.0),
            Country::square("Norway", 5.0, 58.0, 10.0),
        ];
        let joined = join(&slice, &countries);

        assert_eq!(joined.rows.len(), 3);
        assert_eq!(joined.row(0).unwrap().value, 1.2);
        assert!(joined.row(1).is_none());
        assert_eq!(joined.row(2).unwrap().country, "Norway");
        assert_eq!(joined.matched(), 2);
        assert_eq!(joined.value_range(), Some((0.45, 1.2)));
    }

    #[test]
    fn test_several_features_share_a_sovereign() {
        let table = sample_table();
        let slice = year_slice(&table, Selector::Cumulative).unwrap();
        let countries = vec![
            Country::square("Norway", 5.0, 58.0, 10.0),
            Country::square("Norway", 15.0, 76.0, 5.0),
        ];
        let joined = join(&slice, &countries);
        assert_eq!(joined.matched(), 2);
        // World never matches a geometry
        assert!(joined.rows.iter().flatten().all(|r| r.country != "World"));
    }
}
