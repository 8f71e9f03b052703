use crate::data::reshape::{LongTable, Period, WORLD};
use crate::data::DataError;
use std::collections::HashMap;

/// World electricity consumption figure used for the headline comparison (EJ per day)
pub const WORLD_ELECTRICITY_EJ_PER_DAY: f64 = 1.7;

/// Round to two decimals, ties to even
#[inline]
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// Which slice of the long table a view asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selector {
    Year(u16),
    Cumulative,
}

/// Derived columns carried by a slice, beyond the country name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    Value,
    Percentage,
    IncreasingRate,
}

/// What kind of slice a selector produced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SliceKind {
    /// Lifetime totals
    Cumulative,
    /// The first year of the table; no previous year to compare against
    FirstYear,
    Annual,
}

impl SliceKind {
    pub fn columns(self) -> &'static [Column] {
        match self {
            SliceKind::Cumulative | SliceKind::FirstYear => &[Column::Value, Column::Percentage],
            SliceKind::Annual => &[Column::Value, Column::Percentage, Column::IncreasingRate],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SliceRow {
    pub country: String,
    /// Production in EJ, rounded to two decimals
    pub value: f64,
    /// Share of the World figure; `None` when the World figure is zero
    pub percentage: Option<f64>,
    /// Change from the previous year in percent; `None` when the previous year is zero or missing
    pub growth: Option<f64>,
}

/// One period's figures with derived columns
#[derive(Clone, Debug)]
pub struct YearSlice {
    pub period: Period,
    pub kind: SliceKind,
    pub rows: Vec<SliceRow>,
}

/// Top producer of a year
#[derive(Clone, Debug, PartialEq)]
pub struct Leader {
    pub country: String,
    pub value: f64,
    pub share: f64,
}

impl Leader {
    /// How many days the leader's output would cover world electricity use
    pub fn electricity_days(&self) -> f64 {
        self.value / WORLD_ELECTRICITY_EJ_PER_DAY
    }
}

/// Headline numbers for the cumulative view
#[derive(Clone, Debug, PartialEq)]
pub struct CumulativeSummary {
    pub world: f64,
    pub first: (String, f64),
    pub second: (String, f64),
}

impl YearSlice {
    pub fn columns(&self) -> &'static [Column] {
        self.kind.columns()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.columns().contains(&column)
    }

    pub fn world(&self) -> Option<&SliceRow> {
        self.rows.iter().find(|r| r.country == WORLD)
    }

    pub fn row(&self, country: &str) -> Option<&SliceRow> {
        self.rows.iter().find(|r| r.country == country)
    }

    /// Country rows by descending value, World excluded
    pub fn ranked(&self) -> Vec<&SliceRow> {
        let mut rows: Vec<&SliceRow> = self.rows.iter().filter(|r| r.country != WORLD).collect();
        rows.sort_by(|a, b| b.value.total_cmp(&a.value));
        rows
    }

    pub fn leader(&self) -> Option<Leader> {
        let world = self.world()?.value;
        let top = *self.ranked().first()?;
        Some(Leader {
            country: top.country.clone(),
            value: top.value,
            share: round2(top.value / world * 100.0),
        })
    }
}

/// Lifetime headline figures read straight from the span records, unrounded
pub fn cumulative_summary(table: &LongTable) -> Option<CumulativeSummary> {
    let span = table.span();
    let world = table.world_value(span)?;
    let mut totals: Vec<(&str, f64)> = table
        .period(span)
        .filter(|r| r.country != WORLD)
        .filter_map(|r| r.value.map(|v| (r.country.as_str(), v)))
        .collect();
    totals.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (first, second) = match totals.as_slice() {
        [first, second, ..] => (*first, *second),
        _ => return None,
    };
    Some(CumulativeSummary {
        world,
        first: (first.0.to_string(), first.1),
        second: (second.0.to_string(), second.1),
    })
}

/// Derive the rows for one view: value, share of World, and growth for annual years
pub fn year_slice(table: &LongTable, selector: Selector) -> Result<YearSlice, DataError> {
    let (period, kind) = match selector {
        Selector::Cumulative => (table.span(), SliceKind::Cumulative),
        // Years outside the range, and gaps the sheet skips, have no rows
        Selector::Year(y) if table.period(Period::Year(y)).next().is_none() => {
            return Err(DataError::UnknownYear(y))
        }
        Selector::Year(y) if y == table.first_year => (Period::Year(y), SliceKind::FirstYear),
        Selector::Year(y) => (Period::Year(y), SliceKind::Annual),
    };

    // Countries with a value in the period; empty cells drop out here
    let current: Vec<(&str, f64)> = table
        .period(period)
        .filter_map(|r| r.value.map(|v| (r.country.as_str(), v)))
        .collect();

    let world = current
        .iter()
        .find(|(country, _)| *country == WORLD)
        .map(|(_, v)| *v)
        .ok_or_else(|| DataError::MissingWorld(period.to_string()))?;

    let previous: HashMap<&str, Option<f64>> = match (kind, period) {
        (SliceKind::Annual, Period::Year(y)) => table
            .period(Period::Year(y - 1))
            .map(|r| (r.country.as_str(), r.value))
            .collect(),
        _ => HashMap::new(),
    };

    let rows = current
        .into_iter()
        .map(|(country, value)| {
            let percentage = (world != 0.0).then(|| round2(value / world * 100.0));
            let growth = match kind {
                SliceKind::Annual => previous
                    .get(country)
                    .copied()
                    .flatten()
                    .filter(|prev| *prev != 0.0)
                    .map(|prev| round2((value - prev) / prev * 100.0)),
                _ => None,
            };
            SliceRow {
                country: country.to_string(),
                value: round2(value),
                percentage,
                growth,
            }
        })
        .collect();

    Ok(YearSlice { period, kind, rows })
}
