use crate::data::names::harmonize;
use crate::data::sheet::{parse_date, Cell, CumulativeTable, WideTable};
use crate::data::DataError;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fmt;

/// Country name carrying the global total for each period
pub const WORLD: &str = "World";

/// Relative deviation between a World figure and its country sum before we warn
const WORLD_TOLERANCE: f64 = 0.01;

/// Time key of a long-table record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Period {
    Year(u16),
    /// Lifetime totals over the whole year range
    Span { start: u16, end: u16 },
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Year(y) => write!(f, "{}", y),
            Period::Span { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub period: Period,
    pub country: String,
    pub value: Option<f64>,
}

/// Undo the spreadsheet import turning a figure into a date
pub fn repair_date(date: NaiveDate) -> f64 {
    date.year() as f64 * 0.0001 + date.month() as f64
}

/// Coerce a cell to a number, repairing date artifacts
pub fn coerce(cell: &Cell, year: u16, country: &str) -> Result<Option<f64>, DataError> {
    let repaired = |date: NaiveDate, before: &dyn fmt::Display| {
        let after = repair_date(date);
        tracing::debug!(year, country, "repaired value before:{} after:{}", before, after);
        after
    };

    match cell {
        Cell::Empty => Ok(None),
        Cell::Number(v) => Ok(Some(*v)),
        Cell::Date(date) => Ok(Some(repaired(*date, date))),
        Cell::Text(raw) => {
            let trimmed = raw.trim();
            if let Ok(v) = trimmed.parse::<f64>() {
                return Ok(Some(v));
            }
            match parse_date(trimmed) {
                Some(date) => Ok(Some(repaired(date, &trimmed))),
                None => Err(DataError::NonNumeric {
                    period: year.to_string(),
                    country: country.to_string(),
                    raw: raw.clone(),
                }),
            }
        }
    }
}

/// Wide table to long records, one country column after another
pub fn melt(wide: &WideTable) -> Result<Vec<Record>, DataError> {
    let mut records = Vec::with_capacity(wide.countries.len() * wide.years.len());
    for (col, country) in wide.countries.iter().enumerate() {
        for (year, cell) in wide.column(col) {
            records.push(Record {
                period: Period::Year(year),
                country: country.clone(),
                value: coerce(cell, year, country)?,
            });
        }
    }
    Ok(records)
}

/// Production records in long form, yearly plus the lifetime span
#[derive(Clone, Debug, Default)]
pub struct LongTable {
    pub records: Vec<Record>,
    pub first_year: u16,
    pub last_year: u16,
}

impl LongTable {
    pub fn build(wide: &WideTable, cumulative: &CumulativeTable) -> Result<Self, DataError> {
        let first_year = *wide.years.iter().min().ok_or(DataError::NoYears)?;
        let last_year = *wide.years.iter().max().ok_or(DataError::NoYears)?;

        let mut records = melt(wide)?;
        ensure_world(&mut records);

        let span = Period::Span {
            start: first_year,
            end: last_year,
        };
        records.extend(cumulative.rows.iter().map(|(country, value)| Record {
            period: span,
            country: country.clone(),
            value: *value,
        }));
        if !cumulative.rows.iter().any(|(country, _)| country == WORLD) {
            records.push(Record {
                period: span,
                country: WORLD.to_string(),
                value: Some(cumulative.total()),
            });
        }

        for record in &mut records {
            let corrected = harmonize(&record.country);
            if corrected != record.country {
                record.country = corrected.to_string();
            }
        }

        tracing::info!(records = records.len(), first_year, last_year, "built long table");

        Ok(Self {
            records,
            first_year,
            last_year,
        })
    }

    pub fn span(&self) -> Period {
        Period::Span {
            start: self.first_year,
            end: self.last_year,
        }
    }

    pub fn period(&self, period: Period) -> impl Iterator<Item = &Record> + '_ {
        self.records.iter().filter(move |r| r.period == period)
    }

    pub fn world_value(&self, period: Period) -> Option<f64> {
        self.period(period)
            .find(|r| r.country == WORLD)
            .and_then(|r| r.value)
    }

    /// Literal years present in the table, ascending
    pub fn years(&self) -> Vec<u16> {
        let mut years: Vec<u16> = self
            .records
            .iter()
            .filter_map(|r| match r.period {
                Period::Year(y) => Some(y),
                Period::Span { .. } => None,
            })
            .collect();
        years.sort_unstable();
        years.dedup();
        years
    }
}

/// Give every year a World record, synthesising it from the country sum when absent
fn ensure_world(records: &mut Vec<Record>) {
    let mut sums: HashMap<u16, f64> = HashMap::new();
    let mut worlds: HashMap<u16, Option<f64>> = HashMap::new();
    for record in records.iter() {
        let Period::Year(year) = record.period else {
            continue;
        };
        if record.country == WORLD {
            worlds.insert(year, record.value);
        } else {
            *sums.entry(year).or_insert(0.0) += record.value.unwrap_or(0.0);
        }
    }

    let mut years: Vec<u16> = sums.keys().copied().collect();
    years.sort_unstable();
    for year in years {
        let sum = sums[&year];
        match worlds.get(&year) {
            None => records.push(Record {
                period: Period::Year(year),
                country: WORLD.to_string(),
                value: Some(sum),
            }),
            Some(Some(world)) => {
                let scale = world.abs().max(sum.abs());
                if scale > 0.0 && (world - sum).abs() / scale > WORLD_TOLERANCE {
                    tracing::warn!(year, world, sum, "World total differs from country sum");
                }
            }
            Some(None) => {
                tracing::warn!(year, "World total missing; using country sum");
                if let Some(record) = records
                    .iter_mut()
                    .find(|r| r.period == Period::Year(year) && r.country == WORLD)
                {
                    record.value = Some(sum);
                }
            }
        }
    }
}
