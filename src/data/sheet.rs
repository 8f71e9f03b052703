use crate::data::DataError;
use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use std::path::Path;

/// A spreadsheet cell after import, before numeric coercion
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    /// Date-typed cell; the spreadsheet reader turns some figures into dates
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    fn from_data(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(dt) => Cell::Date(dt.date()),
                None => Cell::Number(dt.as_f64()),
            },
            Data::DateTimeIso(s) => match parse_date(s) {
                Some(date) => Cell::Date(date),
                None => Cell::Text(s.clone()),
            },
            Data::String(s) if s.trim().is_empty() => Cell::Empty,
            Data::String(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => Some(s.trim().to_string()),
            Cell::Number(v) => Some(v.to_string()),
            _ => None,
        }
    }
}

/// Parse the ISO date/datetime spellings a spreadsheet export produces
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Years down the rows, countries across the columns
#[derive(Clone, Debug, Default)]
pub struct WideTable {
    pub countries: Vec<String>,
    pub years: Vec<u16>,
    /// `cells[row][col]`, row per year, column per country
    pub cells: Vec<Vec<Cell>>,
}

impl WideTable {
    /// Build from a sheet whose header row starts with a `Year` column
    pub fn from_range(sheet: &str, range: &Range<Data>) -> Result<Self, DataError> {
        let mut rows = range.rows();
        let header = rows.next().ok_or_else(|| DataError::EmptySheet(sheet.to_string()))?;
        let header: Vec<Option<String>> =
            header.iter().map(|d| Cell::from_data(d).as_text()).collect();

        let year_col = header
            .iter()
            .position(|h| h.as_deref() == Some("Year"))
            .ok_or_else(|| DataError::MissingColumn {
                sheet: sheet.to_string(),
                column: "Year",
            })?;

        // Columns with a blank header carry no country
        let country_cols: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != year_col)
            .filter_map(|(i, h)| h.as_ref().filter(|s| !s.is_empty()).map(|s| (i, s.clone())))
            .collect();

        let mut table = WideTable {
            countries: country_cols.iter().map(|(_, name)| name.clone()).collect(),
            ..Default::default()
        };

        for row in rows {
            let year = match row.get(year_col).map(Cell::from_data) {
                Some(Cell::Number(y)) if y.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(&y) => {
                    y as u16
                }
                Some(Cell::Empty) | None => continue,
                Some(other) => {
                    return Err(DataError::BadYear {
                        sheet: sheet.to_string(),
                        raw: format!("{:?}", other),
                    })
                }
            };
            table.years.push(year);
            table.cells.push(
                country_cols
                    .iter()
                    .map(|(i, _)| row.get(*i).map(Cell::from_data).unwrap_or(Cell::Empty))
                    .collect(),
            );
        }

        Ok(table)
    }

    pub fn column(&self, col: usize) -> impl Iterator<Item = (u16, &Cell)> + '_ {
        self.years
            .iter()
            .zip(self.cells.iter())
            .map(move |(year, row)| (*year, &row[col]))
    }
}

/// Lifetime production per country
#[derive(Clone, Debug, Default)]
pub struct CumulativeTable {
    pub rows: Vec<(String, Option<f64>)>,
}

impl CumulativeTable {
    pub const COUNTRY: &'static str = "Country";
    pub const VALUE: &'static str = "Cumulative production";

    pub fn from_range(sheet: &str, range: &Range<Data>) -> Result<Self, DataError> {
        let mut rows = range.rows();
        let header = rows.next().ok_or_else(|| DataError::EmptySheet(sheet.to_string()))?;
        let header: Vec<Option<String>> =
            header.iter().map(|d| Cell::from_data(d).as_text()).collect();
        let find = |column: &'static str| {
            header
                .iter()
                .position(|h| h.as_deref() == Some(column))
                .ok_or_else(|| DataError::MissingColumn {
                    sheet: sheet.to_string(),
                    column,
                })
        };
        let country_col = find(Self::COUNTRY)?;
        let value_col = find(Self::VALUE)?;

        let mut table = CumulativeTable::default();
        for row in rows {
            let Some(country) = row.get(country_col).and_then(|d| Cell::from_data(d).as_text()) else {
                continue;
            };
            if country.is_empty() {
                continue;
            }
            let value = match row.get(value_col).map(Cell::from_data) {
                Some(Cell::Number(v)) => Some(v),
                Some(Cell::Empty) | None => None,
                Some(Cell::Text(raw)) => Some(raw.trim().parse::<f64>().map_err(|_| DataError::NonNumeric {
                    period: sheet.to_string(),
                    country: country.clone(),
                    raw,
                })?),
                Some(Cell::Date(date)) => {
                    return Err(DataError::NonNumeric {
                        period: sheet.to_string(),
                        country,
                        raw: date.to_string(),
                    })
                }
            };
            table.rows.push((country, value));
        }
        Ok(table)
    }

    /// Sum over every row, skipping empty values
    pub fn total(&self) -> f64 {
        self.rows.iter().filter_map(|(_, v)| *v).sum()
    }
}

/// Both production sheets read out of the workbook
pub struct Workbook {
    pub yearly: WideTable,
    pub cumulative: CumulativeTable,
}

impl Workbook {
    pub fn load(path: &Path, yearly_sheet: &str, cumulative_sheet: &str) -> Result<Self, DataError> {
        let mut workbook = open_workbook_auto(path).map_err(|source| DataError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

        let mut read = |sheet: &str| {
            workbook
                .worksheet_range(sheet)
                .map_err(|source| DataError::Sheet {
                    sheet: sheet.to_string(),
                    source,
                })
        };

        let yearly = WideTable::from_range(yearly_sheet, &read(yearly_sheet)?)?;
        let cumulative = CumulativeTable::from_range(cumulative_sheet, &read(cumulative_sheet)?)?;

        tracing::info!(
            countries = yearly.countries.len(),
            years = yearly.years.len(),
            cumulative_rows = cumulative.rows.len(),
            "loaded workbook {}",
            path.display()
        );

        Ok(Self { yearly, cumulative })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::coerce;
    use calamine::{ExcelDateTime, ExcelDateTimeType};

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_wide_table_reads_years_and_countries() {
        let range = sheet(&[
            &[s("Year"), s("Norway"), s("World")],
            &[Data::Float(1900.0), Data::Empty, Data::Float(0.2)],
            &[Data::Int(1901), Data::Float(0.1), Data::Float(0.3)],
        ]);
        let table = WideTable::from_range("data line chart", &range).unwrap();
        assert_eq!(table.countries, vec!["Norway", "World"]);
        assert_eq!(table.years, vec![1900, 1901]);
        assert_eq!(table.cells[0][0], Cell::Empty);
        assert_eq!(table.cells[1][0], Cell::Number(0.1));
    }

    #[test]
    fn test_iso_datetime_cell_becomes_date() {
        let cell = Cell::from_data(&Data::DateTimeIso("2021-03-01T00:00:00".into()));
        assert_eq!(cell, Cell::Date(NaiveDate::from_ymd_opt(2021, 3, 1).unwrap()));
    }

    #[test]
    fn test_serial_datetime_cell_repairs_to_figure() {
        let march = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
        let serial = (march - epoch).num_days() as f64;
        let data = Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, false));

        let cell = Cell::from_data(&data);
        assert_eq!(cell, Cell::Date(march));
        assert_eq!(coerce(&cell, 1975, "Norway").unwrap(), Some(2021.0 * 0.0001 + 3.0));
    }

    #[test]
    fn test_out_of_range_datetime_falls_back_to_number() {
        let data = Data::DateTime(ExcelDateTime::new(1e20, ExcelDateTimeType::DateTime, false));
        assert_eq!(Cell::from_data(&data), Cell::Number(1e20));
    }

    #[test]
    fn test_missing_year_column() {
        let range = sheet(&[&[s("Country"), s("Norway")], &[Data::Float(1.0), Data::Float(2.0)]]);
        let err = WideTable::from_range("x", &range).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column: "Year", .. }));
    }

    #[test]
    fn test_cumulative_table_total() {
        let range = sheet(&[
            &[s("Country"), s("Cumulative production")],
            &[s("United States"), Data::Float(1400.0)],
            &[s("Russia"), Data::Float(900.5)],
            &[s("Atlantis"), Data::Empty],
        ]);
        let table = CumulativeTable::from_range("data for map", &range).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.total(), 2300.5);
    }
}
