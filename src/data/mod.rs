mod countries;
mod join;
mod metrics;
mod names;
mod reshape;
mod sheet;

pub use countries::{load_countries, parse_countries};
pub use join::{join, JoinedSlice};
pub use metrics::{
    cumulative_summary, round2, year_slice, Column, CumulativeSummary, Leader, Selector, SliceKind, SliceRow, YearSlice,
};
pub use names::{harmonize, unmatched_corrections, NAME_CORRECTIONS};
pub use reshape::{coerce, melt, repair_date, LongTable, Period, Record, WORLD};
pub use sheet::{Cell, CumulativeTable, WideTable, Workbook};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open workbook {path:?}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to read sheet {sheet:?}")]
    Sheet {
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("sheet {0:?} is empty")]
    EmptySheet(String),
    #[error("sheet {sheet:?} has no {column:?} column")]
    MissingColumn { sheet: String, column: &'static str },
    #[error("sheet {sheet:?} has a non-integer year {raw}")]
    BadYear { sheet: String, raw: String },
    #[error("production table has no years")]
    NoYears,
    #[error("non-numeric value {raw:?} for {country} in {period}")]
    NonNumeric {
        period: String,
        country: String,
        raw: String,
    },
    #[error("year {0} is outside the production table")]
    UnknownYear(u16),
    #[error("no World row for {0}")]
    MissingWorld(String),
    #[error("failed to read geometry {path:?}")]
    GeometryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid geometry JSON")]
    GeometryJson(#[from] simd_json::Error),
    #[error("geometry is not a FeatureCollection")]
    NotFeatureCollection,
}
