use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Runtime settings: built-in defaults, then `gas-map.toml`, then `GAS_MAP_*` variables
#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    /// Workbook holding the production sheets
    pub workbook: PathBuf,
    /// Sheet with years down the rows and countries across
    pub yearly_sheet: String,
    /// Sheet with one lifetime total per country
    pub cumulative_sheet: String,
    /// GeoJSON countries layer
    pub countries: PathBuf,
    /// Feature property naming the sovereign country
    pub sovereign_key: String,
    pub gif_path: PathBuf,
    pub gif_width: u32,
    pub gif_height: u32,
    pub gif_fps: u32,
    /// Upper end of the cumulative colour range (EJ)
    pub cumulative_cmax: f64,
    pub log_dir: PathBuf,
}

impl Settings {
    pub const FILE: &'static str = "gas-map";
    pub const ENV_PREFIX: &'static str = "GAS_MAP";

    pub fn load() -> anyhow::Result<Self> {
        Self::builder()?
            .add_source(File::with_name(Self::FILE).required(false))
            .add_source(Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
            .map_err(Into::into)
    }

    fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(Config::builder()
            .set_default("workbook", "data/The history of global natural gas production.xlsx")?
            .set_default("yearly_sheet", "data line chart")?
            .set_default("cumulative_sheet", "data for map")?
            .set_default("countries", "data/countries/ne_110m_admin_0_countries.geojson")?
            .set_default("sovereign_key", "SOVEREIGNT")?
            .set_default("gif_path", "data/gif/animated_map.gif")?
            .set_default("gif_width", 960)?
            .set_default("gif_height", 560)?
            .set_default("gif_fps", 2)?
            .set_default("cumulative_cmax", 1468.0)?
            .set_default("log_dir", "logs")?)
    }

    /// Milliseconds each animation frame stays on screen
    pub fn frame_delay_ms(&self) -> u32 {
        1000 / self.gif_fps.max(1)
    }
}
