use crate::braille::BrailleCanvas;
use crate::map::country::{Country, Ring};
use crate::map::geometry::draw_line;
use crate::map::projection::Viewport;
use crate::map::raster::{rasterize, OwnerRaster};

/// Display settings for map layers
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_borders: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { show_borders: true }
    }
}

/// Everything needed to paint one map frame in the terminal
pub struct MapLayers {
    /// Country ownership at Braille-dot resolution
    pub raster: OwnerRaster,
    /// Country outlines
    pub borders: BrailleCanvas,
}

impl MapLayers {
    /// Country owning the centre of a character cell
    pub fn cell_owner(&self, cx: usize, cy: usize) -> Option<usize> {
        self.raster.owner(cx * 2 + 1, cy * 4 + 2)
    }
}

/// Map renderer over the loaded country geometry
pub struct MapRenderer {
    countries: Vec<Country>,
    pub settings: DisplaySettings,
}

impl MapRenderer {
    pub fn new(countries: Vec<Country>) -> Self {
        Self {
            countries,
            settings: DisplaySettings::default(),
        }
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Render fills and outlines for a `cols` x `rows` character area
    pub fn render(&self, cols: usize, rows: usize, viewport: &Viewport) -> MapLayers {
        let raster = rasterize(&self.countries, viewport);
        let mut borders = BrailleCanvas::new(cols, rows);

        if self.settings.show_borders {
            for country in &self.countries {
                let b = &country.bounds;
                if b.is_empty()
                    || !viewport.box_might_be_visible(
                        viewport.project(b.min_lon, b.max_lat),
                        viewport.project(b.max_lon, b.min_lat),
                    )
                {
                    continue;
                }
                for ring in country.outlines() {
                    draw_ring(&mut borders, ring, viewport);
                }
            }
        }

        MapLayers { raster, borders }
    }

    /// Toggle country outlines
    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }
}

/// Draw a ring with viewport culling; skips segments that wrap the antimeridian
fn draw_ring(canvas: &mut BrailleCanvas, ring: &Ring, viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in ring {
        let (px, py) = viewport.project(lon, lat);

        if let Some((prev_x, prev_y)) = prev {
            let dist = ((px - prev_x).abs() + (py - prev_y).abs()) as usize;
            if dist < viewport.width && viewport.box_might_be_visible((prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}
