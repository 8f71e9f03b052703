use crate::data::{LongTable, Period, WORLD};
use crate::map::{rasterize, Choropleth, ColorRange, Country, OwnerRaster, Rgb, Viewport, ORANGE_RED};
use anyhow::{Context, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, Rgba, RgbaImage};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Frames rasterised in parallel before each batch goes to the encoder
const FRAME_BATCH: usize = 16;

const BACKGROUND: Rgb = Rgb(255, 255, 255);
const BASE_MAP: Rgb = Rgb(211, 211, 211);
const EDGE: Rgb = Rgb(150, 150, 150);
const INK: Rgb = Rgb(30, 30, 30);

/// One choropleth per literal year, coloured on a shared scale
pub struct Animation {
    pub years: Vec<u16>,
    pub frames: Vec<Choropleth>,
    pub range: ColorRange,
}

impl Animation {
    /// Precompute every year's fills; World is left out of both the fills and the range
    pub fn build(table: &LongTable, countries: &[Country]) -> Self {
        let mut by_year: HashMap<u16, HashMap<&str, f64>> = HashMap::new();
        for record in &table.records {
            let (Period::Year(year), Some(value)) = (record.period, record.value) else {
                continue;
            };
            if record.country == WORLD {
                continue;
            }
            by_year.entry(year).or_default().insert(record.country.as_str(), value);
        }

        let vmax = by_year
            .values()
            .flat_map(|m| m.values().copied())
            .fold(0.0, f64::max);
        let range = ColorRange::new(0.0, vmax, &ORANGE_RED);

        let years = table.years();
        let frames = years
            .iter()
            .map(|year| {
                let values = by_year.get(year);
                Choropleth::from_values(
                    countries
                        .iter()
                        .map(|c| values.and_then(|m| m.get(c.sovereign.as_str()).copied())),
                    range,
                )
            })
            .collect();

        Self { years, frames, range }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frame(&self, idx: usize) -> Option<(u16, &Choropleth)> {
        Some((*self.years.get(idx)?, self.frames.get(idx)?))
    }
}

/// Image size and timing of the written GIF
#[derive(Clone, Copy, Debug)]
pub struct GifOptions {
    pub width: u32,
    pub height: u32,
    pub delay_ms: u32,
}

/// Pixel layout shared by every frame
struct FrameLayout {
    width: u32,
    height: u32,
    map_top: u32,
    viewport: Viewport,
}

impl FrameLayout {
    const CAPTION: u32 = 36;
    const LEGEND: u32 = 44;

    fn new(width: u32, height: u32) -> Self {
        let map_height = height.saturating_sub(Self::CAPTION + Self::LEGEND).max(1);
        Self {
            width,
            height,
            map_top: Self::CAPTION,
            viewport: Viewport::world(width as usize, map_height as usize),
        }
    }
}

/// True when `output` exists and is newer than every input
pub fn is_up_to_date(output: &Path, inputs: &[&Path]) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    let Some(out) = modified(output) else {
        return false;
    };
    inputs.iter().all(|input| modified(input).is_some_and(|t| t <= out))
}

/// Render every frame and write a looping GIF, creating parent directories
pub fn write_gif(animation: &Animation, countries: &[Country], path: &Path, options: GifOptions) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating animation directory {}", parent.display()))?;
    }

    let layout = FrameLayout::new(options.width, options.height);
    let raster = rasterize(countries, &layout.viewport);

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), 20);
    encoder.set_repeat(Repeat::Infinite)?;
    let delay = Delay::from_numer_denom_ms(options.delay_ms, 1);

    let indices: Vec<usize> = (0..animation.len()).collect();
    for batch in indices.chunks(FRAME_BATCH) {
        let images: Vec<RgbaImage> = batch
            .par_iter()
            .filter_map(|&idx| animation.frame(idx))
            .map(|(year, fills)| render_frame(&layout, &raster, fills, year, &animation.range))
            .collect();
        for image in images {
            encoder.encode_frame(Frame::from_parts(image, 0, 0, delay))?;
        }
        tracing::debug!(encoded = batch.len(), "animation batch");
    }

    tracing::info!(frames = animation.len(), "wrote animation {}", path.display());
    Ok(())
}

fn rgba(c: Rgb) -> Rgba<u8> {
    Rgba([c.0, c.1, c.2, 255])
}

fn render_frame(
    layout: &FrameLayout,
    raster: &OwnerRaster,
    fills: &Choropleth,
    year: u16,
    range: &ColorRange,
) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(layout.width, layout.height, rgba(BACKGROUND));

    for y in 0..raster.height() {
        for x in 0..raster.width() {
            let Some(owner) = raster.owner(x, y) else {
                continue;
            };
            let edge = raster.owner(x + 1, y) != Some(owner) || raster.owner(x, y + 1) != Some(owner);
            let color = if edge {
                EDGE
            } else {
                fills.fill(owner).unwrap_or(BASE_MAP)
            };
            let py = y as u32 + layout.map_top;
            if (x as u32) < layout.width && py < layout.height {
                image.put_pixel(x as u32, py, rgba(color));
            }
        }
    }

    draw_text(&mut image, 12, 8, &format!("YEAR: {}", year), 4, INK);
    draw_legend(&mut image, layout, range);
    image
}

/// Horizontal colorbar with its end labels along the bottom edge
fn draw_legend(image: &mut RgbaImage, layout: &FrameLayout, range: &ColorRange) {
    let bar_width = (layout.width / 4).max(2);
    let top = layout.height.saturating_sub(FrameLayout::LEGEND) + 6;
    let left = 12;
    for dx in 0..bar_width {
        let t = dx as f64 / (bar_width - 1) as f64;
        let color = rgba(range.scale.sample(t));
        for dy in 0..12 {
            if left + dx < layout.width && top + dy < layout.height {
                image.put_pixel(left + dx, top + dy, color);
            }
        }
    }
    draw_text(image, left, top + 18, &format!("{:.0}", range.min), 2, INK);
    let max_label = format!("{:.2} EJ", range.max);
    let label_width = max_label.len() as u32 * 4 * 2;
    draw_text(image, (left + bar_width).saturating_sub(label_width), top + 18, &max_label, 2, INK);
}

/// 3x5 bitmap glyphs for the captions; unknown characters draw blank
fn glyph(ch: char) -> [u8; 5] {
    match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => [0; 5],
    }
}

fn draw_text(image: &mut RgbaImage, x: u32, y: u32, text: &str, scale: u32, color: Rgb) {
    let color = rgba(color);
    for (i, ch) in text.chars().enumerate() {
        let origin = x + i as u32 * 4 * scale;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                for sy in 0..scale {
                    for sx in 0..scale {
                        let px = origin + col * scale + sx;
                        let py = y + row as u32 * scale + sy;
                        if px < image.width() && py < image.height() {
                            image.put_pixel(px, py, color);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::sample_table;

    fn countries() -> Vec<Country> {
        vec![
            Country::square("United States of America", -110.0, 30.0, 30.0),
            Country::square("Norway", 5.0, 50.0, 20.0),
            Country::square("Atlantis", -40.0, 0.0, 20.0),
        ]
    }

    #[test]
    fn test_one_frame_per_year_on_shared_range() {
        let table = sample_table();
        let animation = Animation::build(&table, &countries());
        assert_eq!(animation.years, vec![1900, 1901, 1902, 1903]);
        assert_eq!(animation.len(), 4);
        // World (2.666) is excluded from the range
        assert_eq!(animation.range.max, 1.5);
        assert_eq!(animation.range.min, 0.0);

        let (year, last) = animation.frame(3).unwrap();
        assert_eq!(year, 1903);
        assert_eq!(last.fill(0), Some(ORANGE_RED.sample(1.0)));
        assert_eq!(last.fill(2), None);
        assert!(animation.frame(4).is_none());
    }

    #[test]
    fn test_render_frame_paints_fills_and_base_map() {
        let table = sample_table();
        let countries = countries();
        let animation = Animation::build(&table, &countries);
        let layout = FrameLayout::new(360, 260);
        let raster = rasterize(&countries, &layout.viewport);
        let (year, fills) = animation.frame(3).unwrap();
        let image = render_frame(&layout, &raster, fills, year, &animation.range);

        let sample = |lon: f64, lat: f64| {
            let (x, y) = layout.viewport.project(lon, lat);
            *image.get_pixel(x as u32, y as u32 + layout.map_top)
        };
        assert_eq!(sample(-95.0, 45.0), rgba(ORANGE_RED.sample(1.0)));
        assert_eq!(sample(-30.0, 10.0), rgba(BASE_MAP));
        assert_eq!(sample(-160.0, -30.0), rgba(BACKGROUND));
    }

    #[test]
    fn test_write_gif_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("gas-map-gif-{}", std::process::id()));
        let path = dir.join("nested").join("animated_map.gif");
        let table = sample_table();
        let countries = countries();
        let animation = Animation::build(&table, &countries);
        let options = GifOptions {
            width: 200,
            height: 140,
            delay_ms: 500,
        };
        write_gif(&animation, &countries, &path, options).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(&bytes[..6], b"GIF89a");
        assert!(is_up_to_date(&path, &[]));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_output_is_stale() {
        assert!(!is_up_to_date(Path::new("/nonexistent/animated_map.gif"), &[]));
    }
}
