use crate::animation::Animation;
use crate::data::{join, year_slice, LongTable, Selector, YearSlice};
use crate::map::{Choropleth, ColorRange, Country, MapRenderer, Viewport, ANNUAL, CUMULATIVE};
use crate::ui::{self, Screen};
use anyhow::{anyhow, Result};
use ratatui::layout::{Position, Rect};
use std::time::{Duration, Instant};

/// Dashboard page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Cumulative,
    Annual,
    Trends,
}

impl View {
    pub const ALL: [View; 3] = [View::Cumulative, View::Annual, View::Trends];

    /// Menu entry
    pub fn label(self) -> &'static str {
        match self {
            View::Cumulative => "Cumulative production",
            View::Annual => "Annual production",
            View::Trends => "Production trends",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Cumulative => "Cumulative Natural Gas Production Map",
            View::Annual => "Annual Natural Gas Production",
            View::Trends => "Global Natural Gas Production Trend",
        }
    }

    pub fn next(self) -> View {
        match self {
            View::Cumulative => View::Annual,
            View::Annual => View::Trends,
            View::Trends => View::Cumulative,
        }
    }
}

/// Everything loaded at startup
pub struct Dataset {
    pub table: LongTable,
    pub countries: Vec<Country>,
    pub animation: Animation,
}

#[derive(Clone, Copy, Debug)]
pub struct AppOptions {
    /// Upper end of the cumulative colour range (EJ)
    pub cumulative_cmax: f64,
    /// Time each trend frame stays on screen
    pub frame_interval: Duration,
}

/// Slice and fills for whatever the current view shows
pub struct ViewData {
    pub slice: YearSlice,
    pub choropleth: Choropleth,
}

/// Trend playback position
#[derive(Clone, Copy, Debug)]
pub struct Playback {
    pub frame: usize,
    pub paused: bool,
    pub last_step: Instant,
}

/// Application state
pub struct App {
    pub table: LongTable,
    pub map_renderer: MapRenderer,
    pub animation: Animation,
    pub options: AppOptions,
    pub viewport: Viewport,
    pub view: View,
    /// Annual slider position
    pub year: u16,
    /// Years present in the table, ascending; the slider only stops on these
    years: Vec<u16>,
    pub playback: Playback,
    pub view_data: ViewData,
    pub screen: Screen,
    /// Terminal size in cells
    size: (u16, u16),
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for hover details
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    pub fn new(dataset: Dataset, options: AppOptions, width: u16, height: u16) -> Result<Self> {
        let view = View::Cumulative;
        let screen = ui::layout(Rect::new(0, 0, width, height), view);
        let inner = screen.map_inner();
        // Braille gives 2x4 resolution per character
        let viewport = Viewport::world(inner.width as usize * 2, inner.height as usize * 4);

        let slice = year_slice(&dataset.table, Selector::Cumulative)?;
        let choropleth = Choropleth::from_values(
            std::iter::empty(),
            ColorRange::new(0.0, options.cumulative_cmax, &CUMULATIVE),
        );

        let years = dataset.table.years();
        let mut app = Self {
            year: years.last().copied().unwrap_or(dataset.table.last_year),
            years,
            table: dataset.table,
            map_renderer: MapRenderer::new(dataset.countries),
            animation: dataset.animation,
            options,
            viewport,
            view,
            playback: Playback {
                frame: 0,
                paused: false,
                last_step: Instant::now(),
            },
            view_data: ViewData { slice, choropleth },
            screen,
            size: (width, height),
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
        };
        app.refresh()?;
        Ok(app)
    }

    /// Rebuild the current view's slice and fills
    fn refresh(&mut self) -> Result<()> {
        let countries = self.map_renderer.countries();
        self.view_data = match self.view {
            View::Cumulative => {
                let slice = year_slice(&self.table, Selector::Cumulative)?;
                let joined = join(&slice, countries);
                let choropleth =
                    Choropleth::from_joined(&joined, &CUMULATIVE, Some((0.0, self.options.cumulative_cmax)));
                tracing::debug!(matched = joined.matched(), "cumulative view");
                ViewData { slice, choropleth }
            }
            View::Annual => {
                let slice = year_slice(&self.table, Selector::Year(self.year))?;
                let joined = join(&slice, countries);
                let choropleth = Choropleth::from_joined(&joined, &ANNUAL, None);
                tracing::debug!(year = self.year, matched = joined.matched(), "annual view");
                ViewData { slice, choropleth }
            }
            View::Trends => {
                let (year, frame) = self
                    .animation
                    .frame(self.playback.frame)
                    .ok_or_else(|| anyhow!("no animation frame {}", self.playback.frame))?;
                let slice = year_slice(&self.table, Selector::Year(year))?;
                ViewData {
                    slice,
                    choropleth: frame.clone(),
                }
            }
        };
        Ok(())
    }

    pub fn set_view(&mut self, view: View) -> Result<()> {
        if view == self.view {
            return Ok(());
        }
        self.view = view;
        if view == View::Trends {
            self.playback.last_step = Instant::now();
        }
        self.relayout();
        self.refresh()
    }

    pub fn next_view(&mut self) -> Result<()> {
        self.set_view(self.view.next())
    }

    /// Move the slider (annual) or the paused frame (trends) through the table's years, clamped at the ends
    pub fn step_year(&mut self, delta: i32) -> Result<()> {
        match self.view {
            View::Cumulative => Ok(()),
            View::Annual => {
                let Some(last) = self.years.len().checked_sub(1) else {
                    return Ok(());
                };
                let at = self.years.binary_search(&self.year).unwrap_or_else(|i| i.min(last));
                let index = (at as i64 + delta as i64).clamp(0, last as i64) as usize;
                let year = self.years[index];
                if year != self.year {
                    self.year = year;
                    self.refresh()?;
                }
                Ok(())
            }
            View::Trends => {
                let last = self.animation.len().saturating_sub(1) as i64;
                let frame = (self.playback.frame as i64 + delta as i64).clamp(0, last) as usize;
                if frame != self.playback.frame {
                    self.playback.frame = frame;
                    self.refresh()?;
                }
                Ok(())
            }
        }
    }

    pub fn toggle_pause(&mut self) {
        self.playback.paused = !self.playback.paused;
        self.playback.last_step = Instant::now();
    }

    /// Advance trend playback once its frame interval has passed; true when the frame changed
    pub fn tick(&mut self, now: Instant) -> Result<bool> {
        if self.view != View::Trends || self.playback.paused || self.animation.is_empty() {
            return Ok(false);
        }
        if now.saturating_duration_since(self.playback.last_step) < self.options.frame_interval {
            return Ok(false);
        }
        self.playback.last_step = now;
        self.playback.frame = (self.playback.frame + 1) % self.animation.len();
        self.refresh()?;
        Ok(true)
    }

    pub fn playback_year(&self) -> Option<u16> {
        self.animation.frame(self.playback.frame).map(|(year, _)| year)
    }

    /// Recompute screen regions and fit the viewport to the map area
    fn relayout(&mut self) {
        let (width, height) = self.size;
        self.screen = ui::layout(Rect::new(0, 0, width, height), self.view);
        let inner = self.screen.map_inner();
        self.viewport.resize(inner.width as usize * 2, inner.height as usize * 4);
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: u16, height: u16) {
        self.size = (width, height);
        self.relayout();
    }

    /// Back to the whole-world view at the current size
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::world(self.viewport.width, self.viewport.height);
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    /// Zoom in
    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    /// Zoom out
    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Terminal position to braille pixel coords, when it falls on the map
    fn map_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let (cx, cy) = self.map_cell(col, row)?;
        Some((cx as i32 * 2, cy as i32 * 4))
    }

    fn map_cell(&self, col: u16, row: u16) -> Option<(usize, usize)> {
        let inner = self.screen.map_inner();
        if !inner.contains(Position::new(col, row)) {
            return None;
        }
        Some(((col - inner.x) as usize, (row - inner.y) as usize))
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_in_at(px, py);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.map_pixel(col, row) {
            self.viewport.zoom_out_at(px, py);
        }
    }

    /// Left click: pick a menu entry, or start a drag on the map
    pub fn click(&mut self, col: u16, row: u16) -> Result<()> {
        let menu = self.screen.menu_inner();
        if menu.contains(Position::new(col, row)) {
            if let Some(&view) = View::ALL.get((row - menu.y) as usize) {
                return self.set_view(view);
            }
        }
        self.last_mouse = Some((col, row));
        Ok(())
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Pan by the drag distance since the last mouse position
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            // Scale based on zoom: less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.pan(dx * scale, dy * scale);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Map cell under the mouse, relative to the map area
    pub fn hovered_cell(&self) -> Option<(usize, usize)> {
        let (col, row) = self.mouse_pos?;
        self.map_cell(col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::sample_table;
    use crate::data::SliceKind;

    fn app() -> App {
        app_with(sample_table())
    }

    fn app_with(table: LongTable) -> App {
        let countries = vec![
            Country::square("United States of America", -110.0, 30.0, 30.0),
            Country::square("Norway", 5.0, 50.0, 20.0),
            Country::square("Atlantis", -40.0, 0.0, 20.0),
        ];
        let animation = Animation::build(&table, &countries);
        let options = AppOptions {
            cumulative_cmax: 1468.0,
            frame_interval: Duration::from_millis(500),
        };
        App::new(
            Dataset {
                table,
                countries,
                animation,
            },
            options,
            140,
            50,
        )
        .unwrap()
    }

    #[test]
    fn test_starts_on_cumulative_with_fixed_range() {
        let app = app();
        assert_eq!(app.view, View::Cumulative);
        assert_eq!(app.year, 1903);
        assert_eq!(app.view_data.slice.kind, SliceKind::Cumulative);
        assert_eq!(app.view_data.choropleth.range.min, 0.0);
        assert_eq!(app.view_data.choropleth.range.max, 1468.0);
        // Atlantis has no production row
        assert_eq!(app.view_data.choropleth.fill(2), None);
        assert!(app.view_data.choropleth.fill(0).is_some());
    }

    #[test]
    fn test_annual_range_spans_joined_values() {
        let mut app = app();
        app.set_view(View::Annual).unwrap();
        assert_eq!(app.view_data.slice.kind, SliceKind::Annual);
        let range = app.view_data.choropleth.range;
        assert_eq!((range.min, range.max), (0.67, 1.5));
    }

    #[test]
    fn test_year_slider_clamps() {
        let mut app = app();
        app.set_view(View::Annual).unwrap();
        app.step_year(1).unwrap();
        assert_eq!(app.year, 1903);
        app.step_year(-10).unwrap();
        assert_eq!(app.year, 1900);
        assert_eq!(app.view_data.slice.kind, SliceKind::FirstYear);
        app.step_year(i32::MAX).unwrap();
        assert_eq!(app.year, 1903);
    }

    #[test]
    fn test_year_slider_skips_years_missing_from_sheet() {
        use crate::data::fixtures::wide;
        use crate::data::Cell::Number as N;
        use crate::data::CumulativeTable;

        let yearly = wide(
            &["Norway", "World"],
            &[
                (1900, &[N(1.0), N(1.0)]),
                (1901, &[N(2.0), N(2.0)]),
                (1903, &[N(3.0), N(3.0)]),
            ],
        );
        let table = LongTable::build(&yearly, &CumulativeTable::default()).unwrap();
        let mut app = app_with(table);
        app.set_view(View::Annual).unwrap();
        assert_eq!(app.year, 1903);

        app.step_year(-1).unwrap();
        assert_eq!(app.year, 1901);
        assert_eq!(app.view_data.slice.period.to_string(), "1901");
        app.step_year(1).unwrap();
        assert_eq!(app.year, 1903);
        app.step_year(i32::MIN).unwrap();
        assert_eq!(app.year, 1900);
        app.step_year(-1).unwrap();
        assert_eq!(app.year, 1900);
    }

    #[test]
    fn test_cycling_views_wraps() {
        let mut app = app();
        app.next_view().unwrap();
        app.next_view().unwrap();
        assert_eq!(app.view, View::Trends);
        app.next_view().unwrap();
        assert_eq!(app.view, View::Cumulative);
    }

    #[test]
    fn test_playback_advances_on_interval_and_loops() {
        let mut app = app();
        app.set_view(View::Trends).unwrap();
        assert_eq!(app.playback_year(), Some(1900));

        let start = app.playback.last_step;
        assert!(!app.tick(start + Duration::from_millis(100)).unwrap());
        assert!(app.tick(start + Duration::from_millis(500)).unwrap());
        assert_eq!(app.playback_year(), Some(1901));
        assert_eq!(app.view_data.slice.period.to_string(), "1901");

        app.toggle_pause();
        let paused_at = app.playback.last_step;
        assert!(!app.tick(paused_at + Duration::from_secs(5)).unwrap());

        app.step_year(10).unwrap();
        assert_eq!(app.playback_year(), Some(1903));
        app.toggle_pause();
        let t = app.playback.last_step + Duration::from_millis(500);
        assert!(app.tick(t).unwrap());
        assert_eq!(app.playback_year(), Some(1900));
    }

    #[test]
    fn test_menu_click_selects_view() {
        let mut app = app();
        let menu = app.screen.menu_inner();
        app.click(menu.x + 2, menu.y + 1).unwrap();
        assert_eq!(app.view, View::Annual);
        assert!(app.last_mouse.is_none());
    }

    #[test]
    fn test_hover_only_inside_map() {
        let mut app = app();
        app.set_mouse_pos(0, 0);
        assert_eq!(app.hovered_cell(), None);
        let inner = app.screen.map_inner();
        app.set_mouse_pos(inner.x + 3, inner.y + 2);
        assert_eq!(app.hovered_cell(), Some((3, 2)));
    }

    #[test]
    fn test_view_switch_refits_viewport_height() {
        let mut app = app();
        let cumulative_height = app.viewport.height;
        app.set_view(View::Trends).unwrap();
        assert!(app.viewport.height < cumulative_height);
        assert_eq!(app.viewport.height, app.screen.map_inner().height as usize * 4);
    }
}
