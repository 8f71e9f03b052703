use crate::app::{App, View};
use crate::data::{cumulative_summary, Column, SliceRow, YearSlice};
use crate::map::{Choropleth, ColorRange, MapLayers, Rgb};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 44;
/// Land with no production figure
const NO_DATA: Rgb = Rgb(72, 72, 72);
const HOVER_LIFT: f64 = 0.45;

/// Screen regions, shared with the app so mouse positions map onto the same cells
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Screen {
    pub menu: Rect,
    pub details: Rect,
    pub header: Rect,
    pub control: Rect,
    pub map: Rect,
    pub legend: Rect,
    pub status: Rect,
}

impl Screen {
    /// Map area inside its border
    pub fn map_inner(&self) -> Rect {
        map_block("").inner(self.map)
    }

    /// Menu rows inside the menu border
    pub fn menu_inner(&self) -> Rect {
        sidebar_block("").inner(self.menu)
    }
}

/// Split the terminal into sidebar and main column; the header grows with the view's narrative
pub fn layout(area: Rect, view: View) -> Screen {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(area);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(View::ALL.len() as u16 + 2), // Menu
            Constraint::Min(0),                             // Hover details
        ])
        .split(columns[0]);

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(header_height(view)),
            Constraint::Length(1), // Slider or playback
            Constraint::Min(3),    // Map
            Constraint::Length(2), // Colorbar
            Constraint::Length(1), // Status bar
        ])
        .split(columns[1]);

    Screen {
        menu: sidebar[0],
        details: sidebar[1],
        header: main[0],
        control: main[1],
        map: main[2],
        legend: main[3],
        status: main[4],
    }
}

fn header_height(view: View) -> u16 {
    match view {
        View::Cumulative => 4,
        View::Annual => 6,
        View::Trends => 9,
    }
}

/// Render the UI
pub fn render(frame: &mut Frame, app: &App) {
    let screen = layout(frame.area(), app.view);
    let inner = screen.map_inner();

    // Viewport follows the map area; braille gives 2x4 resolution per character
    let mut viewport = app.viewport.clone();
    viewport.resize(inner.width as usize * 2, inner.height as usize * 4);
    let layers = app
        .map_renderer
        .render(inner.width as usize, inner.height as usize, &viewport);

    let hovered = app
        .hovered_cell()
        .and_then(|(cx, cy)| layers.cell_owner(cx, cy));

    render_menu(frame, app, screen.menu);
    render_details(frame, app, hovered, screen.details);
    render_header(frame, app, screen.header);
    render_control(frame, app, screen.control);
    render_map(frame, app, layers, hovered, screen.map);
    render_legend(frame, app, screen.legend);
    render_status_bar(frame, app, screen.status);
}

fn sidebar_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
}

fn map_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ))
}

fn render_menu(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, &view)| {
            if view == app.view {
                Line::from(Span::styled(
                    format!("▶ {}. {}", i + 1, view.label()),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(Span::styled(
                    format!("  {}. {}", i + 1, view.label()),
                    Style::default().fg(Color::Gray),
                ))
            }
        })
        .collect();

    let menu = Paragraph::new(lines).block(sidebar_block(" Select View for Natural Gas Production "));
    frame.render_widget(menu, area);
}

/// Hover panel: the country under the cursor and its figures for the current slice
fn render_details(frame: &mut Frame, app: &App, hovered: Option<usize>, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let mut lines = Vec::new();

    match hovered.and_then(|idx| app.map_renderer.countries().get(idx)) {
        None => lines.push(Line::from(Span::styled("Hover over a country", dim))),
        Some(country) => {
            lines.push(Line::from(Span::styled(
                country.name.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )));
            if country.name != country.sovereign {
                lines.push(Line::from(Span::styled(country.sovereign.clone(), dim)));
            }
            let slice = &app.view_data.slice;
            match slice.row(&country.sovereign) {
                Some(row) => lines.extend(hover_lines(slice, row)),
                None => lines.push(Line::from(Span::styled("No production data", dim))),
            }
        }
    }

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(sidebar_block(" Details "));
    frame.render_widget(details, area);
}

fn hover_lines(slice: &YearSlice, row: &SliceRow) -> Vec<Line<'static>> {
    let percent = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| format!("{}%", v));
    let mut lines = vec![
        Line::from(format!("Production: {} EJ", row.value)),
        Line::from(format!(
            "Percentage of the World production: {}",
            percent(row.percentage)
        )),
    ];
    if slice.has_column(Column::IncreasingRate) {
        lines.push(Line::from(format!(
            "Increasing rate from the last year: {}",
            percent(row.growth)
        )));
    }
    lines
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let subtitle = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(Span::styled(app.view.title(), title))];

    match app.view {
        View::Cumulative => {
            if let Some(summary) = cumulative_summary(&app.table) {
                lines.push(Line::from(format!(
                    "The cumulative production of world from {} is {} EJ.",
                    span_words(app),
                    summary.world
                )));
                lines.push(Line::from(format!(
                    "{} has the highest cumulative natural gas production at {} EJ, followed by {} with {} EJ.",
                    summary.first.0, summary.first.1, summary.second.0, summary.second.1
                )));
            }
        }
        View::Annual => {
            lines.push(Line::from(Span::styled(
                "Production Amount and Growth Rate from Previous Year",
                subtitle,
            )));
            if let Some(leader) = app.view_data.slice.leader() {
                lines.push(Line::from(format!(
                    "In {}, {} produced the most natural gas of {:.3} EJ, accounting for {:.2}% of the world production during that year.",
                    app.year, leader.country, leader.value, leader.share
                )));
                lines.push(Line::from(format!(
                    "In today's scale, {:.3} EJ can supply the entire world's electricity consumption for about {:.1} days.",
                    leader.value,
                    leader.electricity_days()
                )));
            }
        }
        View::Trends => {
            lines.extend(TREND_NARRATIVE.iter().map(|p| Line::from(*p)));
            lines.push(Line::from(Span::styled(
                format!("History of natural gas production, {}", app.table.span()),
                subtitle,
            )));
        }
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

const TREND_NARRATIVE: [&str; 3] = [
    "Natural gas production globally saw a significant increase starting in the 1930s, with many countries beginning to tap into their natural gas resources.",
    "By the 1950s, production experienced a sharp jump due to advancements in extraction technologies and rising energy demands. The 1970s marked another surge in production, driven by the oil crises and increased focus on alternative energy sources.",
    "From the 1980s onwards, production continued to grow steadily, with major producers expanding their capacity and emerging markets starting to contribute more significantly to global output.",
];

fn span_words(app: &App) -> String {
    format!("{} to {}", app.table.first_year, app.table.last_year)
}

/// Year slider for the annual view, playback state for trends
fn render_control(frame: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let accent = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);

    let line = match app.view {
        View::Cumulative => Line::from(vec![
            Span::styled("Period: ", dim),
            Span::styled(app.table.span().to_string(), accent),
        ]),
        View::Annual => {
            let first = app.table.first_year;
            let last = app.table.last_year;
            let labels = format!("Select a year to display  {} ", first).len() + format!(" {}  [{}]", last, app.year).len();
            let track = (area.width as usize).saturating_sub(labels).max(3);
            Line::from(vec![
                Span::styled("Select a year to display  ", dim),
                Span::styled(first.to_string(), dim),
                Span::raw(" "),
                Span::styled(slider_track(app.year, first, last, track), Style::default().fg(Color::Cyan)),
                Span::raw(" "),
                Span::styled(last.to_string(), dim),
                Span::raw("  "),
                Span::styled(format!("[{}]", app.year), accent),
            ])
        }
        View::Trends => {
            let year = app.playback_year().map_or_else(String::new, |y| y.to_string());
            let state = if app.playback.paused {
                "⏸ paused (space to play)"
            } else {
                "▶ playing (space to pause)"
            };
            Line::from(vec![
                Span::styled("YEAR: ", dim),
                Span::styled(year, accent),
                Span::raw("  "),
                Span::styled(state, dim),
            ])
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Horizontal track with a knob at the year's position
fn slider_track(year: u16, first: u16, last: u16, width: usize) -> String {
    let span = (last - first).max(1) as f64;
    let knob = (((year - first) as f64 / span) * (width - 1) as f64).round() as usize;
    (0..width)
        .map(|i| if i == knob { '●' } else { '━' })
        .collect()
}

fn render_map(frame: &mut Frame, app: &App, layers: MapLayers, hovered: Option<usize>, area: Rect) {
    let title = match app.view {
        View::Trends => format!(
            " Natural gas production by country, {} ",
            app.playback_year().map_or_else(String::new, |y| y.to_string())
        ),
        _ => format!(
            " Natural gas production by country, {} ",
            app.view_data.slice.period
        ),
    };
    let block = map_block(&title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let map_widget = MapWidget {
        layers: &layers,
        fills: &app.view_data.choropleth,
        hovered,
    };
    frame.render_widget(map_widget, inner);
}

fn to_color(c: Rgb) -> Color {
    Color::Rgb(c.0, c.1, c.2)
}

/// Choropleth cells with braille outlines drawn over them
struct MapWidget<'a> {
    layers: &'a MapLayers,
    fills: &'a Choropleth,
    hovered: Option<usize>,
}

impl Widget for MapWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for cy in 0..area.height {
            for cx in 0..area.width {
                let owner = self.layers.cell_owner(cx as usize, cy as usize);
                let cell = &mut buf[(area.x + cx, area.y + cy)];

                if let Some(idx) = owner {
                    let fill = self.fills.fill(idx).unwrap_or(NO_DATA);
                    let fill = if Some(idx) == self.hovered {
                        fill.mix(Rgb(255, 255, 255), HOVER_LIFT)
                    } else {
                        fill
                    };
                    cell.set_bg(to_color(fill));
                }

                if let Some(ch) = self.layers.borders.cell(cx as usize, cy as usize) {
                    let fg = if owner.is_some() { Color::Black } else { Color::Gray };
                    cell.set_char(ch).set_fg(fg);
                }
            }
        }
    }
}

fn render_legend(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.view {
        View::Cumulative => "Cumulative production (EJ)",
        View::Annual | View::Trends => "Production amount (EJ)",
    };
    let range = app.view_data.choropleth.range;
    let bar_width = (area.width as usize / 3).clamp(8, 48);

    let lines = vec![
        Line::from(Span::styled(title, Style::default().fg(Color::White).add_modifier(Modifier::BOLD))),
        colorbar(&range, bar_width),
    ];
    frame.render_widget(Paragraph::new(lines), area);
}

/// Gradient strip between its end labels
fn colorbar(range: &ColorRange, width: usize) -> Line<'static> {
    let dim = Style::default().fg(Color::Gray);
    let mut spans = vec![Span::styled(format!("{:.2} ", range.min), dim)];
    spans.extend((0..width).map(|i| {
        let t = i as f64 / (width - 1).max(1) as f64;
        Span::styled("█", Style::default().fg(to_color(range.scale.sample(t))))
    }));
    spans.push(Span::styled(format!(" {:.2}", range.max), dim));
    Line::from(spans)
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let settings = &app.map_renderer.settings;

    let status = Line::from(vec![
        Span::styled(" Zoom: ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.zoom_level(), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            if settings.show_borders { "[B]order " } else { "[b]order " },
            Style::default().fg(if settings.show_borders { Color::Green } else { Color::DarkGray }),
        ),
        Span::styled("| ", Style::default().fg(Color::DarkGray)),
        Span::styled(app.center_coords(), Style::default().fg(Color::Cyan)),
        Span::styled(
            " | tab/1-3:view ←→:year space:pause hjkl:pan +/-:zoom r:reset q:quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(status), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_regions_do_not_overlap() {
        let screen = layout(Rect::new(0, 0, 140, 50), View::Annual);
        assert_eq!(screen.menu.width, SIDEBAR_WIDTH);
        assert_eq!(screen.map.x, SIDEBAR_WIDTH);
        assert_eq!(screen.control.y, screen.header.bottom());
        assert_eq!(screen.map.y, screen.control.bottom());
        assert_eq!(screen.status.bottom(), 50);

        let inner = screen.map_inner();
        assert_eq!(inner.x, screen.map.x + 1);
        assert_eq!(inner.width, screen.map.width - 2);
    }

    #[test]
    fn test_trend_header_is_taller() {
        let area = Rect::new(0, 0, 140, 50);
        let trends = layout(area, View::Trends);
        let cumulative = layout(area, View::Cumulative);
        assert!(trends.header.height > cumulative.header.height);
        assert!(trends.map.height < cumulative.map.height);
    }

    #[test]
    fn test_slider_knob_tracks_year() {
        assert_eq!(slider_track(1900, 1900, 2022, 5), "●━━━━");
        assert_eq!(slider_track(2022, 1900, 2022, 5), "━━━━●");
        assert_eq!(slider_track(1961, 1900, 2022, 5).chars().nth(2), Some('●'));
    }

    #[test]
    fn test_hover_lines_follow_slice_columns() {
        use crate::data::{fixtures::sample_table, year_slice, Selector};
        let table = sample_table();

        let first = year_slice(&table, Selector::Year(1900)).unwrap();
        let lines = hover_lines(&first, first.row("Norway").unwrap());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].to_string(), "Production: 0.1 EJ");

        let later = year_slice(&table, Selector::Year(1902)).unwrap();
        let lines = hover_lines(&later, later.row("Qatar").unwrap());
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].to_string(), "Increasing rate from the last year: n/a");
    }
}
