use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use gas_map::animation::{self, Animation, GifOptions};
use gas_map::app::{App, AppOptions, Dataset, View};
use gas_map::data::{load_countries, unmatched_corrections, LongTable, Workbook};
use gas_map::settings::Settings;
use gas_map::ui;
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let settings = Settings::load().context("loading settings")?;
    let _guard = init_logging(&settings)?;

    // Everything heavy happens before the terminal switches to the alternate screen
    let dataset = load(&settings)?;

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    // Run the app
    let result = run(&mut terminal, dataset, &settings);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    if let Err(ref e) = result {
        tracing::error!("exiting: {:#}", e);
    }
    result
}

/// File logging; the terminal belongs to the UI
fn init_logging(settings: &Settings) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&settings.log_dir)
        .with_context(|| format!("creating log directory {}", settings.log_dir.display()))?;
    let appender = tracing_appender::rolling::never(&settings.log_dir, "gas-map.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// Read the workbook and geometry, then precompute and export the animation
fn load(settings: &Settings) -> Result<Dataset> {
    let workbook = Workbook::load(&settings.workbook, &settings.yearly_sheet, &settings.cumulative_sheet)
        .context("loading production workbook")?;
    let table = LongTable::build(&workbook.yearly, &workbook.cumulative).context("reshaping production data")?;

    let countries = load_countries(&settings.countries, &settings.sovereign_key).context("loading country geometry")?;
    for name in unmatched_corrections(&countries) {
        tracing::warn!(name, "corrected country name has no geometry match");
    }

    let animation = Animation::build(&table, &countries);
    let inputs = [settings.workbook.as_path(), settings.countries.as_path()];
    if animation::is_up_to_date(&settings.gif_path, &inputs) {
        tracing::info!("animation {} is current", settings.gif_path.display());
    } else {
        let options = GifOptions {
            width: settings.gif_width,
            height: settings.gif_height,
            delay_ms: settings.frame_delay_ms(),
        };
        animation::write_gif(&animation, &countries, &settings.gif_path, options).context("writing animation")?;
    }

    Ok(Dataset {
        table,
        countries,
        animation,
    })
}

/// Handle mouse events for hovering, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) -> Result<()> {
    // Always track mouse position for hover details
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click a menu entry, or click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => app.click(mouse.column, mouse.row)?,
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode) -> Result<()> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Views
        KeyCode::Tab => app.next_view()?,
        KeyCode::Char('1') => app.set_view(View::Cumulative)?,
        KeyCode::Char('2') => app.set_view(View::Annual)?,
        KeyCode::Char('3') => app.set_view(View::Trends)?,

        // Year slider
        KeyCode::Left => app.step_year(-1)?,
        KeyCode::Right => app.step_year(1)?,
        KeyCode::PageDown => app.step_year(-10)?,
        KeyCode::PageUp => app.step_year(10)?,
        KeyCode::Home => app.step_year(i32::MIN)?,
        KeyCode::End => app.step_year(i32::MAX)?,
        KeyCode::Char(' ') => app.toggle_pause(),

        // Pan with hjkl or vertical arrows
        KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        KeyCode::Char('b') | KeyCode::Char('B') => app.map_renderer.toggle_borders(),
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
    Ok(())
}

fn run(terminal: &mut DefaultTerminal, dataset: Dataset, settings: &Settings) -> Result<()> {
    let size = terminal.size()?;
    let options = AppOptions {
        cumulative_cmax: settings.cumulative_cmax,
        frame_interval: Duration::from_millis(settings.frame_delay_ms() as u64),
    };
    let mut app = App::new(dataset, options, size.width, size.height)?;

    // Main loop
    loop {
        // Draw
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Handle events with ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(&mut app, key.code)?,
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse)?,
                Event::Resize(width, height) => app.resize(width, height),
                _ => {}
            }
        }

        app.tick(Instant::now())?;

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
