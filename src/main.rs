use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use visa_map::app::App;
use visa_map::data::{self, DataPaths};
use visa_map::ui;

#[derive(Parser)]
#[command(name = "visa-map")]
#[command(
    version,
    about = "World map of visa requirements for a chosen passport",
    long_about = None
)]
struct Cli {
    /// Directory holding countries.json, world-110m.json and data.json
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Country list (overrides --data-dir)
    #[arg(long)]
    countries: Option<PathBuf>,

    /// World geometry, TopoJSON or GeoJSON (overrides --data-dir)
    #[arg(long)]
    world: Option<PathBuf>,

    /// Visa requirement data (overrides --data-dir)
    #[arg(long)]
    visas: Option<PathBuf>,

    /// Passport to select on startup, e.g. US
    #[arg(short, long)]
    passport: Option<String>,

    /// Log file; the terminal is taken by the map
    #[arg(long, default_value = "visa-map.log")]
    log_file: PathBuf,

    /// Debug logging unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn data_paths(&self) -> DataPaths {
        let defaults = DataPaths::in_dir(&self.data_dir);
        DataPaths {
            countries: self.countries.clone().unwrap_or(defaults.countries),
            world: self.world.clone().unwrap_or(defaults.world),
            visas: self.visas.clone().unwrap_or(defaults.visas),
        }
    }
}

fn init_logging(path: &Path, verbose: bool) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_file, cli.verbose)?;

    // Nothing renders unless all three documents load
    let paths = cli.data_paths();
    let atlas = match data::load_all(&paths) {
        Ok(atlas) => atlas,
        Err(e) => {
            error!(error = %e, "failed to load map data");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    execute!(std::io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let app = App::new(atlas, size.width as usize, size.height as usize);
    let result = run(&mut terminal, app, cli.passport.as_deref());

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for hover, panning and zooming
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    app.on_hover(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel zooms towards the mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        // Click and drag to pan
        MouseEventKind::Down(MouseButton::Left) => {
            app.last_mouse = Some((mouse.column, mouse.row));
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_drag(mouse.column, mouse.row);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            app.end_drag();
        }
        _ => {}
    }
}

/// Keys while the search box has focus
fn handle_search_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.search.blur(),
        KeyCode::Enter => app.accept_suggestion(),
        KeyCode::Down | KeyCode::Tab => app.search.move_down(),
        KeyCode::Up | KeyCode::BackTab => app.search.move_up(),
        KeyCode::Backspace => app.search.backspace(&app.countries),
        KeyCode::Char(c) => app.search.push_char(c, &app.countries),
        _ => {}
    }
}

/// Keys while the map has focus
fn handle_map_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        KeyCode::Char('/') => app.search.focus(),

        // Pan with hjkl or arrow keys
        KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
        KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
        KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
        KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

        // Zoom
        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),

        // Layer toggles
        KeyCode::Char('o') | KeyCode::Char('O') => app.map_renderer.toggle_outlines(),
        KeyCode::Char('g') | KeyCode::Char('G') => app.map_renderer.toggle_legend(),

        // Reset view
        KeyCode::Char('r') | KeyCode::Char('0') => app.reset_view(),

        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, mut app: App, passport: Option<&str>) -> Result<()> {
    if !app.map_renderer.has_data() {
        warn!("no country shapes matched the country list");
    }

    if let Some(code) = passport {
        if let Err(e) = app.on_select(code) {
            warn!(error = %e, "startup passport rejected");
            app.message = Some(e.to_string());
        }
    }

    info!("entering event loop");

    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // ~60fps target
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                // Only handle key press events (not release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.search.focused {
                        handle_search_key(&mut app, key);
                    } else {
                        handle_map_key(&mut app, key);
                    }
                }
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse),
                Event::Resize(width, height) => app.resize(width as usize, height as usize),
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
