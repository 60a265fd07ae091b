mod app;
mod braille;
mod data;
mod map;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use visitmap::{CoordinateResolver, MapConfig};

/// Frame interval (~60fps)
const FRAME: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(name = "visitmap", about = "Terminal map of visited countries")]
struct Args {
    /// Map data JSON ({"countries": [...]}); a demo dataset is used if omitted
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Country boundary GeoJSON or TopoJSON
    #[arg(short, long, default_value = "data/countries.geojson")]
    boundaries: PathBuf,

    /// Map configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extra country centroids ({"KR": [lat, lon], ...})
    #[arg(long)]
    coords: Option<PathBuf>,

    /// Log file; the terminal is owned by the UI
    #[arg(long, default_value = "visitmap.log")]
    log_file: PathBuf,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let config = match &args.config {
        Some(path) => MapConfig::load(path)?,
        None => MapConfig::default(),
    };
    let mut resolver = CoordinateResolver::new(config.fallback);
    if let Some(path) = &args.coords {
        let added = resolver.load_overrides(path)?;
        log::info!("Loaded {} coordinate overrides", added);
    }
    let map_data = match &args.data {
        Some(path) => data::load_map_data(path)?,
        None => data::demo_data(),
    };

    // Initialize terminal
    let mut terminal = ratatui::init();
    terminal.clear()?;

    // Enable mouse capture
    execute!(std::io::stdout(), EnableMouseCapture)?;

    let size = terminal.size()?;
    let boundary_rx = data::spawn_boundary_load(args.boundaries.clone());
    let app = App::new(
        config,
        resolver,
        map_data,
        boundary_rx,
        size.width as usize,
        size.height as usize,
    );

    // Run the app
    let result = run(&mut terminal, app, &args);

    // Disable mouse capture and restore terminal
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();

    result
}

/// Handle mouse events for panning, zooming and clicks
fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) {
    app.set_mouse_pos(mouse.column, mouse.row);

    match mouse.kind {
        // Scroll wheel for zooming towards mouse position
        MouseEventKind::ScrollUp => app.zoom_in_at(mouse.column, mouse.row, now),
        MouseEventKind::ScrollDown => app.zoom_out_at(mouse.column, mouse.row, now),
        // Horizontal scroll for panning (trackpad two-finger swipe)
        MouseEventKind::ScrollLeft => app.pan(-15, 0),
        MouseEventKind::ScrollRight => app.pan(15, 0),
        MouseEventKind::Down(MouseButton::Left) => app.begin_drag(mouse.column, mouse.row),
        MouseEventKind::Drag(MouseButton::Left) => app.handle_drag(mouse.column, mouse.row),
        MouseEventKind::Up(MouseButton::Left) => app.end_drag(mouse.column, mouse.row),
        _ => {}
    }
}

fn run(terminal: &mut DefaultTerminal, mut app: App, args: &Args) -> Result<()> {
    loop {
        terminal.draw(|frame| ui::render(frame, &app))?;

        // Wake for the next frame or the next debounced event, whichever is sooner
        let now = Instant::now();
        let timeout = app
            .next_deadline()
            .map(|d| d.saturating_duration_since(now).min(FRAME))
            .unwrap_or(FRAME);

        if event::poll(timeout)? {
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => app.quit(),

                    // Pan with hjkl or arrow keys
                    KeyCode::Left | KeyCode::Char('h') => app.pan(-10, 0),
                    KeyCode::Right | KeyCode::Char('l') => app.pan(10, 0),
                    KeyCode::Up | KeyCode::Char('k') => app.pan(0, -6),
                    KeyCode::Down | KeyCode::Char('j') => app.pan(0, 6),

                    // Zoom
                    KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(now),
                    KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(now),

                    // Layer toggles
                    KeyCode::Char('b') | KeyCode::Char('B') => {
                        app.settings.show_regions = !app.settings.show_regions;
                    }
                    KeyCode::Char('t') | KeyCode::Char('T') => {
                        app.settings.show_routes = !app.settings.show_routes;
                    }
                    KeyCode::Char('c') | KeyCode::Char('C') => {
                        app.settings.show_clusters = !app.settings.show_clusters;
                    }
                    KeyCode::Char('L') => {
                        app.settings.show_labels = !app.settings.show_labels;
                    }
                    KeyCode::Char('g') | KeyCode::Char('G') => {
                        app.settings.show_legend = !app.settings.show_legend;
                    }

                    // Refit to the data
                    KeyCode::Char('r') | KeyCode::Char('0') => app.refit(),

                    // Reload the data file
                    KeyCode::Char('R') => {
                        if let Some(path) = &args.data {
                            match data::load_map_data(path) {
                                Ok(map_data) => app.set_data(map_data),
                                Err(e) => log::warn!("Reload failed: {:#}", e),
                            }
                        }
                    }

                    _ => {}
                },
                Event::Mouse(mouse) => handle_mouse(&mut app, mouse, now),
                Event::Resize(width, height) => app.resize(width, height, now),
                _ => {}
            }
        }

        app.tick(Instant::now());

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
