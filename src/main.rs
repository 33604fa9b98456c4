mod case;
mod clock;
mod config;
mod dashboard;
mod media;
mod notice;
mod phase;
mod speech;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use parking_lot::Mutex;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use case::CaseBook;
use clock::SystemClock;
use config::Config;
use dashboard::{Dashboard, View};
use media::{MediaLibrary, ThumbnailManager};
use phase::Phase;
use speech::{CommandPlayer, HttpSynthesizer, NullPlayer, Playback, SpeechController, Synthesizer};

#[derive(Parser, Debug)]
#[command(name = "threat-console")]
#[command(about = "Drone surveillance threat dashboard for the terminal")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "~/.config/threat-console/config.toml")]
    config: String,

    /// Case fixture file (TOML); overrides `cases_file` from the config
    #[arg(long)]
    cases: Option<String>,

    /// Case to select at startup
    #[arg(long)]
    case: Option<u32>,

    /// Rotate to the next case every N seconds (0 disables)
    #[arg(long, value_name = "SECS")]
    rotate: Option<u64>,

    /// Never render images, even if the terminal supports it
    #[arg(long)]
    no_images: bool,

    /// Log file path
    #[arg(long)]
    log_file: Option<String>,
}

fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("threat-console").join("threat-console.log"))
}

fn open_log(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// The TUI owns the terminal, so logs go to a file. Stderr is the last resort.
fn init_logging(log_file: Option<&str>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "threat_console=info".into());

    let path = match log_file {
        Some(p) => Some(PathBuf::from(shellexpand::tilde(p).as_ref())),
        None => default_log_path(),
    };
    let file = path.as_deref().and_then(|p| open_log(p).ok());

    match file {
        Some(file) => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::sync::Mutex::new(file)),
            )
            .init(),
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .init(),
    }
}

fn load_cases(cli: &Cli, config: &Config) -> Result<CaseBook> {
    let path = match (&cli.cases, &config.cases_file) {
        (Some(p), _) => PathBuf::from(shellexpand::tilde(p).as_ref()),
        (None, Some(p)) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).as_ref()),
        (None, None) => {
            tracing::info!("No case file configured, using demo cases");
            return Ok(CaseBook::demo());
        }
    };

    CaseBook::load(&path).with_context(|| format!("Failed to load cases from {}", path.display()))
}

fn build_speech(config: &Config) -> SpeechController {
    let speech = &config.speech;
    let synthesizer: Option<Arc<dyn Synthesizer>> = match speech.resolve_api_key() {
        Some(key) => match HttpSynthesizer::new(speech, key) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Speech disabled: {}", e);
                None
            }
        },
        None => {
            tracing::info!("No speech API key in ${}, briefings disabled", speech.api_key_env);
            None
        }
    };
    SpeechController::new(synthesizer, &speech.model, &speech.voice)
}

fn build_player(config: &Config) -> Box<dyn Playback> {
    match CommandPlayer::new(config.speech.player.clone(), CommandPlayer::default_dir()) {
        Some(player) => Box::new(player),
        None => Box::new(NullPlayer),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref());

    let mut config = Config::load(&cli.config)?;
    if let Some(secs) = cli.rotate {
        config.timing.rotation_secs = secs;
    }
    let theme = config.resolve_theme();
    let book = load_cases(&cli, &config)?;

    let root = shellexpand::tilde(&config.assets.root.to_string_lossy()).into_owned();
    let library = MediaLibrary::new(root);

    // Graphics protocol detection must happen before raw mode
    let thumbnails = if cli.no_images || !config.appearance.thumbnails {
        None
    } else {
        Some(Arc::new(Mutex::new(ThumbnailManager::new())))
    };

    let mut dashboard = Dashboard::new(
        book,
        &config.timing,
        build_speech(&config),
        build_player(&config),
        Arc::new(SystemClock),
    );
    if let Some(id) = cli.case {
        if !dashboard.select_case(id) {
            tracing::warn!("Case {} not found, keeping case {}", id, dashboard.selected_id());
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let console = Console {
        config: &config,
        library: &library,
        thumbnails: thumbnails.as_ref(),
        theme: &theme,
    };
    let result = run_app(&mut terminal, &mut dashboard, &console);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("Console closed");
    result
}

/// Everything the loop needs besides the dashboard
struct Console<'a> {
    config: &'a Config,
    library: &'a MediaLibrary,
    thumbnails: Option<&'a Arc<Mutex<ThumbnailManager>>>,
    theme: &'a ui::Theme,
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    dashboard: &mut Dashboard,
    console: &Console<'_>,
) -> Result<()> {
    let assets = &console.config.assets;

    loop {
        dashboard.tick();

        if dashboard.take_media_dirty() {
            match console.thumbnails {
                Some(manager) => dashboard.probe_media(console.library, assets, &mut manager.lock()),
                None => dashboard.probe_media(console.library, assets, &mut ThumbnailManager::disabled()),
            }
        }

        terminal.draw(|f| ui::draw(f, dashboard, assets, console.thumbnails, console.theme))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(dashboard, key) {
                    return Ok(());
                }
            }
        }
    }
}

/// Apply one key press. Returns true when the console should quit.
fn handle_key(dashboard: &mut Dashboard, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(id) = c.to_digit(10) {
                dashboard.select_case(id);
            }
        }
        KeyCode::Tab => dashboard.next_case(),
        KeyCode::BackTab => dashboard.previous_case(),
        KeyCode::Char('d') => dashboard.set_view(View::Drone),
        KeyCode::Char('m') => dashboard.set_view(View::Map),
        KeyCode::Char('s') => dashboard.set_view(View::Summary),
        KeyCode::Char('e') => {
            dashboard.force_phase(Phase::EnRoute);
        }
        KeyCode::Char('x') => {
            dashboard.force_phase(Phase::Scanning);
        }
        KeyCode::Char('n') => {
            dashboard.request_negotiation();
        }
        KeyCode::Char('r') => dashboard.read_briefing(),
        _ => {}
    }
    false
}
