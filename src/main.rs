use blindtyper::{
    app::{App, Flow},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    quote_source::{BaconIpsum, BundledQuotes, QuoteSource, QuoteType, StaticQuote},
    runtime::{CrosstermEventSource, Runner},
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    sync::Arc,
    time::Duration,
};
use tracing::info;

const POLL_INTERVAL_MS: u64 = 100;

/// blind typing practice with live cpm, wpm and accuracy
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// custom quote to type instead of fetching one
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// pick a bundled quote instead of calling the quote service
    #[clap(long)]
    offline: bool,

    /// number of paragraphs to request from the quote service
    #[clap(long)]
    paragraphs: Option<u8>,

    /// kind of filler text to request
    #[clap(long, value_enum)]
    quote_type: Option<QuoteType>,

    /// how often live speed is refreshed, in milliseconds
    #[clap(long)]
    tick_ms: Option<u64>,

    /// base url of the quote service
    #[clap(long)]
    api_url: Option<String>,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line flags win over the config file
    fn apply(&self, config: &mut Config) {
        if self.offline {
            config.offline = true;
        }
        if let Some(paragraphs) = self.paragraphs {
            config.paragraphs = paragraphs;
        }
        if let Some(quote_type) = self.quote_type {
            config.quote_type = quote_type;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_interval_ms = tick_ms;
        }
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
    }

    fn quote_source(&self, config: &Config) -> Result<Arc<dyn QuoteSource>, Box<dyn Error>> {
        let source: Arc<dyn QuoteSource> = match (&self.prompt, config.offline) {
            (Some(prompt), _) => Arc::new(StaticQuote(prompt.clone())),
            (None, true) => Arc::new(BundledQuotes::new()?),
            (None, false) => Arc::new(BaconIpsum::new(
                config.api_url.clone(),
                config.quote_type,
                config.paragraphs,
            )),
        };
        Ok(source)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = match AppDirs::state_dir() {
        Some(dir) => logging::init(&dir)?,
        None => None,
    };

    let store = FileConfigStore::new();
    let mut config = store.load();
    cli.apply(&mut config);
    if cli.save_config {
        store.save(&config)?;
        info!(path = %store.path().display(), "config saved");
    }

    let source = cli.quote_source(&config)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, source, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    source: Arc<dyn QuoteSource>,
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(POLL_INTERVAL_MS),
    );
    let mut app = App::new(
        source,
        runner.sender(),
        Duration::from_millis(config.tick_interval_ms.max(1)),
    );

    info!("starting");
    app.request_quote();
    terminal.draw(|f| f.render_widget(&app, f.area()))?;

    loop {
        let Some(event) = runner.step() else {
            continue;
        };

        if app.on_event(event) == Flow::Quit {
            break;
        }

        terminal.draw(|f| f.render_widget(&app, f.area()))?;
    }

    info!("exiting");
    Ok(())
}
