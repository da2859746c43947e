use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rate_alarm::alert::{ring_bell, BellAlerter};
use rate_alarm::data::{Board, Horizon};
use rate_alarm::ui::{self, Theme};
use rate_alarm::{
    events, App, BoardSink, FileFetcher, HttpFetcher, LogSink, PageFetcher, PageParser,
    RateMonitor, Settings, Worker,
};

const DEFAULT_LOG_FILTER: &str = "rate_alarm=info";

#[derive(Parser, Debug)]
#[command(name = "rate-alarm")]
#[command(about = "Terminal alarm for liquidity stress in repo rates")]
struct Args {
    /// Settings file (TOML) [default: rate-alarm.toml if present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quotes page to poll
    #[arg(short, long, conflicts_with = "file")]
    url: Option<String>,

    /// Read the page from a local file instead of the network
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Domestic-currency stress threshold, in percent
    #[arg(long)]
    target_domestic: Option<f64>,

    /// Foreign-currency stress threshold, in percent
    #[arg(long)]
    target_foreign: Option<f64>,

    /// Log labels instead of drawing the terminal UI
    #[arg(long, conflicts_with = "once")]
    headless: bool,

    /// Fetch and parse one page, print the reading as JSON and exit
    #[arg(long)]
    once: bool,

    /// Log file used while the terminal UI owns the screen
    #[arg(long, default_value = "rate-alarm.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.as_deref();
    let mut settings = Settings::load(config_path).with_context(|| match config_path {
        Some(path) => format!("Failed to load settings from {}", path.display()),
        None => "Failed to load settings".to_string(),
    })?;
    if let Some(ref url) = args.url {
        settings.url = url.clone();
    }
    if let Some(domestic) = args.target_domestic {
        settings.thresholds.domestic = domestic;
    }
    if let Some(foreign) = args.target_foreign {
        settings.thresholds.foreign = foreign;
    }
    settings.validate()?;

    let tui = !(args.headless || args.once);
    init_logging(tui.then_some(&args.log_file))?;

    let fetcher = build_fetcher(&args, &settings)?;
    info!(
        source = fetcher.description(),
        domestic = settings.thresholds.domestic,
        foreign = settings.thresholds.foreign,
        "Starting rate alarm"
    );

    if args.once {
        return run_once(fetcher, &settings);
    }
    if args.headless {
        return run_headless(fetcher, &settings);
    }
    run_tui(fetcher, &settings)
}

/// Send logs to stderr, or to a file while the TUI owns the terminal.
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
    }
    Ok(())
}

fn build_fetcher(args: &Args, settings: &Settings) -> Result<Box<dyn PageFetcher>> {
    if let Some(ref path) = args.file {
        return Ok(Box::new(FileFetcher::new(path)));
    }

    let mut builder = HttpFetcher::builder()
        .url(settings.url.clone())
        .timeout(settings.request_timeout()?);
    if let Some(ref user_agent) = settings.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }
    Ok(Box::new(builder.build()?))
}

fn build_monitor(settings: &Settings) -> RateMonitor {
    RateMonitor::new(
        Box::new(settings.page_parser()),
        settings.thresholds,
        settings.currencies.clone(),
    )
}

/// Fetch and parse a single page, printing the reading as JSON.
fn run_once(mut fetcher: Box<dyn PageFetcher>, settings: &Settings) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let text = rt.block_on(fetcher.refresh())?;

    let reading = settings.page_parser().parse(&text)?;
    let thresholds = settings.thresholds;
    let output = serde_json::json!({
        "source": fetcher.description(),
        "reading": reading,
        "stressed_1d": thresholds.horizon_stressed(&reading, Horizon::OneDay),
        "stressed_7d": thresholds.horizon_stressed(&reading, Horizon::SevenDay),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Run the worker with a logging sink until interrupted.
fn run_headless(fetcher: Box<dyn PageFetcher>, settings: &Settings) -> Result<()> {
    let worker = Worker::new(
        fetcher,
        build_monitor(settings),
        Box::new(LogSink::new(Board::new(&settings.currencies))),
        Box::new(BellAlerter::new(io::stdout(), settings.alert)),
        settings.cadence()?,
        settings.backoff()?,
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        tokio::select! {
            _ = worker.run() => {}
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted, shutting down");
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Run the TUI on this thread while the worker runs on a tokio runtime.
fn run_tui(fetcher: Box<dyn PageFetcher>, settings: &Settings) -> Result<()> {
    let description = fetcher.description().to_string();
    let (sink, board_rx) = BoardSink::create(Board::new(&settings.currencies));
    let alerter = sink.alerter();
    let worker = Worker::new(
        fetcher,
        build_monitor(settings),
        Box::new(sink),
        Box::new(alerter),
        settings.cadence()?,
        settings.backoff()?,
    );
    let wake = worker.wake_handle();

    let rt = tokio::runtime::Runtime::new()?;
    let handle = rt.spawn(worker.run());

    let theme = Theme::auto_detect();
    let mut app = App::new(
        board_rx,
        wake,
        settings.thresholds,
        settings.alert,
        description,
        theme,
    );

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, &mut app);

    // Stop the worker; a cycle in flight is simply dropped
    handle.abort();
    rt.shutdown_timeout(Duration::from_secs(1));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!("Rate alarm stopped");
    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.poll_board();

        let bells = app.take_bells();
        if bells > 0 {
            ring_bell(terminal.backend_mut(), bells)?;
        }

        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }
    }

    Ok(())
}
