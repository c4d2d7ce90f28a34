use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use metar_raspi::api::{AviationWeatherClient, MetarSource, explain_missing};
use metar_raspi::config::MetarRaspiConfig;
use metar_raspi::models::{Ident, MetarReport, WindDirection};
use metar_raspi::plate::{ConsoleKeypad, ConsoleLcd, Plate};
use metar_raspi::screen::{HeadlessSurface, Layout, Screen};
use metar_raspi::{MetarError, logging};

#[derive(Parser)]
#[command(name = "metar-raspi")]
#[command(about = "Live METAR weather on a Raspberry Pi touchscreen or LCD plate")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the touchscreen display
    Screen {
        /// Station to show instead of the saved one
        #[arg(short, long)]
        station: Option<String>,

        /// Render one frame to a PNG file and exit
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Run the LCD plate display in the terminal
    Plate {
        /// Station to show instead of the saved one
        #[arg(short, long)]
        station: Option<String>,
    },
    /// Fetch and print the current report for a station
    Report {
        /// ICAO station identifier, e.g. KJFK
        station: String,
    },
}

fn main() {
    if let Err(e) = run() {
        match e.downcast_ref::<MetarError>() {
            Some(metar) => eprintln!("Error: {}", metar.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        debug!("{e:?}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = MetarRaspiConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli.command, config))
}

async fn dispatch(command: Commands, config: MetarRaspiConfig) -> Result<()> {
    let source: Arc<dyn MetarSource> = Arc::new(AviationWeatherClient::new(&config.source)?);

    match command {
        Commands::Screen { station, snapshot } => {
            let station = station.as_deref().map(Ident::parse).transpose()?;
            run_screen(source, &config, station, snapshot).await
        }
        Commands::Plate { station } => {
            let station = station.as_deref().map(Ident::parse).transpose()?;
            let lcd = ConsoleLcd::stdout(config.plate.cols.into(), config.plate.rows.into());
            let mut plate = Plate::new(lcd, ConsoleKeypad::spawn()?, source, &config)?;
            if let Some(ident) = station {
                plate = plate.with_station(ident);
            }
            plate.run().await?;
            Ok(())
        }
        Commands::Report { station } => {
            let ident = Ident::parse(&station)?;
            print_report(source.as_ref(), &ident).await
        }
    }
}

async fn run_screen(
    source: Arc<dyn MetarSource>,
    config: &MetarRaspiConfig,
    station: Option<Ident>,
    snapshot: Option<PathBuf>,
) -> Result<()> {
    let layout = Layout::load(&config.screen)?;
    info!("Using {}x{} layout", layout.width, layout.height);

    if let Some(path) = snapshot {
        let surface = HeadlessSurface::new(layout.width, layout.height);
        let mut screen = Screen::new(surface, layout, source, config)?;
        if let Some(ident) = station {
            screen = screen.with_station(ident);
        }
        screen.snapshot(&path).await?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    run_window(source, config, layout, station).await
}

#[cfg(feature = "window")]
async fn run_window(
    source: Arc<dyn MetarSource>,
    config: &MetarRaspiConfig,
    layout: Layout,
    station: Option<Ident>,
) -> Result<()> {
    use metar_raspi::screen::WindowSurface;

    let surface = WindowSurface::new(layout.width, layout.height, config.screen.scale);
    let mut screen = Screen::new(surface, layout, source, config)?;
    if let Some(ident) = station {
        screen = screen.with_station(ident);
    }
    screen.run().await?;
    Ok(())
}

#[cfg(not(feature = "window"))]
async fn run_window(
    _source: Arc<dyn MetarSource>,
    _config: &MetarRaspiConfig,
    _layout: Layout,
    _station: Option<Ident>,
) -> Result<()> {
    Err(MetarError::display(
        "built without the `window` feature; use --snapshot or rebuild with --features window",
    )
    .into())
}

async fn print_report(source: &dyn MetarSource, ident: &Ident) -> Result<()> {
    match source.latest(ident).await? {
        Some(report) => {
            for line in report_lines(&report) {
                println!("{line}");
            }
            Ok(())
        }
        None => {
            let reason = explain_missing(source, ident).await?;
            Err(anyhow!("No current report for {ident} ({reason:?})"))
        }
    }
}

fn report_lines(report: &MetarReport) -> Vec<String> {
    let mut lines = vec![
        report.raw.clone(),
        format!("Flight rules: {}", report.effective_flight_rules()),
    ];
    if let Some(time) = report.time {
        lines.push(format!("Observed: {}", time.format("%Y-%m-%d %H:%MZ")));
    }

    let wind = &report.wind;
    let direction = match wind.direction {
        Some(WindDirection::Degrees(deg)) => format!("{deg:03}"),
        Some(WindDirection::Variable) => "VRB".to_string(),
        None => "---".to_string(),
    };
    let mut wind_line = match wind.speed_kt {
        Some(0) => "Wind: calm".to_string(),
        Some(speed) => format!("Wind: {direction} at {speed} kt"),
        None => "Wind: missing".to_string(),
    };
    if let Some(gust) = wind.gust_kt {
        wind_line.push_str(&format!(" gusting {gust} kt"));
    }
    if let Some((from, to)) = wind.variable_range {
        wind_line.push_str(&format!(" varying {from:03}-{to:03}"));
    }
    lines.push(wind_line);

    if let Some(visibility) = report.visibility {
        lines.push(format!("Visibility: {visibility} SM"));
    }
    if let (Some(hpa), Some(inhg)) = (report.altimeter_hpa, report.altimeter_inhg()) {
        lines.push(format!("Altimeter: {inhg:.2} inHg ({hpa:.0} hPa)"));
    }
    if let Some(temperature) = report.temperature {
        lines.push(format!("Temperature: {temperature}C"));
    }
    if let Some(dewpoint) = report.dewpoint {
        lines.push(format!("Dewpoint: {dewpoint}C"));
    }
    if let Some(humidity) = report.relative_humidity() {
        lines.push(format!("Humidity: {humidity:.0}%"));
    }
    if !report.clouds.is_empty() {
        let clouds: Vec<String> = report.clouds.iter().map(|layer| layer.repr()).collect();
        lines.push(format!("Clouds: {}", clouds.join(" ")));
    }
    if !report.wx_codes.is_empty() {
        lines.push(format!("Weather: {}", report.wx_codes.join(" ")));
    }
    if let Some(remarks) = &report.remarks {
        lines.push(format!("Remarks: {remarks}"));
    }
    lines
}
