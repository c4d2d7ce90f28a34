//! LCD plate display target
//!
//! Line 1 shows `IDEN HHMMZ FTRL`, line 2 scrolls the rest of the report
//! and the backlight shows the flight rules color. While the report is on
//! screen, Select opens the station picker and Left+Right opens the exit
//! menu.

pub mod console;
pub mod display;
pub mod lcd;
pub mod menu;
pub mod scroll;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{debug, error, info, warn};

use crate::api::{MetarSource, MissingReason, explain_missing};
use crate::config::{MetarRaspiConfig, PlateConfig, UpdateConfig};
use crate::models::Ident;
use crate::session::Session;
use crate::system::ExitAction;
use crate::weather::{RefreshOutcome, StationWeather};
use crate::{MetarError, Result};

pub use console::{ConsoleKeypad, ConsoleLcd};
pub use display::{PlateLines, display_lines};
pub use lcd::{Backlight, Button, ButtonSet, CharLcd, Keypad, LcdBuffer};
pub use menu::{ConfirmEvent, ConfirmExit, PickerEvent, StationPicker};
pub use scroll::{ScrollFrame, scroll_frames};

/// Time to read a message before moving on to the picker
const MESSAGE_HOLD: Duration = Duration::from_secs(3);
/// Time to lift a finger off the button that opened a menu
const RELEASE_DELAY: Duration = Duration::from_secs(1);

/// Whether the program keeps running after a menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Button combinations that interrupt the main view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    Select,
    Exit,
}

pub struct Plate<L: CharLcd, K: Keypad> {
    lcd: L,
    keypad: K,
    source: Arc<dyn MetarSource>,
    settings: PlateConfig,
    update: UpdateConfig,
    weather: StationWeather,
    session: Session,
    session_path: PathBuf,
    exit: ExitAction,
}

impl<L: CharLcd, K: Keypad> Plate<L, K> {
    /// Create a plate, restoring the station from the saved session
    pub fn new(
        lcd: L,
        keypad: K,
        source: Arc<dyn MetarSource>,
        config: &MetarRaspiConfig,
    ) -> Result<Self> {
        let session_path = config.session_path();
        let session = Session::load(&session_path, &config.default_station);
        let ident = Ident::parse(&session.station)?;

        Ok(Self {
            lcd,
            keypad,
            source,
            settings: config.plate.clone(),
            update: config.update.clone(),
            weather: StationWeather::new(ident),
            session,
            session_path,
            exit: ExitAction::from_config(&config.system),
        })
    }

    /// Start on `ident` instead of the saved station
    #[must_use]
    pub fn with_station(mut self, ident: Ident) -> Self {
        self.weather.set_station(ident);
        self.session.station = ident.station();
        self
    }

    #[must_use]
    pub fn lcd(&self) -> &L {
        &self.lcd
    }

    #[must_use]
    pub fn weather(&self) -> &StationWeather {
        &self.weather
    }

    /// Fetch and display reports until the user exits
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting plate display for {}", self.weather.ident());
        loop {
            if self.update().await? == Flow::Quit {
                return Ok(());
            }
            if self.main_view().await? == Flow::Quit {
                return Ok(());
            }
        }
    }

    /// Fetch until there is a report to show
    async fn update(&mut self) -> Result<Flow> {
        loop {
            let ident = self.weather.ident();
            let result = self.source.latest(&ident).await;

            match self.weather.apply(result) {
                RefreshOutcome::Updated | RefreshOutcome::Unchanged => return Ok(Flow::Continue),
                RefreshOutcome::NoReport => {
                    if self.weather.report().is_some() {
                        return Ok(Flow::Continue);
                    }
                    let reason = match explain_missing(self.source.as_ref(), &ident).await {
                        Ok(reason) => {
                            info!("No weather data for {}: {:?}", ident, reason);
                            Some(reason)
                        }
                        Err(e) => {
                            warn!("Could not look up station {}: {}", ident, e);
                            None
                        }
                    };
                    if self.bad_station(reason).await? == Flow::Quit {
                        return Ok(Flow::Quit);
                    }
                }
                RefreshOutcome::Failed(e) => {
                    self.show_failure(&e).await?;
                    if self.weather.report().is_some() {
                        return Ok(Flow::Continue);
                    }
                }
            }
        }
    }

    fn show_message(&mut self, text: &str, light: Backlight) -> Result<()> {
        self.lcd.show_cursor(false);
        self.lcd.set_backlight(light);
        self.lcd.clear();
        self.lcd.message(text);
        self.lcd.flush()
    }

    async fn show_failure(&mut self, e: &MetarError) -> Result<()> {
        if e.is_transient() {
            warn!("Connection problem: {}", e);
            self.show_message("No connection\nCheck back soon", Backlight::White)?;
        } else {
            error!("Report update error: {}", e);
            self.show_message("There was an\nunknown error", Backlight::White)?;
        }
        sleep(self.update.retry()).await;
        Ok(())
    }

    async fn bad_station(&mut self, reason: Option<MissingReason>) -> Result<Flow> {
        let station = self.weather.ident().station();
        self.show_message(&missing_message(&station, reason), Backlight::White)?;
        sleep(MESSAGE_HOLD).await;
        self.select_station().await
    }

    /// Let the user edit the station identifier
    async fn select_station(&mut self) -> Result<Flow> {
        let mut picker = StationPicker::new(self.weather.ident());
        self.lcd.set_backlight(Backlight::White);
        picker.render(&mut self.lcd);
        self.lcd.flush()?;
        sleep(RELEASE_DELAY).await;

        loop {
            match picker.handle(self.keypad.poll()) {
                PickerEvent::Idle => {}
                PickerEvent::Changed => {
                    picker.render(&mut self.lcd);
                    self.lcd.flush()?;
                }
                PickerEvent::ExitRequested => {
                    if self.confirm_exit().await? == Flow::Quit {
                        return Ok(Flow::Quit);
                    }
                    self.lcd.set_backlight(Backlight::White);
                    picker.render(&mut self.lcd);
                    self.lcd.flush()?;
                    sleep(RELEASE_DELAY).await;
                }
                PickerEvent::Confirmed(ident) => {
                    self.choose_station(ident)?;
                    return Ok(Flow::Continue);
                }
            }
            sleep(self.settings.button_interval()).await;
        }
    }

    fn choose_station(&mut self, ident: Ident) -> Result<()> {
        info!("Selected station {}", ident);
        self.weather.set_station(ident);
        self.session.station = ident.station();
        if let Err(e) = self.session.save(&self.session_path) {
            warn!("Could not save session: {}", e);
        }
        self.show_message(&format!("{ident} selected"), Backlight::White)
    }

    /// Ask before quitting; runs the exit action on Yes
    async fn confirm_exit(&mut self) -> Result<Flow> {
        let mut confirm = ConfirmExit::new(self.exit.short_prompt());
        self.lcd.set_backlight(Backlight::White);
        confirm.render(&mut self.lcd);
        self.lcd.flush()?;
        sleep(RELEASE_DELAY).await;

        loop {
            match confirm.handle(self.keypad.poll()) {
                ConfirmEvent::Pending => {
                    confirm.render(&mut self.lcd);
                    self.lcd.flush()?;
                }
                ConfirmEvent::No => {
                    debug!("Exit cancelled");
                    self.lcd.show_cursor(false);
                    return Ok(Flow::Continue);
                }
                ConfirmEvent::Yes => {
                    self.lcd.show_cursor(false);
                    self.lcd.clear();
                    self.lcd.set_backlight(Backlight::Off);
                    self.lcd.flush()?;
                    self.exit.run()?;
                    return Ok(Flow::Quit);
                }
            }
            sleep(self.settings.button_interval()).await;
        }
    }

    /// Show the report and scroll line 2 until the next update is due
    async fn main_view(&mut self) -> Result<Flow> {
        let Some(report) = self.weather.report() else {
            return Ok(Flow::Continue);
        };
        let lines = display_lines(report, self.settings.include_remarks);
        info!("{} | {}", lines.line1, lines.line2);

        let cols = usize::from(self.settings.cols);
        let frames = scroll_frames(
            &lines.line2,
            cols,
            self.settings.scroll_pause(),
            self.settings.scroll_interval(),
        );

        self.lcd.show_cursor(false);
        self.lcd.clear();
        self.lcd.set_backlight(lines.backlight);
        self.lcd.message(&lines.line1);

        let started = Instant::now();
        while started.elapsed() < self.update.interval() {
            for frame in &frames {
                self.lcd.set_cursor(0, 1);
                self.lcd.message(&format!("{:<cols$}", frame.text));
                self.lcd.flush()?;

                let Some(interrupt) = self.hold(frame.hold).await else {
                    continue;
                };
                return match interrupt {
                    Interrupt::Select => self.select_station().await,
                    Interrupt::Exit => self.confirm_exit().await,
                };
            }
        }
        debug!("Update interval elapsed");
        Ok(Flow::Continue)
    }

    /// Wait `duration` while watching the keypad. Sleeps at least one
    /// button interval even when `duration` is zero.
    async fn hold(&mut self, duration: Duration) -> Option<Interrupt> {
        let deadline = Instant::now() + duration;
        let poll = self.settings.button_interval();
        loop {
            let buttons = self.keypad.poll();
            if buttons.exit_chord() {
                return Some(Interrupt::Exit);
            }
            if buttons.contains(Button::Select) {
                return Some(Interrupt::Select);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            let step = if remaining.is_zero() {
                poll
            } else {
                poll.min(remaining)
            };
            sleep(step).await;
            if Instant::now() >= deadline {
                return None;
            }
        }
    }
}

/// Two line message for a station without a report. Line 2 says why
/// when the station lookup worked.
fn missing_message(station: &str, reason: Option<MissingReason>) -> String {
    let why = match reason {
        Some(MissingReason::UnknownStation) => format!("{station} unknown"),
        Some(MissingReason::NoReportsPublished) => format!("{station} no METAR"),
        Some(MissingReason::NoCurrentReport) => format!("{station} not recent"),
        None => format!("For {station}"),
    };
    format!("No Weather Data\n{why}")
}
