//! Touchscreen display target
//!
//! The main view shows the decoded report: station and time, flight rules,
//! a wind compass, temperatures, altimeter, visibility and a cloud layer
//! graph. A settings button opens the options bar with station selection,
//! shutdown, color inversion and an info page.

pub mod app;
pub mod layout;
pub mod palette;
pub mod surface;
pub mod views;
pub mod widgets;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::Result;
use crate::api::MetarSource;
use crate::config::{MetarRaspiConfig, UpdateConfig};
use crate::models::Ident;
use crate::session::Session;
use crate::system::ExitAction;
use crate::weather::RefreshSchedule;

pub use app::{Command, ErrorScreen, FollowUp, ScreenApp, View};
pub use layout::Layout;
pub use palette::{Palette, Tone};
pub use surface::{Closed, HeadlessSurface, Surface};
#[cfg(feature = "window")]
pub use surface::WindowSurface;
pub use widgets::radius_point;

/// How often touches are read
const INPUT_POLL: Duration = Duration::from_millis(10);
/// How often the clock is redrawn on the main view
const CLOCK_TICK: Duration = Duration::from_secs(1);
/// Wait before trying again after the network went away
const NETWORK_WAIT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct Screen<S: Surface> {
    app: ScreenApp,
    surface: S,
    source: Arc<dyn MetarSource>,
    update: UpdateConfig,
    schedule: RefreshSchedule,
    /// Show the main view after the next refresh, set while waiting for the network
    force_next: bool,
    session_path: PathBuf,
    exit: ExitAction,
}

impl<S: Surface> Screen<S> {
    /// Create a screen, restoring the station and colors from the saved session
    pub fn new(
        surface: S,
        layout: Layout,
        source: Arc<dyn MetarSource>,
        config: &MetarRaspiConfig,
    ) -> Result<Self> {
        let session_path = config.session_path();
        let session = Session::load(&session_path, &config.default_station);
        let ident = Ident::parse(&session.station)?;
        let exit = ExitAction::from_config(&config.system);
        let app = ScreenApp::new(
            layout,
            config.screen.clone(),
            exit.prompt(),
            ident,
            session.inverted,
        );

        Ok(Self {
            app,
            surface,
            source,
            update: config.update.clone(),
            schedule: RefreshSchedule::due_now(),
            force_next: false,
            session_path,
            exit,
        })
    }

    /// Start on `ident` instead of the saved station
    #[must_use]
    pub fn with_station(self, ident: Ident) -> Self {
        let Self {
            app,
            surface,
            source,
            update,
            schedule,
            force_next,
            session_path,
            exit,
        } = self;
        let session = app.session();
        let app = ScreenApp::new(
            app.layout().clone(),
            app.settings().clone(),
            exit.prompt(),
            ident,
            session.inverted,
        );
        Self {
            app,
            surface,
            source,
            update,
            schedule,
            force_next,
            session_path,
            exit,
        }
    }

    #[must_use]
    pub fn app(&self) -> &ScreenApp {
        &self.app
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Fetch once and draw the result without waiting for input
    pub async fn render_once(&mut self) -> Result<()> {
        self.draw()?;
        self.refresh(true).await;
        self.draw()
    }

    /// Run until the user exits or closes the window
    pub async fn run(&mut self) -> Result<()> {
        info!("Starting screen display for {}", self.app.weather().ident());
        self.draw()?;
        self.refresh(true).await;

        let mut last_clock = Instant::now();
        loop {
            let touch = match self.surface.poll_touch() {
                Ok(touch) => touch,
                Err(Closed) => {
                    info!("Window closed");
                    return Ok(());
                }
            };
            if let Some(at) = touch
                && let Some(command) = self.app.touch(at)
                && self.execute(command).await? == Flow::Quit
            {
                return Ok(());
            }

            if self.schedule.is_due(Instant::now()) {
                debug!("Auto update");
                let force = std::mem::take(&mut self.force_next);
                self.refresh(force).await;
            }

            if self.app.take_dirty() {
                self.draw()?;
                last_clock = Instant::now();
            } else if last_clock.elapsed() >= CLOCK_TICK && self.app.view() == View::Main {
                self.app.render_clock(self.surface.target(), Utc::now());
                self.surface.present()?;
                last_clock = Instant::now();
            }

            sleep(INPUT_POLL).await;
        }
    }

    fn draw(&mut self) -> Result<()> {
        self.app.render(self.surface.target(), Utc::now());
        self.app.take_dirty();
        self.surface.present()
    }

    /// Refresh the current station and plan the next refresh
    async fn refresh(&mut self, force_main: bool) {
        let ident = self.app.weather().ident();
        let result = self.source.latest(&ident).await;
        let follow = self.app.apply_refresh(result, force_main);
        self.follow_up(follow);
    }

    fn follow_up(&mut self, follow: FollowUp) {
        match follow {
            FollowUp::Interval => self.schedule.reset(self.update.interval()),
            FollowUp::Retry => self.schedule.reset(self.update.retry()),
            FollowUp::AwaitNetwork => {
                self.schedule.reset(NETWORK_WAIT);
                self.force_next = true;
            }
            FollowUp::Keep => {}
        }
    }

    async fn execute(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Refresh => {
                self.app.show_loading();
                self.draw()?;
                self.refresh(true).await;
            }
            Command::VerifyStation(ident) => {
                let checked = self.source.station_info(&ident).await;
                if let Some(ident) = self.app.station_checked(checked) {
                    self.draw()?;
                    let result = self.source.latest(&ident).await;
                    let follow = self.app.station_loaded(ident, result);
                    if self.app.weather().ident() == ident {
                        self.save_session();
                    }
                    self.follow_up(follow);
                }
            }
            Command::SaveSession => self.save_session(),
            Command::Quit => {
                self.exit.run()?;
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn save_session(&self) {
        if let Err(e) = self.app.session().save(&self.session_path) {
            warn!("Could not save session: {}", e);
        }
    }
}

impl Screen<HeadlessSurface> {
    /// Fetch, draw and write the frame to `path`
    pub async fn snapshot(&mut self, path: &Path) -> Result<()> {
        self.render_once().await?;
        self.surface.save_png(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MetarError;
    use crate::api::tests::FakeSource;
    use crate::models::metar::tests::sample_report;
    use crate::screen::widgets::point;
    use embedded_graphics::prelude::Point;
    use tempdir::TempDir;

    fn config(dir: &TempDir) -> MetarRaspiConfig {
        let mut config = MetarRaspiConfig::default();
        config.system.session_file = Some(dir.path().join("session.json"));
        config
    }

    fn screen(source: FakeSource, config: &MetarRaspiConfig) -> Screen<HeadlessSurface> {
        let layout = Layout::bundled("320x240").unwrap();
        let surface = HeadlessSurface::new(layout.width, layout.height);
        Screen::new(surface, layout, Arc::new(source), config).unwrap()
    }

    /// Settings, shutdown, confirm
    fn queue_exit(screen: &mut Screen<HeadlessSurface>) {
        let layout = screen.app().layout().clone();
        let util = point(layout.util);
        let surface = screen.surface_mut();
        surface.push_touch(util);
        surface.push_touch(Point::new(util.x + layout.main.util_spacing * 2, util.y));
        surface.push_touch(point(layout.quit.yes));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shows_report_then_exits() {
        let dir = TempDir::new("metar-screen").unwrap();
        let source = FakeSource::default();
        source.push("KJFK", Ok(Some(sample_report())));
        let mut screen = screen(source, &config(&dir));
        queue_exit(&mut screen);

        screen.run().await.unwrap();
        assert!(screen.app().weather().report().is_some());
        assert_eq!(screen.app().view(), View::Quit);
        assert!(screen.surface().frames() >= 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_new_station_saves_session() {
        let dir = TempDir::new("metar-screen").unwrap();
        let config = config(&dir);
        let source = FakeSource::default().with_station("LJFK", &["METAR", "TAF"]);
        source.push("KJFK", Ok(Some(sample_report())));
        let mut report = sample_report();
        report.station = "LJFK".to_string();
        report.raw = report.raw.replacen("KJFK", "LJFK", 1);
        source.push("LJFK", Ok(Some(report)));

        let mut screen = screen(source, &config);
        let layout = screen.app().layout().clone();
        let util = point(layout.util);
        let select = layout.select;
        {
            let surface = screen.surface_mut();
            surface.push_touch(util);
            surface.push_touch(Point::new(util.x + layout.main.util_spacing, util.y));
            surface.push_touch(Point::new(select.column_x(0), select.row_down));
            surface.push_touch(point(select.yes));
        }
        queue_exit(&mut screen);

        screen.run().await.unwrap();
        assert_eq!(screen.app().weather().ident().station(), "LJFK");
        let session = Session::load(&config.session_path(), "KJFK");
        assert_eq!(session.station, "LJFK");
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_loss_waits_then_recovers() {
        let dir = TempDir::new("metar-screen").unwrap();
        let source = FakeSource::default();
        source.push("KJFK", Err(MetarError::connection("no route")));
        source.push("KJFK", Ok(Some(sample_report())));
        let mut screen = screen(source, &config(&dir));

        screen.render_once().await.unwrap();
        assert_eq!(screen.app().view(), View::NoNetwork);

        queue_exit(&mut screen);
        screen.run().await.unwrap();
        assert!(screen.app().weather().report().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_writes_png() {
        let dir = TempDir::new("metar-screen").unwrap();
        let source = FakeSource::default();
        source.push("KJFK", Ok(Some(sample_report())));
        let mut screen = screen(source, &config(&dir));

        let path = dir.path().join("main.png");
        screen.snapshot(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(screen.app().view(), View::Main);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_station_overrides_session() {
        let dir = TempDir::new("metar-screen").unwrap();
        let config = config(&dir);
        Session {
            station: "KSFO".to_string(),
            inverted: true,
        }
        .save(&config.session_path())
        .unwrap();

        let screen = screen(FakeSource::default(), &config);
        assert_eq!(screen.app().weather().ident().station(), "KSFO");
        assert!(screen.app().is_inverted());

        let screen = screen.with_station(Ident::parse("EGLL").unwrap());
        assert_eq!(screen.app().weather().ident().station(), "EGLL");
        assert!(screen.app().is_inverted());
    }
}
