//! Touchscreen state machine
//!
//! [`ScreenApp`] owns the current view, the station being edited and the
//! last good report. Touches turn into view changes directly; anything that
//! needs the network or the system comes back as a [`Command`] for the
//! runtime to carry out.

use chrono::{DateTime, Utc};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use tracing::{debug, error, info, warn};

use crate::config::ScreenConfig;
use crate::models::{IDENT_LEN, Ident, MetarReport, StationInfo};
use crate::session::Session;
use crate::weather::{RefreshOutcome, StationWeather};
use crate::{MetarError, Result};

use super::layout::Layout;
use super::palette::{Palette, Tone};
use super::views::Scene;
use super::widgets::{Button, Canvas, Fonts, Icon, point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorScreen {
    /// "XXXX has no current METAR"
    NoReport,
    /// "XXXX is not a valid station"
    BadStation,
    /// "XXXX does not send METARs"
    NotReporting,
    Unknown,
    /// "Could not fetch data from source", with a reload button
    Fetch,
}

impl ErrorScreen {
    #[must_use]
    pub fn lines(&self, station: &str) -> (String, String) {
        let (line1, line2) = match self {
            ErrorScreen::NoReport => (format!("{station} has no"), "current METAR"),
            ErrorScreen::BadStation => (format!("{station} is not"), "a valid station"),
            ErrorScreen::NotReporting => (format!("{station} does"), "not send METARs"),
            ErrorScreen::Unknown => ("There was an".to_string(), "unknown error"),
            ErrorScreen::Fetch => ("Could not fetch".to_string(), "data from source"),
        };
        (line1, line2.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Loading,
    Main,
    /// Main view with the options bar along the bottom
    Options,
    Selection,
    /// Other weather and remarks on small screens
    Remarks,
    Quit,
    Info,
    NoNetwork,
    Error(ErrorScreen),
}

/// Work the runtime has to do after a touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fetch the current station again and show the main view
    Refresh,
    /// Check the station exists and reports, then switch to it
    VerifyStation(Ident),
    /// Persist the session
    SaveSession,
    /// Run the exit action and stop
    Quit,
}

/// When the next refresh should happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    /// After the normal update interval
    Interval,
    /// After the shorter retry interval
    Retry,
    /// After a short wait for the network, showing the main view when it is back
    AwaitNetwork,
    /// Leave the schedule alone
    Keep,
}

/// What a button does when touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Main,
    Options,
    Selection,
    Remarks,
    QuitPrompt,
    Info,
    Invert,
    /// Previous character in a column
    CharUp(usize),
    /// Next character in a column
    CharDown(usize),
    Verify,
    CancelSelection,
    Refresh,
    Exit,
}

pub struct ScreenApp {
    layout: Layout,
    fonts: Fonts,
    settings: ScreenConfig,
    exit_prompt: &'static str,
    palette: Palette,
    weather: StationWeather,
    /// Station shown in the picker and in error messages
    picker: Ident,
    view: View,
    dirty: bool,
}

impl ScreenApp {
    #[must_use]
    pub fn new(
        layout: Layout,
        settings: ScreenConfig,
        exit_prompt: &'static str,
        station: Ident,
        inverted: bool,
    ) -> Self {
        Self {
            fonts: Fonts::new(&layout.fonts),
            layout,
            settings,
            exit_prompt,
            palette: Palette::new(inverted),
            weather: StationWeather::new(station),
            picker: station,
            view: View::Loading,
            dirty: true,
        }
    }

    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[must_use]
    pub fn settings(&self) -> &ScreenConfig {
        &self.settings
    }

    #[must_use]
    pub fn weather(&self) -> &StationWeather {
        &self.weather
    }

    #[must_use]
    pub fn picker(&self) -> Ident {
        self.picker
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.palette.is_inverted()
    }

    /// What to persist across restarts
    #[must_use]
    pub fn session(&self) -> Session {
        Session {
            station: self.weather.ident().station(),
            inverted: self.palette.is_inverted(),
        }
    }

    /// Views that a successful refresh replaces with the report
    #[must_use]
    pub fn on_main(&self) -> bool {
        matches!(
            self.view,
            View::Main | View::NoNetwork | View::Error(ErrorScreen::Fetch)
        )
    }

    /// Whether the view changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn set_view(&mut self, view: View) {
        if view != self.view {
            debug!("View {:?} -> {:?}", self.view, view);
        }
        self.view = view;
        self.dirty = true;
    }

    /// The report if there is one, otherwise the no-data error
    fn show_main(&mut self) {
        if self.weather.report().is_some() {
            self.set_view(View::Main);
        } else {
            self.set_view(View::Error(ErrorScreen::NoReport));
        }
    }

    pub fn show_loading(&mut self) {
        self.set_view(View::Loading);
    }

    fn show_error(&mut self, screen: ErrorScreen) {
        self.set_view(View::Error(screen));
    }

    /// Handle a touch at `at`; the first button hit wins
    pub fn touch(&mut self, at: Point) -> Option<Command> {
        let action = self
            .buttons()
            .into_iter()
            .find(|button| button.is_clicked(at))
            .map(|button| button.action())?;
        debug!("Touch at ({}, {}) -> {:?}", at.x, at.y, action);
        self.perform(action)
    }

    fn perform(&mut self, action: Action) -> Option<Command> {
        match action {
            Action::Main => self.show_main(),
            Action::Options => self.set_view(View::Options),
            Action::Selection => self.set_view(View::Selection),
            Action::Remarks => {
                if self.weather.report().is_some() {
                    self.set_view(View::Remarks);
                } else {
                    self.show_error(ErrorScreen::NoReport);
                }
            }
            Action::QuitPrompt => self.set_view(View::Quit),
            Action::Info => self.set_view(View::Info),
            Action::Invert => {
                self.palette.invert();
                self.show_main();
                return Some(Command::SaveSession);
            }
            Action::CharUp(col) => {
                self.picker.decrement(col);
                self.dirty = true;
            }
            Action::CharDown(col) => {
                self.picker.increment(col);
                self.dirty = true;
            }
            Action::Verify => return Some(Command::VerifyStation(self.picker)),
            Action::CancelSelection => {
                self.picker = self.weather.ident();
                self.show_main();
            }
            Action::Refresh => return Some(Command::Refresh),
            Action::Exit => return Some(Command::Quit),
        }
        None
    }

    /// Touch targets of the current view
    fn buttons(&self) -> Vec<Button<Action>> {
        let radius = self.layout.button.radius;
        let util = point(self.layout.util);
        let cancel = |action| Button::cancel(util, radius, Tone::Gray, action);

        match self.view {
            View::Loading => Vec::new(),
            View::Main => {
                let mut buttons = vec![Button::icon(
                    util,
                    radius,
                    Icon::Settings,
                    Tone::White,
                    Tone::Gray,
                    Action::Options,
                )];
                if let Some(button) = self.remarks_button() {
                    buttons.push(button);
                }
                buttons
            }
            View::Options => {
                let spacing = self.layout.main.util_spacing;
                let at = |n: i32| Point::new(util.x + spacing * n, util.y);
                let theme = if self.palette.is_inverted() {
                    Icon::Sun
                } else {
                    Icon::Moon
                };
                vec![
                    Button::cancel(at(0), radius, Tone::Gray, Action::Main),
                    Button::selection(at(1), radius, Action::Selection),
                    Button::shutdown(at(2), radius, Action::QuitPrompt),
                    Button::icon(at(3), radius, theme, Tone::White, Tone::Black, Action::Invert),
                    Button::icon(at(4), radius, Icon::Info, Tone::White, Tone::Purple, Action::Info),
                ]
            }
            View::Selection => {
                let select = &self.layout.select;
                let mut buttons = vec![
                    Button::icon(
                        point(select.yes),
                        radius,
                        Icon::Check,
                        Tone::White,
                        Tone::Green,
                        Action::Verify,
                    ),
                    Button::cancel(point(select.no), radius, Tone::Red, Action::CancelSelection),
                ];
                for col in 0..IDENT_LEN {
                    let x = select.column_x(col);
                    buttons.push(Button::icon(
                        Point::new(x, select.row_up),
                        radius,
                        Icon::Up,
                        Tone::Black,
                        Tone::White,
                        Action::CharUp(col),
                    ));
                    buttons.push(Button::icon(
                        Point::new(x, select.row_down),
                        radius,
                        Icon::Down,
                        Tone::Black,
                        Tone::White,
                        Action::CharDown(col),
                    ));
                }
                buttons
            }
            View::Remarks | View::Info => vec![cancel(Action::Main)],
            View::Quit => vec![
                Button::icon(
                    point(self.layout.quit.yes),
                    radius,
                    Icon::Check,
                    Tone::White,
                    Tone::Green,
                    Action::Exit,
                ),
                Button::cancel(point(self.layout.quit.no), radius, Tone::Red, Action::Main),
            ],
            View::NoNetwork => vec![Button::shutdown(util, radius, Action::Exit)],
            View::Error(ErrorScreen::Fetch) => vec![
                cancel(Action::Main),
                Button::icon(
                    point(self.layout.error.refresh),
                    radius,
                    Icon::Reload,
                    Tone::White,
                    Tone::Gray,
                    Action::Refresh,
                ),
            ],
            View::Error(_) => vec![cancel(Action::Selection)],
        }
    }

    /// Small screens link to a separate weather and remarks view
    fn remarks_button(&self) -> Option<Button<Action>> {
        if self.layout.large_display {
            return None;
        }
        let bounds = self.layout.main.wxrmk?;
        let report = self.weather.report()?;
        let (text, tone) = match (!report.wx_codes.is_empty(), report.remarks.is_some()) {
            (true, true) => ("WX/RMK", Tone::Purple),
            (true, false) => ("WX", Tone::Red),
            (false, true) => ("RMK", Tone::Blue),
            (false, false) => return None,
        };
        Some(Button::rect(
            bounds,
            text,
            tone,
            self.layout.button.outline,
            Action::Remarks,
        ))
    }

    /// Fold a refresh of the current station into the view.
    ///
    /// `force_main` shows the report (or the no-data error) even when the
    /// user is somewhere other than the main view.
    pub fn apply_refresh(
        &mut self,
        result: Result<Option<MetarReport>>,
        force_main: bool,
    ) -> FollowUp {
        match self.weather.apply(result) {
            RefreshOutcome::Updated => {
                if force_main || self.on_main() {
                    self.set_view(View::Main);
                }
                FollowUp::Interval
            }
            RefreshOutcome::Unchanged => {
                if force_main {
                    self.set_view(View::Main);
                }
                FollowUp::Interval
            }
            RefreshOutcome::NoReport => {
                if force_main {
                    self.show_main();
                }
                FollowUp::Interval
            }
            RefreshOutcome::Failed(e) => self.refresh_failed(&e),
        }
    }

    fn refresh_failed(&mut self, e: &MetarError) -> FollowUp {
        match e {
            MetarError::Connection { .. } => {
                info!("No network, waiting");
                self.set_view(View::NoNetwork);
                FollowUp::AwaitNetwork
            }
            MetarError::Timeout { .. } | MetarError::Source { .. } => {
                warn!("Could not fetch report: {}", e);
                self.show_error(ErrorScreen::Fetch);
                FollowUp::Retry
            }
            MetarError::BadStation { .. } | MetarError::Validation { .. } => {
                self.show_error(ErrorScreen::BadStation);
                FollowUp::Retry
            }
            _ => {
                error!("An unknown error has occurred: {}", e);
                self.show_error(ErrorScreen::Unknown);
                FollowUp::Retry
            }
        }
    }

    /// Result of checking the picked station; returns it when it can be loaded
    pub fn station_checked(&mut self, result: Result<StationInfo>) -> Option<Ident> {
        match result {
            Ok(info) if info.sends_reports() => {
                self.show_loading();
                Some(self.picker)
            }
            Ok(info) => {
                info!("{} does not send METARs", info.ident);
                self.show_error(ErrorScreen::NotReporting);
                None
            }
            Err(MetarError::BadStation { station }) => {
                info!("{} is not a valid station", station);
                self.show_error(ErrorScreen::BadStation);
                None
            }
            Err(e) if e.is_transient() => {
                warn!("Station lookup failed: {}", e);
                self.show_error(ErrorScreen::Fetch);
                None
            }
            Err(e) => {
                error!("Station lookup failed: {}", e);
                self.show_error(ErrorScreen::Unknown);
                None
            }
        }
    }

    /// First fetch for a newly picked station. Only a report switches over.
    pub fn station_loaded(&mut self, station: Ident, result: Result<Option<MetarReport>>) -> FollowUp {
        match result {
            Ok(Some(report)) => {
                self.weather.set_station(station);
                self.weather.apply(Ok(Some(report)));
                self.picker = station;
                self.set_view(View::Main);
                FollowUp::Interval
            }
            Ok(None) => {
                self.show_error(ErrorScreen::NoReport);
                FollowUp::Keep
            }
            Err(e) if e.is_transient() || matches!(e, MetarError::Source { .. }) => {
                warn!("Could not fetch report for {}: {}", station, e);
                self.show_error(ErrorScreen::Fetch);
                FollowUp::Retry
            }
            Err(MetarError::BadStation { .. }) => {
                self.show_error(ErrorScreen::BadStation);
                FollowUp::Keep
            }
            Err(e) => {
                error!("An unknown error has occurred: {}", e);
                self.show_error(ErrorScreen::Unknown);
                FollowUp::Keep
            }
        }
    }

    fn scene(&self) -> Scene<'_> {
        Scene {
            layout: &self.layout,
            fonts: self.fonts,
            settings: &self.settings,
            report: self.weather.report(),
            station: self.picker.station(),
        }
    }

    /// Paint the whole current view
    pub fn render<D>(&self, target: &mut D, now: DateTime<Utc>)
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let mut canvas = Canvas::new(target, self.palette);
        let scene = self.scene();

        match self.view {
            View::Loading => scene.loading(&mut canvas),
            View::Main => scene.main(&mut canvas, now),
            View::Options => scene.options(&mut canvas, now),
            View::Selection => scene.selection(&mut canvas),
            View::Remarks => scene.remarks(&mut canvas),
            View::Quit => scene.quit(&mut canvas, self.exit_prompt),
            View::Info => scene.info(&mut canvas),
            View::NoNetwork => scene.no_network(&mut canvas),
            View::Error(screen) => {
                let (line1, line2) = screen.lines(&self.picker.station());
                scene.message(&mut canvas, &line1, &line2);
            }
        }
        for button in self.buttons() {
            button.draw(&mut canvas, self.fonts.s3);
        }
    }

    /// Repaint only the clock; a no-op away from the main view
    pub fn render_clock<D>(&self, target: &mut D, now: DateTime<Utc>)
    where
        D: DrawTarget<Color = Rgb888>,
    {
        if self.view == View::Main {
            let mut canvas = Canvas::new(target, self.palette);
            self.scene().clock(&mut canvas, now);
        }
    }
}
