//! Report text and backlight color for the character display

use crate::models::{FlightRules, MetarReport};

use super::lcd::Backlight;

/// Shortened tokens for the scrolling line
const REPLACEMENTS: [(&str, &str); 4] = [
    ("00000KT", "CALM"),
    ("00000MPS", "CALM"),
    ("10SM", "UNLM"),
    ("9999", "UNLM"),
];

/// What the plate shows for one report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlateLines {
    /// `IDEN HHMMZ FTRL`
    pub line1: String,
    /// Report body, scrolled when longer than the panel
    pub line2: String,
    pub backlight: Backlight,
}

#[must_use]
pub fn flight_rules_backlight(rules: FlightRules) -> Backlight {
    match rules {
        FlightRules::Vfr => Backlight::Rgb(0, 255, 0),
        FlightRules::Mvfr => Backlight::Rgb(0, 0, 255),
        FlightRules::Ifr => Backlight::Rgb(255, 0, 0),
        FlightRules::Lifr => Backlight::Rgb(255, 0, 255),
    }
}

#[must_use]
pub fn display_lines(report: &MetarReport, include_remarks: bool) -> PlateLines {
    let rules = report.effective_flight_rules();
    let line1 = format!("{} {} {}", report.station, report.time_repr(), rules);

    let body = if include_remarks {
        report.body()
    } else {
        report.body_without_remarks()
    };
    let line2 = REPLACEMENTS
        .iter()
        .fold(body.to_string(), |line, (from, to)| line.replace(from, to))
        .trim()
        .to_string();

    PlateLines {
        line1,
        line2,
        backlight: flight_rules_backlight(rules),
    }
}
