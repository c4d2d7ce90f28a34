//! Decoded METAR report model and derived values

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::MetarError;

/// Hectopascal to inches of mercury
const HPA_TO_INHG: f32 = 0.029_53;

/// Coarse visibility/ceiling classification of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlightRules {
    #[serde(rename = "VFR")]
    Vfr,
    #[serde(rename = "MVFR")]
    Mvfr,
    #[serde(rename = "IFR")]
    Ifr,
    #[serde(rename = "LIFR")]
    Lifr,
}

impl FlightRules {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FlightRules::Vfr => "VFR",
            FlightRules::Mvfr => "MVFR",
            FlightRules::Ifr => "IFR",
            FlightRules::Lifr => "LIFR",
        }
    }

    /// Classify from visibility (statute miles) and ceiling (feet AGL).
    ///
    /// A missing ceiling is unlimited. Missing visibility is reported as IFR.
    #[must_use]
    pub fn from_conditions(visibility_sm: Option<f32>, ceiling_ft: Option<u32>) -> Self {
        let Some(vis) = visibility_sm else {
            return match ceiling_ft {
                Some(ceiling) if ceiling < 500 => FlightRules::Lifr,
                _ => FlightRules::Ifr,
            };
        };
        let ceiling = ceiling_ft.unwrap_or(u32::MAX);

        if vis < 1.0 || ceiling < 500 {
            FlightRules::Lifr
        } else if vis < 3.0 || ceiling < 1000 {
            FlightRules::Ifr
        } else if vis < 5.0 || ceiling < 3000 {
            FlightRules::Mvfr
        } else {
            FlightRules::Vfr
        }
    }
}

impl fmt::Display for FlightRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlightRules {
    type Err = MetarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VFR" => Ok(FlightRules::Vfr),
            "MVFR" => Ok(FlightRules::Mvfr),
            "IFR" => Ok(FlightRules::Ifr),
            "LIFR" => Ok(FlightRules::Lifr),
            other => Err(MetarError::validation(format!(
                "unknown flight rules '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindDirection {
    Variable,
    Degrees(u16),
}

/// Surface wind in knots
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub direction: Option<WindDirection>,
    pub speed_kt: Option<u16>,
    pub gust_kt: Option<u16>,
    /// Variable sector reported as e.g. `180V240`
    pub variable_range: Option<(u16, u16)>,
}

impl Wind {
    #[must_use]
    pub fn is_calm(&self) -> bool {
        self.speed_kt == Some(0)
    }
}

/// Prevailing visibility in statute miles
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    pub statute_miles: f32,
    /// Reported as "P6SM" / "10+": at least this far
    pub or_more: bool,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.statute_miles.fract() == 0.0 {
            write!(f, "{:.0}", self.statute_miles)?;
        } else {
            write!(f, "{}", self.statute_miles)?;
        }
        if self.or_more {
            f.write_str("+")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudLayer {
    /// FEW, SCT, BKN, OVC, VV, ...
    pub cover: String,
    /// Base in feet above ground
    pub base_ft: Option<u32>,
}

impl CloudLayer {
    /// Only broken, overcast and vertical-visibility layers form a ceiling
    #[must_use]
    pub fn is_ceiling(&self) -> bool {
        matches!(self.cover.as_str(), "BKN" | "OVC" | "OVX" | "VV")
    }

    /// METAR style representation, e.g. "BKN015"
    #[must_use]
    pub fn repr(&self) -> String {
        match self.base_ft {
            Some(base) => format!("{}{:03}", self.cover, base / 100),
            None => self.cover.clone(),
        }
    }
}

/// The most recent report for a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetarReport {
    pub station: String,
    pub time: Option<DateTime<Utc>>,
    pub raw: String,
    pub flight_rules: Option<FlightRules>,
    pub wind: Wind,
    pub visibility: Option<Visibility>,
    pub altimeter_hpa: Option<f32>,
    /// Celsius
    pub temperature: Option<i32>,
    /// Celsius
    pub dewpoint: Option<i32>,
    pub clouds: Vec<CloudLayer>,
    /// Present weather codes such as "-RA" or "BR"
    pub wx_codes: Vec<String>,
    /// Everything after RMK, without the RMK marker
    pub remarks: Option<String>,
}

impl MetarReport {
    /// Report time as "HHMMZ", or "----Z" when unknown
    #[must_use]
    pub fn time_repr(&self) -> String {
        self.time
            .map(|t| t.format("%H%MZ").to_string())
            .unwrap_or_else(|| "----Z".to_string())
    }

    /// Raw report without the leading station and time groups
    #[must_use]
    pub fn body(&self) -> &str {
        self.raw.splitn(3, ' ').nth(2).unwrap_or_default().trim()
    }

    /// Report body with the remarks section cut off
    #[must_use]
    pub fn body_without_remarks(&self) -> &str {
        let body = self.body();
        if body.starts_with("RMK") {
            return "";
        }
        match body.find(" RMK") {
            Some(idx) => body[..idx].trim_end(),
            None => body,
        }
    }

    /// First ceiling layer with a known base
    #[must_use]
    pub fn ceiling(&self) -> Option<&CloudLayer> {
        self.clouds
            .iter()
            .find(|layer| layer.is_ceiling() && layer.base_ft.is_some())
    }

    /// Flight rules as reported, or derived from visibility and ceiling
    #[must_use]
    pub fn effective_flight_rules(&self) -> FlightRules {
        self.flight_rules.unwrap_or_else(|| {
            FlightRules::from_conditions(
                self.visibility.map(|v| v.statute_miles),
                self.ceiling().and_then(|layer| layer.base_ft),
            )
        })
    }

    /// Relative humidity in percent from temperature and dewpoint
    #[must_use]
    pub fn relative_humidity(&self) -> Option<f32> {
        let (temp, dew) = (self.temperature? as f32, self.dewpoint? as f32);
        let vapor = |c: f32| 6.11 * 10f32.powf(7.5 * c / (237.7 + c));
        Some(vapor(dew) / vapor(temp) * 100.0)
    }

    /// Temperature difference from the 15C standard atmosphere
    #[must_use]
    pub fn isa_deviation(&self) -> Option<i32> {
        self.temperature.map(|t| t - 15)
    }

    #[must_use]
    pub fn altimeter_inhg(&self) -> Option<f32> {
        self.altimeter_hpa
            .map(|hpa| (hpa * HPA_TO_INHG * 100.0).round() / 100.0)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    pub(crate) fn sample_report() -> MetarReport {
        MetarReport {
            station: "KJFK".to_string(),
            time: Some(Utc.with_ymd_and_hms(2026, 10, 19, 16, 51, 0).unwrap()),
            raw: "KJFK 191651Z 31012G20KT 280V340 10SM FEW050 BKN250 12/04 A3012 RMK AO2 SLP199"
                .to_string(),
            flight_rules: Some(FlightRules::Vfr),
            wind: Wind {
                direction: Some(WindDirection::Degrees(310)),
                speed_kt: Some(12),
                gust_kt: Some(20),
                variable_range: Some((280, 340)),
            },
            visibility: Some(Visibility {
                statute_miles: 10.0,
                or_more: true,
            }),
            altimeter_hpa: Some(1019.8),
            temperature: Some(12),
            dewpoint: Some(4),
            clouds: vec![
                CloudLayer {
                    cover: "FEW".to_string(),
                    base_ft: Some(5000),
                },
                CloudLayer {
                    cover: "BKN".to_string(),
                    base_ft: Some(25000),
                },
            ],
            wx_codes: Vec::new(),
            remarks: Some("AO2 SLP199".to_string()),
        }
    }

    #[rstest]
    #[case(Some(10.0), None, FlightRules::Vfr)]
    #[case(Some(5.0), Some(3000), FlightRules::Vfr)]
    #[case(Some(4.0), None, FlightRules::Mvfr)]
    #[case(Some(10.0), Some(2500), FlightRules::Mvfr)]
    #[case(Some(2.0), None, FlightRules::Ifr)]
    #[case(Some(10.0), Some(800), FlightRules::Ifr)]
    #[case(Some(0.5), None, FlightRules::Lifr)]
    #[case(Some(10.0), Some(200), FlightRules::Lifr)]
    #[case(None, None, FlightRules::Ifr)]
    #[case(None, Some(300), FlightRules::Lifr)]
    fn test_flight_rules_from_conditions(
        #[case] vis: Option<f32>,
        #[case] ceiling: Option<u32>,
        #[case] expected: FlightRules,
    ) {
        assert_eq!(FlightRules::from_conditions(vis, ceiling), expected);
    }

    #[test]
    fn test_flight_rules_parse() {
        assert_eq!("mvfr".parse::<FlightRules>().unwrap(), FlightRules::Mvfr);
        assert!("UNK".parse::<FlightRules>().is_err());
        assert_eq!(FlightRules::Lifr.to_string(), "LIFR");
    }

    #[test]
    fn test_body_and_remarks() {
        let report = sample_report();
        assert!(report.body().starts_with("31012G20KT"));
        assert_eq!(
            report.body_without_remarks(),
            "31012G20KT 280V340 10SM FEW050 BKN250 12/04 A3012"
        );
        assert_eq!(report.time_repr(), "1651Z");
    }

    #[test]
    fn test_body_of_short_raw() {
        let mut report = sample_report();
        report.raw = "KJFK".to_string();
        assert_eq!(report.body(), "");
        report.time = None;
        assert_eq!(report.time_repr(), "----Z");
    }

    #[test]
    fn test_ceiling_skips_few_layers() {
        let report = sample_report();
        assert_eq!(report.ceiling().unwrap().repr(), "BKN250");
    }

    #[test]
    fn test_effective_flight_rules_falls_back() {
        let mut report = sample_report();
        report.flight_rules = None;
        report.clouds[1].base_ft = Some(900);
        assert_eq!(report.effective_flight_rules(), FlightRules::Ifr);
    }

    #[test]
    fn test_derived_values() {
        let report = sample_report();
        let humidity = report.relative_humidity().unwrap();
        assert!((humidity - 58.0).abs() < 1.5, "humidity was {humidity}");
        assert_eq!(report.isa_deviation(), Some(-3));
        assert_eq!(report.altimeter_inhg(), Some(30.12));
    }

    #[test]
    fn test_visibility_display() {
        let ten_plus = Visibility {
            statute_miles: 10.0,
            or_more: true,
        };
        assert_eq!(ten_plus.to_string(), "10+");
        let half = Visibility {
            statute_miles: 0.5,
            or_more: false,
        };
        assert_eq!(half.to_string(), "0.5");
    }
}
