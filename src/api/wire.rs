//! JSON records returned by the aviationweather.gov data API

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{
    CloudLayer, Ident, MetarReport, StationInfo, Visibility, Wind, WindDirection,
};

/// Fields the provider sends either as a number or as a string ("VRB", "10+")
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f32),
    Text(String),
}

/// One element of `/metar?format=json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetarRecord {
    pub icao_id: String,
    /// Observation time as unix seconds
    pub obs_time: Option<i64>,
    pub raw_ob: String,
    pub temp: Option<f32>,
    pub dewp: Option<f32>,
    pub wdir: Option<NumberOrText>,
    pub wspd: Option<f32>,
    pub wgst: Option<f32>,
    pub visib: Option<NumberOrText>,
    /// Altimeter in hPa
    pub altim: Option<f32>,
    pub wx_string: Option<String>,
    pub clouds: Option<Vec<CloudRecord>>,
    pub flt_cat: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloudRecord {
    pub cover: String,
    pub base: Option<u32>,
}

/// One element of `/stationinfo?format=json`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationRecord {
    pub icao_id: Option<String>,
    pub site: Option<String>,
    pub country: Option<String>,
    pub site_type: Option<Vec<String>>,
}

fn round_knots(value: f32) -> u16 {
    value.round().clamp(0.0, f32::from(u16::MAX)) as u16
}

/// Parse "10+", "6", "1/2" or "1 1/2" style visibility strings
pub fn parse_visibility(text: &str) -> Option<Visibility> {
    let text = text.trim().trim_end_matches("SM");
    let (text, or_more) = match text.strip_suffix('+') {
        Some(rest) => (rest, true),
        None => match text.strip_prefix('P') {
            Some(rest) => (rest, true),
            None => (text, false),
        },
    };

    let mut miles = 0.0;
    for part in text.split_whitespace() {
        miles += match part.split_once('/') {
            Some((num, den)) => {
                let den: f32 = den.parse().ok()?;
                if den == 0.0 {
                    return None;
                }
                num.parse::<f32>().ok()? / den
            }
            None => part.parse::<f32>().ok()?,
        };
    }

    if text.split_whitespace().next().is_none() {
        return None;
    }

    Some(Visibility {
        statute_miles: miles,
        or_more,
    })
}

/// Find a `dddVddd` variable wind group in the report body
fn variable_range(body: &str) -> Option<(u16, u16)> {
    body.split_whitespace().find_map(|token| {
        let (from, to) = token.split_once('V')?;
        let all_digits = |s: &str| s.len() == 3 && s.bytes().all(|b| b.is_ascii_digit());
        if all_digits(from) && all_digits(to) {
            Some((from.parse().ok()?, to.parse().ok()?))
        } else {
            None
        }
    })
}

impl From<MetarRecord> for MetarReport {
    fn from(record: MetarRecord) -> Self {
        let time = record
            .obs_time
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

        let raw = record.raw_ob.trim().to_string();
        let remarks = raw
            .find(" RMK")
            .map(|idx| raw[idx + 4..].trim().to_string())
            .filter(|rmk| !rmk.is_empty());
        let main_body = raw.split(" RMK").next().unwrap_or_default();

        let direction = match record.wdir {
            Some(NumberOrText::Number(deg)) => Some(WindDirection::Degrees(deg.round() as u16)),
            Some(NumberOrText::Text(text)) if text.eq_ignore_ascii_case("VRB") => {
                Some(WindDirection::Variable)
            }
            Some(NumberOrText::Text(text)) => text.parse().ok().map(WindDirection::Degrees),
            None => None,
        };

        let visibility = match record.visib {
            Some(NumberOrText::Number(miles)) => Some(Visibility {
                statute_miles: miles,
                or_more: false,
            }),
            Some(NumberOrText::Text(text)) => parse_visibility(&text),
            None => None,
        };

        let clouds = record
            .clouds
            .unwrap_or_default()
            .into_iter()
            .map(|cloud| CloudLayer {
                cover: cloud.cover.trim().to_ascii_uppercase(),
                base_ft: cloud.base,
            })
            .collect();

        MetarReport {
            station: record.icao_id.trim().to_ascii_uppercase(),
            time,
            flight_rules: record.flt_cat.as_deref().and_then(|cat| cat.parse().ok()),
            wind: Wind {
                direction,
                speed_kt: record.wspd.map(round_knots),
                gust_kt: record.wgst.map(round_knots),
                variable_range: variable_range(main_body),
            },
            visibility,
            altimeter_hpa: record.altim,
            temperature: record.temp.map(|t| t.round() as i32),
            dewpoint: record.dewp.map(|t| t.round() as i32),
            clouds,
            wx_codes: record
                .wx_string
                .map(|wx| wx.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            remarks,
            raw,
        }
    }
}

impl StationRecord {
    pub fn into_station_info(self, requested: Ident) -> StationInfo {
        let ident = self
            .icao_id
            .as_deref()
            .and_then(|id| Ident::parse(id).ok())
            .unwrap_or(requested);
        StationInfo {
            ident,
            name: self.site,
            country: self.country,
            site_types: self.site_type.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlightRules;
    use rstest::rstest;

    const KJFK_METAR: &str = r#"[{
        "icaoId": "KJFK",
        "obsTime": 1760892660,
        "rawOb": "KJFK 191651Z 31012G20KT 280V340 10SM FEW050 BKN250 12/04 A3012 RMK AO2 SLP199",
        "temp": 12.2,
        "dewp": 4.4,
        "wdir": 310,
        "wspd": 12,
        "wgst": 20,
        "visib": "10+",
        "altim": 1019.8,
        "wxString": null,
        "clouds": [{"cover": "FEW", "base": 5000}, {"cover": "BKN", "base": 25000}],
        "fltCat": "VFR"
    }]"#;

    #[test]
    fn test_metar_record_conversion() {
        let records: Vec<MetarRecord> = serde_json::from_str(KJFK_METAR).unwrap();
        let report = MetarReport::from(records.into_iter().next().unwrap());

        assert_eq!(report.station, "KJFK");
        assert_eq!(report.time_repr(), "1651Z");
        assert_eq!(report.flight_rules, Some(FlightRules::Vfr));
        assert_eq!(report.wind.direction, Some(WindDirection::Degrees(310)));
        assert_eq!(report.wind.gust_kt, Some(20));
        assert_eq!(report.wind.variable_range, Some((280, 340)));
        assert_eq!(report.visibility.unwrap().to_string(), "10+");
        assert_eq!(report.temperature, Some(12));
        assert_eq!(report.dewpoint, Some(4));
        assert_eq!(report.clouds.len(), 2);
        assert_eq!(report.remarks.as_deref(), Some("AO2 SLP199"));
        assert!(report.wx_codes.is_empty());
    }

    #[test]
    fn test_variable_wind_and_missing_fields() {
        let json = r#"[{
            "icaoId": "egll",
            "obsTime": null,
            "rawOb": "EGLL 191650Z VRB02KT 0800 FG VV002 08/08 Q1021",
            "wdir": "VRB",
            "wspd": 2,
            "visib": 0.5,
            "wxString": "FG",
            "clouds": null
        }]"#;
        let records: Vec<MetarRecord> = serde_json::from_str(json).unwrap();
        let report = MetarReport::from(records.into_iter().next().unwrap());

        assert_eq!(report.station, "EGLL");
        assert_eq!(report.time, None);
        assert_eq!(report.wind.direction, Some(WindDirection::Variable));
        assert_eq!(report.wind.variable_range, None);
        assert_eq!(report.flight_rules, None);
        assert_eq!(report.wx_codes, vec!["FG".to_string()]);
        assert_eq!(report.remarks, None);
        assert!(report.clouds.is_empty());
    }

    #[rstest]
    #[case("10+", 10.0, true)]
    #[case("6", 6.0, false)]
    #[case("1/2", 0.5, false)]
    #[case("1 1/2", 1.5, false)]
    #[case("P6SM", 6.0, true)]
    fn test_parse_visibility(#[case] text: &str, #[case] miles: f32, #[case] or_more: bool) {
        let vis = parse_visibility(text).unwrap();
        assert!((vis.statute_miles - miles).abs() < f32::EPSILON);
        assert_eq!(vis.or_more, or_more);
    }

    #[rstest]
    #[case("")]
    #[case("abc")]
    #[case("1/0")]
    fn test_parse_visibility_rejects(#[case] text: &str) {
        assert!(parse_visibility(text).is_none());
    }

    #[test]
    fn test_station_record() {
        let json = r#"[{"icaoId": "KJFK", "site": "New York/JF Kennedy Intl", "country": "US", "siteType": ["METAR", "TAF"]}]"#;
        let records: Vec<StationRecord> = serde_json::from_str(json).unwrap();
        let requested = Ident::parse("KJFK").unwrap();
        let info = records.into_iter().next().unwrap().into_station_info(requested);
        assert!(info.sends_reports());
        assert_eq!(info.country.as_deref(), Some("US"));
    }
}
