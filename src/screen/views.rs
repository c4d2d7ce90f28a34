//! What each screen view paints, minus its buttons

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;

use crate::config::ScreenConfig;
use crate::models::{CloudLayer, MetarReport, WindDirection};

use super::layout::Layout;
use super::palette::Tone;
use super::widgets::{Canvas, Font, Fonts, Icon, measure, midpoint, point, radius_point};

/// Lowest top of the cloud graph, in hundreds of feet
const CLOUD_GRAPH_MIN_TOP: u32 = 80;

/// Format with a user supplied strftime pattern; "---" if the pattern is bad
#[must_use]
pub fn strftime(time: DateTime<Utc>, pattern: &str, utc: bool) -> String {
    let mut out = String::new();
    let written = if utc {
        write!(out, "{}", time.format(pattern))
    } else {
        write!(out, "{}", time.with_timezone(&Local).format(pattern))
    };
    match written {
        Ok(()) => out,
        Err(_) => "---".to_string(),
    }
}

/// Split `text` into lines of at most `length` characters, breaking at spaces
#[must_use]
pub fn wrap(text: &str, length: usize) -> Vec<&str> {
    let length = length.max(1);
    let mut lines = Vec::new();
    let mut rest = text.trim();

    while rest.chars().count() > length {
        let (limit, next) = rest
            .char_indices()
            .nth(length)
            .unwrap_or((rest.len(), ' '));
        // a space right after a full line is still a valid break
        let cut = match rest[..limit + next.len_utf8()].rfind(' ') {
            Some(idx) if idx > 0 => idx,
            _ => limit,
        };
        lines.push(rest[..cut].trim_end());
        rest = rest[cut..].trim_start();
    }
    if !rest.is_empty() {
        lines.push(rest);
    }
    lines
}

/// Everything a view needs besides the canvas
pub struct Scene<'a> {
    pub layout: &'a Layout,
    pub fonts: Fonts,
    pub settings: &'a ScreenConfig,
    pub report: Option<&'a MetarReport>,
    /// Station named in messages; the one being edited during selection
    pub station: String,
}

impl Scene<'_> {
    fn large(&self) -> bool {
        self.layout.large_display
    }

    pub fn loading<D: DrawTarget<Color = Rgb888>>(&self, canvas: &mut Canvas<'_, D>) {
        let line2 = format!("data for {}", self.station);
        self.message(canvas, "Fetching weather", &line2);
    }

    /// Two lines at the error positions
    pub fn message<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        line1: &str,
        line2: &str,
    ) {
        canvas.fill(Tone::White);
        let error = &self.layout.error;
        canvas.text(line1, point(error.line1), self.fonts.m2, Tone::Black);
        canvas.text(line2, point(error.line2), self.fonts.m2, Tone::Black);
    }

    pub fn no_network<D: DrawTarget<Color = Rgb888>>(&self, canvas: &mut Canvas<'_, D>) {
        self.message(canvas, "Waiting for a", "network conn");
    }

    pub fn main<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        now: DateTime<Utc>,
    ) {
        canvas.fill(Tone::White);
        let Some(report) = self.report else {
            return;
        };
        self.station_and_timestamp(canvas, report);
        self.flight_rules(canvas, report);
        self.wind(canvas, report);
        self.temperatures(canvas, report);
        self.altimeter_and_visibility(canvas, report);
        let (top_left, bottom_right) = self.layout.main.cloud_graph;
        self.cloud_graph(canvas, &report.clouds, point(top_left), point(bottom_right));
        if self.large() {
            self.wx_raw(canvas, report);
        }
        self.clock(canvas, now);
    }

    /// Main view with the options bar area cleared
    pub fn options<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        now: DateTime<Utc>,
    ) {
        self.main(canvas, now);
        let (top, width) = self.layout.main.util_back;
        let height = (self.layout.height as i32 - top).max(0) as u32;
        canvas.fill_rect(Point::new(0, top), Size::new(width, height), Tone::White);
    }

    pub fn clock<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        now: DateTime<Utc>,
    ) {
        let main = &self.layout.main;
        let (Some(clock), Some(label_at)) = (main.clock, main.clock_label) else {
            return;
        };
        let utc = self.settings.clock_utc;
        let text = strftime(now, &self.settings.clock_format, utc);
        let size = measure(&text, self.fonts.l2);
        canvas.fill_rect(point(clock), size, Tone::White);
        canvas.text(&text, point(clock), self.fonts.l2, Tone::Black);

        let label = if utc { "UTC" } else { "LCL" };
        let label_font = if self.large() { self.fonts.m1 } else { self.fonts.s3 };
        canvas.text(label, point(label_at), label_font, Tone::Black);
    }

    fn timestamp(&self, report: &MetarReport) -> String {
        report.time.map_or_else(
            || "---".to_string(),
            |time| strftime(time, &self.settings.timestamp_format, self.settings.clock_utc),
        )
    }

    fn station_and_timestamp<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        report: &MetarReport,
    ) {
        let main = &self.layout.main;
        let station = if report.station.is_empty() {
            "----"
        } else {
            report.station.as_str()
        };
        let mut stamp = self.timestamp(report);

        if let Some(title) = main.title {
            let text = format!("{station}  {stamp}");
            canvas.text(&text, point(title), self.fonts.m1, Tone::Black);
        } else if let Some(at) = main.station {
            canvas.text(station, point(at), self.fonts.m1, Tone::Black);
            match main.timestamp_label {
                Some(label) if self.large() => {
                    canvas.text("Updated", point(label), self.fonts.s3, Tone::Black);
                }
                _ => stamp = format!("TS: {stamp}"),
            }
            if let Some(at) = main.timestamp {
                canvas.text(&stamp, point(at), self.fonts.s3, Tone::Black);
            }
        }
    }

    fn flight_rules<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        report: &MetarReport,
    ) {
        let rules = Some(report.effective_flight_rules());
        let text = rules.map_or("N/A", |r| r.as_str());
        let (x, y) = self.layout.main.flight_rules;
        let at = Point::new(x + self.layout.fr_display.offset(rules), y);
        canvas.text(text, at, self.fonts.m1, Tone::for_flight_rules(rules));
    }

    fn wind<D: DrawTarget<Color = Rgb888>>(&self, canvas: &mut Canvas<'_, D>, report: &MetarReport) {
        let main = &self.layout.main;
        let wind = &report.wind;
        self.wind_compass(canvas, report, point(main.wind_compass), main.wind_compass_radius);

        if let Some(speed) = wind.speed_kt.filter(|s| *s > 0) {
            let text = format!("{speed} kt");
            canvas.text_centered(&text, point(main.wind_speed), self.fonts.s3, Tone::Black);
        }
        let gust = wind
            .gust_kt
            .map_or_else(|| "No Gust".to_string(), |g| format!("G: {g}"));
        canvas.text_centered(&gust, point(main.wind_gust), self.fonts.s3, Tone::Black);
    }

    fn wind_compass<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        report: &MetarReport,
        center: Point,
        radius: u32,
    ) {
        let wind = &report.wind;
        canvas.ring(center, radius, Tone::Gray, 3);
        let width = if self.large() { 4 } else { 2 };

        if wind.is_calm() {
            canvas.text_centered("Calm", center, self.fonts.s3, Tone::Black);
            return;
        }
        match wind.direction {
            Some(WindDirection::Variable) => {
                canvas.text_centered("VRB", center, self.fonts.s3, Tone::Black);
            }
            Some(WindDirection::Degrees(degrees)) => {
                let end = radius_point(i32::from(degrees), center, radius);
                canvas.line(center, end, Tone::Red, width);
                if let Some((from, to)) = wind.variable_range {
                    for bearing in [from, to] {
                        let end = radius_point(i32::from(bearing), center, radius);
                        canvas.line(center, end, Tone::Blue, width);
                    }
                }
                let text = format!("{degrees:03}");
                canvas.text_centered(&text, center, self.fonts.m1, Tone::Black);
            }
            None => {
                let size = self.fonts.l1.character_size.height;
                canvas.icon(Icon::Cancel, center, size, Tone::Red, Tone::White);
            }
        }
    }

    fn temperatures<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        report: &MetarReport,
    ) {
        let main = &self.layout.main;
        let (temp_label, diff_label, dew_label, humid_label) = if self.large() {
            ("Temp ", "Std Dev ", "Dewpoint ", "Humidity ")
        } else {
            ("TMP: ", "STD: ", "DEW: ", "HMD: ")
        };

        let dew = report
            .dewpoint
            .map_or_else(|| "--".to_string(), |d| format!("{d}°"));
        canvas.text(&format!("{dew_label}{dew}"), point(main.dew), self.fonts.s3, Tone::Black);

        let (temp, diff) = match (report.temperature, report.isa_deviation()) {
            (Some(t), Some(d)) => {
                let unit = if self.large() { "C" } else { "" };
                let sign = if d < 0 { "-" } else { "+" };
                (format!("{t}°{unit}"), format!("{sign}{}°", d.abs()))
            }
            _ => ("--".to_string(), "--".to_string()),
        };
        canvas.text(&format!("{temp_label}{temp}"), point(main.temp), self.fonts.s3, Tone::Black);
        canvas.text(
            &format!("{diff_label}{diff}"),
            point(main.temp_stdv),
            self.fonts.s3,
            Tone::Black,
        );

        let humid = report
            .relative_humidity()
            .map_or_else(|| "--".to_string(), |h| format!("{}%", h as i32));
        canvas.text(
            &format!("{humid_label}{humid}"),
            point(main.humid),
            self.fonts.s3,
            Tone::Black,
        );
    }

    fn altimeter_and_visibility<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        report: &MetarReport,
    ) {
        let main = &self.layout.main;
        let (altim_label, vis_label) = if self.large() {
            ("Altm ", "Visb ")
        } else {
            ("ALT: ", "VIS: ")
        };

        let altim = if self.settings.pressure_unit == "hpa" {
            report.altimeter_hpa.map(|hpa| format!("{hpa:.0}"))
        } else {
            report.altimeter_inhg().map(|inhg| format!("{inhg:.2}"))
        };
        let altim = altim.unwrap_or_else(|| "--".to_string());
        canvas.text(&format!("{altim_label}{altim}"), point(main.altim), self.fonts.s3, Tone::Black);

        let vis = report
            .visibility
            .map_or_else(|| "--".to_string(), |v| v.to_string());
        canvas.text(&format!("{vis_label}{vis}"), point(main.vis), self.fonts.s3, Tone::Black);
    }

    /// Cloud bases on a vertical scale, topped at 8000 ft or the highest layer
    fn cloud_graph<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        clouds: &[CloudLayer],
        top_left: Point,
        bottom_right: Point,
    ) {
        let header = "Clouds AGL";
        let header_height = measure(header, self.fonts.s3).height as i32;
        let header_center = midpoint(
            top_left,
            Point::new(bottom_right.x, top_left.y + header_height),
        );
        canvas.text_centered(header, header_center, self.fonts.s3, Tone::Black);

        let (mut left, top, mut right, mut bottom) =
            (top_left.x, top_left.y + header_height, bottom_right.x, bottom_right.y);
        canvas.polyline(
            &[
                Point::new(left, top),
                Point::new(left, bottom),
                Point::new(right, bottom),
            ],
            Tone::Black,
            3,
        );

        if clouds.is_empty() {
            let center = midpoint(Point::new(left, top), Point::new(right, bottom));
            canvas.text_centered("CLR", center, self.fonts.m2, Tone::Blue);
            return;
        }

        let mut scale_top = CLOUD_GRAPH_MIN_TOP;
        let mut on_left = true;
        left += 5;
        right -= 5;
        bottom -= 10;

        for cloud in clouds.iter().rev() {
            let Some(base) = cloud.base_ft.map(|ft| ft / 100).filter(|b| *b > 0) else {
                continue;
            };
            scale_top = scale_top.max(base);
            let y = bottom - ((bottom - top) as f32 * base as f32 / scale_top as f32) as i32;
            let text = cloud.repr();
            let size = measure(&text, self.fonts.s1);
            let line_y = y + size.height as i32 / 2;

            if on_left {
                canvas.text(&text, Point::new(left, y), self.fonts.s1, Tone::Blue);
                canvas.line(
                    Point::new(left + size.width as i32 + 2, line_y),
                    Point::new(right, line_y),
                    Tone::Blue,
                    1,
                );
            } else {
                let x = right - size.width as i32;
                canvas.text(&text, Point::new(x, y), self.fonts.s1, Tone::Blue);
                canvas.line(Point::new(left, line_y), Point::new(x - 2, line_y), Tone::Blue, 1);
            }
            on_left = !on_left;
        }
    }

    /// Weather codes and the raw report under the main view on large screens
    fn wx_raw<D: DrawTarget<Color = Rgb888>>(&self, canvas: &mut Canvas<'_, D>, report: &MetarReport) {
        let Some(wxraw) = self.layout.wxraw else {
            return;
        };
        if report.raw.is_empty() {
            return;
        }
        let mut y = wxraw.start.1;
        let x = wxraw.start.0;
        let mut raw_font = wxraw.raw.large;

        let codes = sorted_codes(report);
        if !codes.is_empty() {
            let lines = TextLines {
                length: wxraw.wx_length,
                space: wxraw.line_space,
                font: self.fonts.s2,
            };
            y = lines.draw(canvas, &codes, Point::new(x, y), None, None);
            raw_font = wxraw.raw.small;
        }

        let (size, length, padding) = raw_font;
        let lines = TextLines {
            length,
            space: wxraw.line_space,
            font: super::widgets::font(size),
        };
        lines.draw(canvas, &[report.raw.clone()], Point::new(x, y + padding), None, None);
    }

    /// Other weather in two columns, then the wrapped remarks
    pub fn remarks<D: DrawTarget<Color = Rgb888>>(&self, canvas: &mut Canvas<'_, D>) {
        canvas.fill(Tone::White);
        let (Some(report), Some(wxrmk)) = (self.report, self.layout.wxrmk) else {
            return;
        };
        let mut y = wxrmk.padding;

        let codes = sorted_codes(report);
        if !codes.is_empty() {
            let lines = TextLines {
                length: wxrmk.wx_length,
                space: wxrmk.line_space,
                font: self.fonts.s2,
            };
            let header = Some(("Other Weather", self.fonts.s3));
            y = lines.draw(canvas, &codes, Point::new(wxrmk.col1, y), header, Some(wxrmk.col2));
        }
        if let Some(remarks) = &report.remarks {
            let lines = TextLines {
                length: wxrmk.rmk_length,
                space: wxrmk.line_space,
                font: self.fonts.s2,
            };
            let header = Some(("Remarks", self.fonts.s3));
            lines.draw(canvas, &[remarks.clone()], Point::new(wxrmk.col1, y), header, None);
        }
    }

    /// The station being edited, one large character per column
    pub fn selection<D: DrawTarget<Color = Rgb888>>(&self, canvas: &mut Canvas<'_, D>) {
        canvas.fill(Tone::White);
        let select = &self.layout.select;
        for (col, ch) in self.station.chars().enumerate() {
            let center = Point::new(select.column_x(col), select.row_char);
            canvas.text_centered(&ch.to_string(), center, self.fonts.l1, Tone::Black);
        }
    }

    pub fn quit<D: DrawTarget<Color = Rgb888>>(&self, canvas: &mut Canvas<'_, D>, prompt: &str) {
        canvas.fill(Tone::White);
        let center = Point::new(self.layout.width as i32 / 2, self.layout.quit.text_y);
        canvas.text_centered(prompt, center, self.fonts.m2, Tone::Black);
    }

    pub fn info<D: DrawTarget<Color = Rgb888>>(&self, canvas: &mut Canvas<'_, D>) {
        canvas.fill(Tone::White);
        let info = &self.layout.info;
        let x = self.layout.width as i32 / 2;
        let version = format!("Version {}", crate::VERSION);
        let lines: [(&str, i32, Font); 4] = [
            ("METAR-RasPi", info.title_y, self.fonts.m2),
            (version.as_str(), info.name_y, self.fonts.s3),
            ("Data: aviationweather.gov", info.email_y, self.fonts.s3),
            ("github.com/devdupont/METAR-RasPi", info.url_y, self.fonts.s1),
        ];
        for (text, y, font) in lines {
            canvas.text_centered(text, Point::new(x, y), font, Tone::Black);
        }
    }
}

fn sorted_codes(report: &MetarReport) -> Vec<String> {
    let mut codes = report.wx_codes.clone();
    codes.sort_by_key(String::len);
    codes
}

/// Wrapped text block, optionally laid out in two columns
struct TextLines {
    length: usize,
    space: i32,
    font: Font,
}

impl TextLines {
    /// Draw `items` from `at`; returns the y below the block.
    ///
    /// With `right_x` short items alternate between the two columns and
    /// long items take a full row. Without it each item is wrapped.
    fn draw<D: DrawTarget<Color = Rgb888>>(
        &self,
        canvas: &mut Canvas<'_, D>,
        items: &[String],
        at: Point,
        header: Option<(&str, Font)>,
        right_x: Option<i32>,
    ) -> i32 {
        let mut y = at.y;
        if let Some((header, font)) = header {
            let size = canvas.text(header, at, font, Tone::Black);
            y += size.height as i32 + self.space;
        }
        let step = self.font.character_size.height as i32 + self.space;
        let mut on_left = true;

        for item in items {
            let long = item.chars().count() > self.length;
            match right_x {
                Some(right) => {
                    if long && !on_left {
                        y += step;
                        on_left = true;
                    }
                    let x = if on_left { at.x } else { right };
                    canvas.text(item, Point::new(x, y), self.font, Tone::Black);
                    if on_left && !long {
                        on_left = false;
                    } else {
                        y += step;
                        on_left = true;
                    }
                }
                None => {
                    for line in wrap(item, self.length) {
                        canvas.text(line, Point::new(at.x, y), self.font, Tone::Black);
                        y += step;
                    }
                }
            }
        }
        if !on_left {
            y += step;
        }
        y
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wrap_breaks_at_spaces() {
        let lines = wrap("AO2 SLP199 T01220044 10128 20094 53012", 16);
        assert_eq!(lines, vec!["AO2 SLP199", "T01220044 10128", "20094 53012"]);
        for line in &lines {
            assert!(line.len() <= 16);
        }
    }

    #[test]
    fn test_wrap_hard_cuts_long_words() {
        assert_eq!(wrap("ABCDEFGHIJ", 4), vec!["ABCD", "EFGH", "IJ"]);
        assert_eq!(wrap("short", 40), vec!["short"]);
        assert!(wrap("   ", 10).is_empty());
    }

    #[test]
    fn test_strftime() {
        let time = Utc.with_ymd_and_hms(2026, 10, 19, 16, 51, 0).unwrap();
        assert_eq!(strftime(time, "%d-%H:%M", true), "19-16:51");
        assert_eq!(strftime(time, "%H%MZ", true), "1651Z");
        assert_eq!(strftime(time, "%Q", true), "---");
    }
}
