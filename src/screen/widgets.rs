//! Drawing helpers and touch buttons
//!
//! ProFont only covers ASCII, so the symbols the screen needs (check mark,
//! cross, triangles, moon, sun, reload, gear and the degree sign) are drawn
//! from primitives.

use std::f64::consts::PI;

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    Arc, Circle, Line, Polyline, PrimitiveStyle, Rectangle, Triangle,
};
use embedded_graphics::text::{Baseline, Text};
use profont::{
    PROFONT_7_POINT, PROFONT_9_POINT, PROFONT_10_POINT, PROFONT_12_POINT, PROFONT_14_POINT,
    PROFONT_18_POINT, PROFONT_24_POINT,
};

use super::layout::{Coord, FontSizes};
use super::palette::{Palette, Tone};

pub type Font = &'static MonoFont<'static>;

/// Available ProFont sizes, smallest first
const PROFONT_SIZES: [(u32, Font); 7] = [
    (7, &PROFONT_7_POINT),
    (9, &PROFONT_9_POINT),
    (10, &PROFONT_10_POINT),
    (12, &PROFONT_12_POINT),
    (14, &PROFONT_14_POINT),
    (18, &PROFONT_18_POINT),
    (24, &PROFONT_24_POINT),
];

/// Largest ProFont not bigger than `points`
#[must_use]
pub fn font(points: u32) -> Font {
    PROFONT_SIZES
        .iter()
        .rev()
        .find(|(size, _)| *size <= points)
        .map_or(&PROFONT_7_POINT, |(_, font)| *font)
}

/// Layout font sizes resolved to fonts
#[derive(Clone, Copy)]
pub struct Fonts {
    pub s1: Font,
    pub s2: Font,
    pub s3: Font,
    pub m1: Font,
    pub m2: Font,
    pub l1: Font,
    /// Clock font; `l1` when the layout has no `l2`
    pub l2: Font,
}

impl Fonts {
    #[must_use]
    pub fn new(sizes: &FontSizes) -> Self {
        Self {
            s1: font(sizes.s1),
            s2: font(sizes.s2),
            s3: font(sizes.s3),
            m1: font(sizes.m1),
            m2: font(sizes.m2),
            l1: font(sizes.l1),
            l2: font(sizes.l2.unwrap_or(sizes.l1)),
        }
    }
}

#[must_use]
pub fn point(coord: Coord) -> Point {
    Point::new(coord.0, coord.1)
}

/// Point on the circle of `radius` around `center` at a compass bearing
#[must_use]
pub fn radius_point(degree: i32, center: Point, radius: u32) -> Point {
    let angle = f64::from(degree.rem_euclid(360) - 90) * PI / 180.0;
    let radius = f64::from(radius);
    Point::new(
        (f64::from(center.x) + radius * angle.cos()) as i32,
        (f64::from(center.y) + radius * angle.sin()) as i32,
    )
}

#[must_use]
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2, (a.y + b.y) / 2)
}

/// Rendered size of a single line of text
#[must_use]
pub fn measure(text: &str, font: Font) -> Size {
    let advance = font.character_size.width + font.character_spacing;
    Size::new(
        text.chars().count() as u32 * advance,
        font.character_size.height,
    )
}

/// A draw target paired with the active palette
pub struct Canvas<'a, D> {
    target: &'a mut D,
    palette: Palette,
}

impl<'a, D> Canvas<'a, D>
where
    D: DrawTarget<Color = Rgb888>,
{
    pub fn new(target: &'a mut D, palette: Palette) -> Self {
        Self { target, palette }
    }

    #[must_use]
    pub fn palette(&self) -> Palette {
        self.palette
    }

    fn color(&self, tone: Tone) -> Rgb888 {
        self.palette.color(tone)
    }

    pub fn fill(&mut self, tone: Tone) {
        let color = self.color(tone);
        self.target.clear(color).ok();
    }

    pub fn fill_rect(&mut self, top_left: Point, size: Size, tone: Tone) {
        Rectangle::new(top_left, size)
            .into_styled(PrimitiveStyle::with_fill(self.color(tone)))
            .draw(self.target)
            .ok();
    }

    pub fn outline_rect(&mut self, bounds: Rectangle, tone: Tone, width: u32) {
        bounds
            .into_styled(PrimitiveStyle::with_stroke(self.color(tone), width))
            .draw(self.target)
            .ok();
    }

    pub fn line(&mut self, from: Point, to: Point, tone: Tone, width: u32) {
        Line::new(from, to)
            .into_styled(PrimitiveStyle::with_stroke(self.color(tone), width))
            .draw(self.target)
            .ok();
    }

    pub fn polyline(&mut self, points: &[Point], tone: Tone, width: u32) {
        Polyline::new(points)
            .into_styled(PrimitiveStyle::with_stroke(self.color(tone), width))
            .draw(self.target)
            .ok();
    }

    pub fn disc(&mut self, center: Point, radius: u32, tone: Tone) {
        Circle::with_center(center, radius * 2)
            .into_styled(PrimitiveStyle::with_fill(self.color(tone)))
            .draw(self.target)
            .ok();
    }

    pub fn ring(&mut self, center: Point, radius: u32, tone: Tone, width: u32) {
        Circle::with_center(center, radius * 2)
            .into_styled(PrimitiveStyle::with_stroke(self.color(tone), width))
            .draw(self.target)
            .ok();
    }

    pub fn triangle(&mut self, a: Point, b: Point, c: Point, tone: Tone) {
        Triangle::new(a, b, c)
            .into_styled(PrimitiveStyle::with_fill(self.color(tone)))
            .draw(self.target)
            .ok();
    }

    /// Draw text with its top left corner at `at`; returns the drawn size.
    ///
    /// `°` is drawn as a small ring taking one character cell.
    pub fn text(&mut self, text: &str, at: Point, font: Font, tone: Tone) -> Size {
        let color = self.color(tone);
        let style = MonoTextStyle::new(font, color);
        let cell = font.character_size.width + font.character_spacing;
        let mut x = at.x;

        for (i, part) in text.split('°').enumerate() {
            if i > 0 {
                let diameter = (font.character_size.width / 2).max(3);
                let offset = font.character_size.height as i32 / 6;
                Circle::new(Point::new(x + 1, at.y + offset), diameter)
                    .into_styled(PrimitiveStyle::with_stroke(color, 1))
                    .draw(self.target)
                    .ok();
                x += cell as i32;
            }
            if !part.is_empty() {
                Text::with_baseline(part, Point::new(x, at.y), style, Baseline::Top)
                    .draw(self.target)
                    .ok();
                x += measure(part, font).width as i32;
            }
        }
        measure(text, font)
    }

    /// Draw text centered on `center`
    pub fn text_centered(&mut self, text: &str, center: Point, font: Font, tone: Tone) -> Size {
        let size = measure(text, font);
        let top_left = Point::new(
            center.x - size.width as i32 / 2,
            center.y - size.height as i32 / 2,
        );
        self.text(text, top_left, font, tone)
    }

    /// Draw a symbol inside a circle of `radius`
    pub fn icon(&mut self, icon: Icon, center: Point, radius: u32, tone: Tone, fill: Tone) {
        let s = (radius as i32 * 2 / 5).max(4);
        let stroke = (radius / 8).max(2);
        let (cx, cy) = (center.x, center.y);

        match icon {
            Icon::Cancel => {
                self.line(
                    Point::new(cx - s, cy - s),
                    Point::new(cx + s, cy + s),
                    tone,
                    stroke,
                );
                self.line(
                    Point::new(cx - s, cy + s),
                    Point::new(cx + s, cy - s),
                    tone,
                    stroke,
                );
            }
            Icon::Check => {
                let points = [
                    Point::new(cx - s, cy),
                    Point::new(cx - s / 3, cy + s * 2 / 3),
                    Point::new(cx + s, cy - s * 2 / 3),
                ];
                self.polyline(&points, tone, stroke + 1);
            }
            Icon::Up => self.triangle(
                Point::new(cx, cy - s),
                Point::new(cx - s, cy + s * 2 / 3),
                Point::new(cx + s, cy + s * 2 / 3),
                tone,
            ),
            Icon::Down => self.triangle(
                Point::new(cx, cy + s),
                Point::new(cx - s, cy - s * 2 / 3),
                Point::new(cx + s, cy - s * 2 / 3),
                tone,
            ),
            Icon::Moon => {
                self.disc(center, s as u32, tone);
                self.disc(Point::new(cx + s / 2, cy - s / 3), s as u32, fill);
            }
            Icon::Sun => {
                self.disc(center, (s / 2) as u32, tone);
                for degree in (0..360).step_by(45) {
                    let from = radius_point(degree, center, (s * 3 / 4) as u32);
                    let to = radius_point(degree, center, s as u32);
                    self.line(from, to, tone, 2);
                }
            }
            Icon::Info => {
                self.disc(Point::new(cx, cy - s * 2 / 3), (s / 5).max(2) as u32, tone);
                let bar = (s / 3).max(2);
                self.fill_rect(
                    Point::new(cx - bar / 2, cy - s / 4),
                    Size::new(bar as u32, (s + s / 4) as u32),
                    tone,
                );
            }
            Icon::Reload => {
                Arc::with_center(center, (s * 2) as u32, 30.0_f32.deg(), 300.0_f32.deg())
                    .into_styled(PrimitiveStyle::with_stroke(self.color(tone), stroke))
                    .draw(self.target)
                    .ok();
                let tip = radius_point(120, center, s as u32);
                self.triangle(
                    Point::new(tip.x - s / 2, tip.y),
                    Point::new(tip.x + s / 2, tip.y),
                    Point::new(tip.x, tip.y - s / 2),
                    tone,
                );
            }
            Icon::Settings => {
                let inner = (s * 3 / 5) as u32;
                self.ring(center, inner, tone, (s / 3).max(2) as u32);
                for degree in (0..360).step_by(45) {
                    let from = radius_point(degree, center, inner);
                    let to = radius_point(degree, center, s as u32);
                    self.line(from, to, tone, (s / 3).max(2) as u32);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Cancel,
    Check,
    Up,
    Down,
    Moon,
    Sun,
    Info,
    Reload,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonShape {
    /// Outlined box with a text label
    Rect {
        bounds: Rectangle,
        text: String,
        tone: Tone,
        outline: u32,
    },
    /// Filled circle with a symbol
    Icon {
        center: Point,
        icon: Icon,
        tone: Tone,
        fill: Tone,
    },
    /// Red circle with a power symbol
    Shutdown { center: Point },
    /// Green circle with the selection arrows
    Selection { center: Point },
}

/// A touch target that maps to an action of type `A`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button<A> {
    shape: ButtonShape,
    radius: u32,
    action: A,
}

impl<A: Copy> Button<A> {
    #[must_use]
    pub fn rect(
        bounds: (i32, i32, u32, u32),
        text: impl Into<String>,
        tone: Tone,
        outline: u32,
        action: A,
    ) -> Self {
        let (x, y, width, height) = bounds;
        Self {
            shape: ButtonShape::Rect {
                bounds: Rectangle::new(Point::new(x, y), Size::new(width, height)),
                text: text.into(),
                tone,
                outline,
            },
            radius: 0,
            action,
        }
    }

    #[must_use]
    pub fn icon(center: Point, radius: u32, icon: Icon, tone: Tone, fill: Tone, action: A) -> Self {
        Self {
            shape: ButtonShape::Icon {
                center,
                icon,
                tone,
                fill,
            },
            radius,
            action,
        }
    }

    /// White cross on `fill`
    #[must_use]
    pub fn cancel(center: Point, radius: u32, fill: Tone, action: A) -> Self {
        Self::icon(center, radius, Icon::Cancel, Tone::White, fill, action)
    }

    #[must_use]
    pub fn shutdown(center: Point, radius: u32, action: A) -> Self {
        Self {
            shape: ButtonShape::Shutdown { center },
            radius,
            action,
        }
    }

    #[must_use]
    pub fn selection(center: Point, radius: u32, action: A) -> Self {
        Self {
            shape: ButtonShape::Selection { center },
            radius,
            action,
        }
    }

    #[must_use]
    pub fn action(&self) -> A {
        self.action
    }

    #[must_use]
    pub fn shape(&self) -> &ButtonShape {
        &self.shape
    }

    /// Rectangles only count touches strictly inside their bounds
    #[must_use]
    pub fn is_clicked(&self, at: Point) -> bool {
        match &self.shape {
            ButtonShape::Rect { bounds, .. } => {
                let Some(bottom_right) = bounds.bottom_right() else {
                    return false;
                };
                let (x1, y1) = (bounds.top_left.x, bounds.top_left.y);
                let (x2, y2) = (bottom_right.x + 1, bottom_right.y + 1);
                x1 < at.x && at.x < x2 && y1 < at.y && at.y < y2
            }
            ButtonShape::Icon { center, .. }
            | ButtonShape::Shutdown { center }
            | ButtonShape::Selection { center } => {
                let dx = f64::from(center.x - at.x);
                let dy = f64::from(center.y - at.y);
                dx.hypot(dy) < f64::from(self.radius)
            }
        }
    }

    pub fn draw<D>(&self, canvas: &mut Canvas<'_, D>, text_font: Font)
    where
        D: DrawTarget<Color = Rgb888>,
    {
        let radius = self.radius;
        match &self.shape {
            ButtonShape::Rect {
                bounds,
                text,
                tone,
                outline,
            } => {
                canvas.outline_rect(*bounds, *tone, *outline);
                canvas.text_centered(text, bounds.center(), text_font, *tone);
            }
            ButtonShape::Icon {
                center,
                icon,
                tone,
                fill,
            } => {
                canvas.disc(*center, radius, *fill);
                canvas.icon(*icon, *center, radius, *tone, *fill);
            }
            ButtonShape::Shutdown { center } => {
                canvas.disc(*center, radius, Tone::Red);
                canvas.disc(*center, radius.saturating_sub(6), Tone::White);
                canvas.disc(*center, radius.saturating_sub(9), Tone::Red);
                canvas.fill_rect(
                    Point::new(center.x - 2, center.y - 10),
                    Size::new(4, 20),
                    Tone::White,
                );
            }
            ButtonShape::Selection { center } => {
                canvas.disc(*center, radius, Tone::Green);
                let shift = (radius / 2) as i32;
                let arrow = radius * 3 / 4;
                canvas.icon(
                    Icon::Up,
                    Point::new(center.x, center.y - shift),
                    arrow,
                    Tone::White,
                    Tone::Green,
                );
                canvas.icon(
                    Icon::Down,
                    Point::new(center.x, center.y + shift),
                    arrow,
                    Tone::White,
                    Tone::Green,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::palette::{GREEN, RED, WHITE};
    use embedded_graphics_simulator::SimulatorDisplay;
    use rstest::rstest;

    #[rstest]
    #[case(0, Point::new(100, 50))]
    #[case(90, Point::new(150, 100))]
    #[case(180, Point::new(100, 150))]
    #[case(270, Point::new(50, 100))]
    #[case(450, Point::new(150, 100))]
    fn test_radius_point(#[case] degree: i32, #[case] expected: Point) {
        let point = radius_point(degree, Point::new(100, 100), 50);
        assert!((point.x - expected.x).abs() <= 1, "{point:?}");
        assert!((point.y - expected.y).abs() <= 1, "{point:?}");
    }

    #[test]
    fn test_font_picks_largest_fitting_size() {
        assert_eq!(font(14).character_size, PROFONT_14_POINT.character_size);
        assert_eq!(font(16).character_size, PROFONT_14_POINT.character_size);
        assert_eq!(font(3).character_size, PROFONT_7_POINT.character_size);
        assert_eq!(font(40).character_size, PROFONT_24_POINT.character_size);
    }

    #[test]
    fn test_rect_hit_is_strict() {
        let button = Button::rect((10, 10, 20, 10), "WX", Tone::Red, 2, ());
        assert!(button.is_clicked(Point::new(15, 15)));
        assert!(!button.is_clicked(Point::new(10, 15)));
        assert!(!button.is_clicked(Point::new(30, 15)));
        assert!(!button.is_clicked(Point::new(15, 20)));
        assert!(button.is_clicked(Point::new(29, 19)));
    }

    #[test]
    fn test_round_hit_uses_distance() {
        let button = Button::cancel(Point::new(50, 50), 10, Tone::Gray, 7);
        assert!(button.is_clicked(Point::new(50, 50)));
        assert!(button.is_clicked(Point::new(57, 57)));
        assert!(!button.is_clicked(Point::new(60, 50)));
        assert_eq!(button.action(), 7);
    }

    #[test]
    fn test_degree_sign_takes_one_cell() {
        let font = font(10);
        assert_eq!(measure("12°", font).width, measure("12C", font).width);
    }

    #[test]
    fn test_buttons_draw_in_their_colors() {
        let mut display = SimulatorDisplay::<Rgb888>::new(Size::new(100, 100));
        let mut canvas = Canvas::new(&mut display, Palette::default());
        canvas.fill(Tone::White);
        Button::shutdown(Point::new(30, 30), 20, ()).draw(&mut canvas, font(10));
        Button::selection(Point::new(70, 70), 20, ()).draw(&mut canvas, font(10));

        assert_eq!(display.get_pixel(Point::new(30, 13)), RED);
        assert_eq!(display.get_pixel(Point::new(55, 70)), GREEN);
        assert_eq!(display.get_pixel(Point::new(99, 0)), WHITE);
    }
}
