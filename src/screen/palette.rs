//! Screen colors
//!
//! Views name colors by [`Tone`] and the [`Palette`] resolves them, so
//! inverting the display only swaps black and white in one place.

use embedded_graphics::pixelcolor::Rgb888;

use crate::models::FlightRules;

pub const WHITE: Rgb888 = Rgb888::new(255, 255, 255);
pub const BLACK: Rgb888 = Rgb888::new(0, 0, 0);
pub const RED: Rgb888 = Rgb888::new(255, 0, 0);
pub const GREEN: Rgb888 = Rgb888::new(0, 255, 0);
pub const BLUE: Rgb888 = Rgb888::new(0, 0, 255);
pub const PURPLE: Rgb888 = Rgb888::new(150, 0, 255);
pub const GRAY: Rgb888 = Rgb888::new(60, 60, 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Background
    White,
    /// Foreground text and lines
    Black,
    Red,
    Green,
    Blue,
    Purple,
    Gray,
}

impl Tone {
    /// Color of the flight rules text; black when unknown
    #[must_use]
    pub fn for_flight_rules(rules: Option<FlightRules>) -> Self {
        match rules {
            Some(FlightRules::Vfr) => Tone::Green,
            Some(FlightRules::Mvfr) => Tone::Blue,
            Some(FlightRules::Ifr) => Tone::Red,
            Some(FlightRules::Lifr) => Tone::Purple,
            None => Tone::Black,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Palette {
    inverted: bool,
}

impl Palette {
    #[must_use]
    pub fn new(inverted: bool) -> Self {
        Self { inverted }
    }

    #[must_use]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    pub fn invert(&mut self) {
        self.inverted = !self.inverted;
    }

    #[must_use]
    pub fn color(&self, tone: Tone) -> Rgb888 {
        match (tone, self.inverted) {
            (Tone::White, false) | (Tone::Black, true) => WHITE,
            (Tone::Black, false) | (Tone::White, true) => BLACK,
            (Tone::Red, _) => RED,
            (Tone::Green, _) => GREEN,
            (Tone::Blue, _) => BLUE,
            (Tone::Purple, _) => PURPLE,
            (Tone::Gray, _) => GRAY,
        }
    }

    #[must_use]
    pub fn background(&self) -> Rgb888 {
        self.color(Tone::White)
    }

    #[must_use]
    pub fn foreground(&self) -> Rgb888 {
        self.color(Tone::Black)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inversion_swaps_black_and_white() {
        let mut palette = Palette::default();
        assert_eq!(palette.background(), WHITE);
        assert_eq!(palette.foreground(), BLACK);

        palette.invert();
        assert!(palette.is_inverted());
        assert_eq!(palette.background(), BLACK);
        assert_eq!(palette.foreground(), WHITE);
        assert_eq!(palette.color(Tone::Red), RED);
        assert_eq!(palette.color(Tone::Gray), GRAY);
    }

    #[test]
    fn test_flight_rules_tones() {
        assert_eq!(Tone::for_flight_rules(Some(FlightRules::Vfr)), Tone::Green);
        assert_eq!(Tone::for_flight_rules(Some(FlightRules::Lifr)), Tone::Purple);
        assert_eq!(Tone::for_flight_rules(None), Tone::Black);
    }
}
