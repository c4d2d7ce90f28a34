//! Character LCD and keypad abstractions
//!
//! The real plate is an RGB 16x2 character LCD with five buttons. The
//! traits here cover the handful of operations the display logic needs so
//! that a terminal stand-in or a test double can take its place.

use crate::Result;

/// The five plate buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Select,
    Left,
    Right,
    Up,
    Down,
}

impl Button {
    fn bit(self) -> u8 {
        match self {
            Button::Select => 1,
            Button::Left => 1 << 1,
            Button::Right => 1 << 2,
            Button::Up => 1 << 3,
            Button::Down => 1 << 4,
        }
    }
}

/// Buttons held down at the moment of a poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonSet(u8);

impl ButtonSet {
    pub const EMPTY: ButtonSet = ButtonSet(0);

    #[must_use]
    pub fn with(self, button: Button) -> Self {
        ButtonSet(self.0 | button.bit())
    }

    #[must_use]
    pub fn only(button: Button) -> Self {
        Self::EMPTY.with(button)
    }

    #[must_use]
    pub fn contains(self, button: Button) -> bool {
        self.0 & button.bit() != 0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Left and Right held together open the exit menu
    #[must_use]
    pub fn exit_chord(self) -> bool {
        self.contains(Button::Left) && self.contains(Button::Right)
    }
}

impl FromIterator<Button> for ButtonSet {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        iter.into_iter().fold(ButtonSet::EMPTY, ButtonSet::with)
    }
}

/// Backlight state of an RGB character LCD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backlight {
    Off,
    /// Plain backlight used for messages and menus
    White,
    Rgb(u8, u8, u8),
}

/// Operations of an HD44780 style character display
pub trait CharLcd {
    fn clear(&mut self);
    /// Move the write position; out of range values are clamped
    fn set_cursor(&mut self, col: usize, row: usize);
    /// Write at the cursor. `\n` continues at column 0 of the next row.
    fn message(&mut self, text: &str);
    fn show_cursor(&mut self, show: bool);
    fn set_backlight(&mut self, light: Backlight);
    /// Push pending changes to the device
    fn flush(&mut self) -> Result<()>;
}

pub trait Keypad {
    /// Buttons currently held down
    fn poll(&mut self) -> ButtonSet;
}

/// In-memory character grid with HD44780 write semantics
#[derive(Debug, Clone)]
pub struct LcdBuffer {
    cols: usize,
    rows: usize,
    grid: Vec<Vec<char>>,
    cursor: (usize, usize),
    cursor_visible: bool,
    backlight: Backlight,
}

impl LcdBuffer {
    #[must_use]
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            grid: vec![vec![' '; cols]; rows],
            cursor: (0, 0),
            cursor_visible: false,
            backlight: Backlight::White,
        }
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Row contents with trailing blanks removed
    #[must_use]
    pub fn line(&self, row: usize) -> String {
        self.grid
            .get(row)
            .map(|cells| cells.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        (0..self.rows).map(|row| self.line(row)).collect()
    }

    #[must_use]
    pub fn cursor(&self) -> Option<(usize, usize)> {
        self.cursor_visible.then_some(self.cursor)
    }

    #[must_use]
    pub fn backlight(&self) -> Backlight {
        self.backlight
    }

    /// Raw cell grid, one `Vec<char>` per row
    #[must_use]
    pub fn cells(&self) -> &[Vec<char>] {
        &self.grid
    }
}

impl CharLcd for LcdBuffer {
    fn clear(&mut self) {
        for row in &mut self.grid {
            row.fill(' ');
        }
        self.cursor = (0, 0);
    }

    fn set_cursor(&mut self, col: usize, row: usize) {
        self.cursor = (col.min(self.cols - 1), row.min(self.rows - 1));
    }

    fn message(&mut self, text: &str) {
        let (mut col, mut row) = self.cursor;
        for c in text.chars() {
            if c == '\n' {
                if row + 1 >= self.rows {
                    break;
                }
                row += 1;
                col = 0;
                continue;
            }
            if col < self.cols {
                self.grid[row][col] = c;
                col += 1;
            }
        }
        self.cursor = (col.min(self.cols - 1), row);
    }

    fn show_cursor(&mut self, show: bool) {
        self.cursor_visible = show;
    }

    fn set_backlight(&mut self, light: Backlight) {
        self.backlight = light;
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_set() {
        let set: ButtonSet = [Button::Left, Button::Right].into_iter().collect();
        assert!(set.exit_chord());
        assert!(!set.contains(Button::Select));
        assert!(!ButtonSet::only(Button::Left).exit_chord());
        assert!(ButtonSet::EMPTY.is_empty());
    }

    #[test]
    fn test_message_wraps_on_newline_and_truncates() {
        let mut lcd = LcdBuffer::new(16, 2);
        lcd.message("No connection\nCheck back soon");
        assert_eq!(lcd.lines(), vec!["No connection", "Check back soon"]);

        lcd.clear();
        lcd.message("This line is far too long for the panel");
        assert_eq!(lcd.line(0), "This line is far");
        assert_eq!(lcd.line(1), "");
    }

    #[test]
    fn test_set_cursor_overwrites() {
        let mut lcd = LcdBuffer::new(16, 2);
        lcd.message("4-Digit METAR\nKJFK");
        lcd.set_cursor(2, 1);
        lcd.message("L");
        assert_eq!(lcd.line(1), "KJLK");

        lcd.set_cursor(40, 9);
        lcd.message("Z");
        assert_eq!(lcd.line(1), "KJLK           Z");
    }

    #[test]
    fn test_cursor_visibility_and_backlight() {
        let mut lcd = LcdBuffer::new(16, 2);
        assert_eq!(lcd.cursor(), None);
        lcd.set_cursor(3, 1);
        lcd.show_cursor(true);
        assert_eq!(lcd.cursor(), Some((3, 1)));
        lcd.set_backlight(Backlight::Rgb(0, 255, 0));
        assert_eq!(lcd.backlight(), Backlight::Rgb(0, 255, 0));
    }
}
