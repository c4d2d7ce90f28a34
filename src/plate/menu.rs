//! Keypad menus: station picker and exit confirmation

use crate::models::{IDENT_LEN, Ident};

use super::lcd::{Button, ButtonSet, CharLcd};

/// Title row of the station picker
pub const PICKER_TITLE: &str = "4-Digit METAR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerEvent {
    /// Nothing pressed
    Idle,
    /// Cursor moved or a character changed
    Changed,
    Confirmed(Ident),
    /// Left and Right held together
    ExitRequested,
}

/// Edits a station identifier one character at a time
#[derive(Debug, Clone)]
pub struct StationPicker {
    ident: Ident,
    cursor: usize,
}

impl StationPicker {
    #[must_use]
    pub fn new(ident: Ident) -> Self {
        Self { ident, cursor: 0 }
    }

    #[must_use]
    pub fn ident(&self) -> Ident {
        self.ident
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Apply one keypad poll. Only the highest priority button counts.
    pub fn handle(&mut self, buttons: ButtonSet) -> PickerEvent {
        if buttons.exit_chord() {
            PickerEvent::ExitRequested
        } else if buttons.contains(Button::Up) {
            self.ident.decrement(self.cursor);
            PickerEvent::Changed
        } else if buttons.contains(Button::Down) {
            self.ident.increment(self.cursor);
            PickerEvent::Changed
        } else if buttons.contains(Button::Right) {
            if self.cursor + 1 < IDENT_LEN {
                self.cursor += 1;
            }
            PickerEvent::Changed
        } else if buttons.contains(Button::Left) {
            self.cursor = self.cursor.saturating_sub(1);
            PickerEvent::Changed
        } else if buttons.contains(Button::Select) {
            PickerEvent::Confirmed(self.ident)
        } else {
            PickerEvent::Idle
        }
    }

    pub fn render(&self, lcd: &mut impl CharLcd) {
        lcd.clear();
        lcd.message(PICKER_TITLE);
        lcd.set_cursor(0, 1);
        lcd.message(&self.ident.station());
        lcd.set_cursor(self.cursor, 1);
        lcd.show_cursor(true);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmEvent {
    Pending,
    Yes,
    No,
}

/// Y/N prompt, defaulting to N
#[derive(Debug, Clone)]
pub struct ConfirmExit {
    prompt: &'static str,
    yes: bool,
}

impl ConfirmExit {
    #[must_use]
    pub fn new(prompt: &'static str) -> Self {
        Self { prompt, yes: false }
    }

    #[must_use]
    pub fn is_yes(&self) -> bool {
        self.yes
    }

    pub fn handle(&mut self, buttons: ButtonSet) -> ConfirmEvent {
        if buttons.contains(Button::Right) && self.yes {
            self.yes = false;
            ConfirmEvent::Pending
        } else if buttons.contains(Button::Left) && !self.yes {
            self.yes = true;
            ConfirmEvent::Pending
        } else if buttons.contains(Button::Select) {
            if self.yes {
                ConfirmEvent::Yes
            } else {
                ConfirmEvent::No
            }
        } else {
            ConfirmEvent::Pending
        }
    }

    pub fn render(&self, lcd: &mut impl CharLcd) {
        lcd.clear();
        lcd.message(self.prompt);
        lcd.set_cursor(0, 1);
        lcd.message("Y N");
        lcd.set_cursor(if self.yes { 0 } else { 2 }, 1);
        lcd.show_cursor(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::lcd::LcdBuffer;

    fn press(button: Button) -> ButtonSet {
        ButtonSet::only(button)
    }

    #[test]
    fn test_picker_edits_and_confirms() {
        let mut picker = StationPicker::new(Ident::parse("KJFK").unwrap());

        assert_eq!(picker.handle(press(Button::Down)), PickerEvent::Changed);
        assert_eq!(picker.ident().station(), "LJFK");
        assert_eq!(picker.handle(press(Button::Up)), PickerEvent::Changed);
        assert_eq!(picker.handle(press(Button::Up)), PickerEvent::Changed);
        assert_eq!(picker.ident().station(), "JJFK");

        picker.handle(press(Button::Right));
        picker.handle(press(Button::Right));
        picker.handle(press(Button::Right));
        picker.handle(press(Button::Right));
        assert_eq!(picker.cursor(), 3);
        picker.handle(press(Button::Down));
        assert_eq!(picker.ident().station(), "JJFL");

        assert_eq!(picker.handle(ButtonSet::EMPTY), PickerEvent::Idle);
        let ident = Ident::parse("JJFL").unwrap();
        assert_eq!(picker.handle(press(Button::Select)), PickerEvent::Confirmed(ident));
    }

    #[test]
    fn test_picker_cursor_stays_in_bounds() {
        let mut picker = StationPicker::new(Ident::parse("KJFK").unwrap());
        picker.handle(press(Button::Left));
        assert_eq!(picker.cursor(), 0);
    }

    #[test]
    fn test_picker_chord_beats_single_buttons() {
        let mut picker = StationPicker::new(Ident::parse("KJFK").unwrap());
        let chord: ButtonSet = [Button::Left, Button::Right, Button::Up].into_iter().collect();
        assert_eq!(picker.handle(chord), PickerEvent::ExitRequested);
        assert_eq!(picker.ident().station(), "KJFK");
    }

    #[test]
    fn test_picker_render() {
        let mut picker = StationPicker::new(Ident::parse("EGLL").unwrap());
        picker.handle(press(Button::Right));
        let mut lcd = LcdBuffer::new(16, 2);
        picker.render(&mut lcd);
        assert_eq!(lcd.lines(), vec!["4-Digit METAR", "EGLL"]);
        assert_eq!(lcd.cursor(), Some((1, 1)));
    }

    #[test]
    fn test_confirm_defaults_to_no() {
        let mut confirm = ConfirmExit::new("Shutdown the Pi?");
        assert_eq!(confirm.handle(press(Button::Select)), ConfirmEvent::No);

        assert_eq!(confirm.handle(press(Button::Left)), ConfirmEvent::Pending);
        assert!(confirm.is_yes());
        assert_eq!(confirm.handle(press(Button::Right)), ConfirmEvent::Pending);
        assert!(!confirm.is_yes());
        confirm.handle(press(Button::Left));
        assert_eq!(confirm.handle(press(Button::Select)), ConfirmEvent::Yes);
    }

    #[test]
    fn test_confirm_render() {
        let mut confirm = ConfirmExit::new("Shutdown the Pi?");
        let mut lcd = LcdBuffer::new(16, 2);
        confirm.render(&mut lcd);
        assert_eq!(lcd.lines(), vec!["Shutdown the Pi?", "Y N"]);
        assert_eq!(lcd.cursor(), Some((2, 1)));

        confirm.handle(press(Button::Left));
        confirm.render(&mut lcd);
        assert_eq!(lcd.cursor(), Some((0, 1)));
    }
}
