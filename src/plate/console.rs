//! Terminal stand-in for the LCD plate
//!
//! The panel is drawn as a boxed grid tinted with the backlight color.
//! The terminal runs in raw mode while the keypad is alive, so every key
//! press is a button press:
//!
//! | key            | button       |
//! |----------------|--------------|
//! | `w` or Up      | Up           |
//! | `s` or Down    | Down         |
//! | `a` or Left    | Left         |
//! | `d` or Right   | Right        |
//! | `e` or Enter   | Select       |
//! | `q` or Ctrl+C  | Left + Right |

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{execute, queue};
use tracing::{debug, warn};

use super::lcd::{Backlight, Button, ButtonSet, CharLcd, Keypad, LcdBuffer};
use crate::Result;

/// How long the reader waits for a key before checking for shutdown
const READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Map one typed character to the buttons it stands for
#[must_use]
pub fn key_to_buttons(key: char) -> Option<ButtonSet> {
    let set = match key.to_ascii_lowercase() {
        'w' => ButtonSet::only(Button::Up),
        's' => ButtonSet::only(Button::Down),
        'a' => ButtonSet::only(Button::Left),
        'd' => ButtonSet::only(Button::Right),
        'e' => ButtonSet::only(Button::Select),
        'q' => ButtonSet::only(Button::Left).with(Button::Right),
        _ => return None,
    };
    Some(set)
}

/// Map a terminal key event to buttons. Releases and repeats are ignored.
#[must_use]
pub fn key_event_buttons(key: &KeyEvent) -> Option<ButtonSet> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(ButtonSet::only(Button::Left).with(Button::Right))
        }
        KeyCode::Char(c) => key_to_buttons(c),
        KeyCode::Up => Some(ButtonSet::only(Button::Up)),
        KeyCode::Down => Some(ButtonSet::only(Button::Down)),
        KeyCode::Left => Some(ButtonSet::only(Button::Left)),
        KeyCode::Right => Some(ButtonSet::only(Button::Right)),
        KeyCode::Enter => Some(ButtonSet::only(Button::Select)),
        _ => None,
    }
}

/// Keypad fed by key presses from the terminal
pub struct ConsoleKeypad {
    presses: Receiver<ButtonSet>,
    /// Set while a reader thread owns raw mode
    running: Option<Arc<AtomicBool>>,
}

impl ConsoleKeypad {
    /// Switch the terminal to raw mode and start the key reader thread
    pub fn spawn() -> Result<Self> {
        terminal::enable_raw_mode()?;

        let running = Arc::new(AtomicBool::new(true));
        let (tx, rx) = mpsc::channel();
        let reader = running.clone();
        thread::spawn(move || {
            while reader.load(Ordering::Relaxed) {
                match event::poll(READ_TIMEOUT) {
                    Ok(false) => continue,
                    Ok(true) => {}
                    Err(e) => {
                        warn!("Terminal input failed: {}", e);
                        break;
                    }
                }
                let Ok(Event::Key(key)) = event::read() else {
                    continue;
                };
                if let Some(set) = key_event_buttons(&key)
                    && tx.send(set).is_err()
                {
                    break;
                }
            }
            debug!("Keypad reader stopping");
        });

        Ok(Self {
            presses: rx,
            running: Some(running),
        })
    }

    /// Keypad fed from an existing channel; leaves the terminal alone
    #[must_use]
    pub fn from_receiver(presses: Receiver<ButtonSet>) -> Self {
        Self {
            presses,
            running: None,
        }
    }
}

impl Keypad for ConsoleKeypad {
    fn poll(&mut self) -> ButtonSet {
        self.presses.try_recv().unwrap_or_default()
    }
}

impl Drop for ConsoleKeypad {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::Relaxed);
            if let Err(e) = terminal::disable_raw_mode() {
                warn!("Could not restore terminal: {}", e);
            }
        }
    }
}

/// Character display drawn into a terminal
pub struct ConsoleLcd<W: Write> {
    buffer: LcdBuffer,
    out: W,
    last_frame: Vec<u8>,
}

impl ConsoleLcd<io::Stdout> {
    #[must_use]
    pub fn stdout(cols: usize, rows: usize) -> Self {
        Self::new(cols, rows, io::stdout())
    }
}

impl<W: Write> ConsoleLcd<W> {
    pub fn new(cols: usize, rows: usize, out: W) -> Self {
        Self {
            buffer: LcdBuffer::new(cols, rows),
            out,
            last_frame: Vec::new(),
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &LcdBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn writer(&self) -> &W {
        &self.out
    }

    /// Background and text color for the current backlight
    fn tint(&self) -> (Color, Color) {
        match self.buffer.backlight() {
            Backlight::Off => (
                Color::Rgb { r: 20, g: 20, b: 20 },
                Color::Rgb { r: 60, g: 60, b: 60 },
            ),
            Backlight::White => (Color::Rgb { r: 230, g: 230, b: 230 }, Color::Black),
            Backlight::Rgb(r, g, b) => (Color::Rgb { r, g, b }, Color::Black),
        }
    }

    fn frame(&self) -> io::Result<Vec<u8>> {
        let border = format!("+{}+", "-".repeat(self.buffer.cols()));
        let (background, text) = self.tint();
        let cursor = self.buffer.cursor();

        let mut frame = Vec::new();
        queue!(frame, Hide, Clear(ClearType::All), MoveTo(0, 0), Print(&border))?;
        for (row, cells) in self.buffer.cells().iter().enumerate() {
            queue!(
                frame,
                MoveTo(0, screen_row(row + 1)),
                Print('|'),
                SetBackgroundColor(background),
                SetForegroundColor(text),
            )?;
            for (col, cell) in cells.iter().enumerate() {
                if cursor == Some((col, row)) {
                    queue!(
                        frame,
                        SetAttribute(Attribute::Underlined),
                        Print(*cell),
                        SetAttribute(Attribute::NoUnderline),
                    )?;
                } else {
                    queue!(frame, Print(*cell))?;
                }
            }
            queue!(frame, ResetColor, Print('|'))?;
        }
        queue!(
            frame,
            MoveTo(0, screen_row(self.buffer.rows() + 1)),
            Print(&border),
            MoveTo(0, screen_row(self.buffer.rows() + 2)),
        )?;
        Ok(frame)
    }
}

fn screen_row(row: usize) -> u16 {
    u16::try_from(row).unwrap_or(u16::MAX)
}

impl<W: Write> CharLcd for ConsoleLcd<W> {
    fn clear(&mut self) {
        self.buffer.clear();
    }

    fn set_cursor(&mut self, col: usize, row: usize) {
        self.buffer.set_cursor(col, row);
    }

    fn message(&mut self, text: &str) {
        self.buffer.message(text);
    }

    fn show_cursor(&mut self, show: bool) {
        self.buffer.show_cursor(show);
    }

    fn set_backlight(&mut self, light: Backlight) {
        self.buffer.set_backlight(light);
    }

    fn flush(&mut self) -> Result<()> {
        let frame = self.frame()?;
        if frame != self.last_frame {
            self.out.write_all(&frame)?;
            self.out.flush()?;
            self.last_frame = frame;
        }
        Ok(())
    }
}

impl<W: Write> Drop for ConsoleLcd<W> {
    fn drop(&mut self) {
        if !self.last_frame.is_empty() {
            execute!(self.out, ResetColor, Show).ok();
        }
    }
}
