//! Where screen frames go and where touches come from

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use embedded_graphics::pixelcolor::Rgb888;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{OutputSettings, OutputSettingsBuilder, SimulatorDisplay};
use tracing::debug;

use crate::{MetarError, Result};

/// A frame buffer with touch input
pub trait Surface {
    type Target: DrawTarget<Color = Rgb888>;

    fn target(&mut self) -> &mut Self::Target;

    /// Show what was drawn since the last call
    fn present(&mut self) -> Result<()>;

    /// Next touch, if any. `Err` only when the surface was closed.
    fn poll_touch(&mut self) -> std::result::Result<Option<Point>, Closed>;
}

/// The user closed the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

/// In-memory surface that can write PNG snapshots
pub struct HeadlessSurface {
    display: SimulatorDisplay<Rgb888>,
    output: OutputSettings,
    touches: VecDeque<Point>,
    snapshot: Option<PathBuf>,
    frames: usize,
}

impl HeadlessSurface {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            display: SimulatorDisplay::new(Size::new(width, height)),
            output: OutputSettingsBuilder::new().scale(1).build(),
            touches: VecDeque::new(),
            snapshot: None,
            frames: 0,
        }
    }

    /// Write every presented frame to `path`
    #[must_use]
    pub fn with_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot = Some(path.into());
        self
    }

    /// Queue a touch for a later `poll_touch`
    pub fn push_touch(&mut self, at: Point) {
        self.touches.push_back(at);
    }

    #[must_use]
    pub fn display(&self) -> &SimulatorDisplay<Rgb888> {
        &self.display
    }

    /// Number of frames presented so far
    #[must_use]
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.display
            .to_rgb_output_image(&self.output)
            .save_png(path)
            .map_err(|e| MetarError::display(format!("Could not write {}: {e}", path.display())))?;
        debug!("Wrote snapshot {}", path.display());
        Ok(())
    }
}

impl Surface for HeadlessSurface {
    type Target = SimulatorDisplay<Rgb888>;

    fn target(&mut self) -> &mut Self::Target {
        &mut self.display
    }

    fn present(&mut self) -> Result<()> {
        self.frames += 1;
        match &self.snapshot {
            Some(path) => self.save_png(path),
            None => Ok(()),
        }
    }

    fn poll_touch(&mut self) -> std::result::Result<Option<Point>, Closed> {
        Ok(self.touches.pop_front())
    }
}

#[cfg(feature = "window")]
pub use window::WindowSurface;

#[cfg(feature = "window")]
mod window {
    use std::collections::VecDeque;

    use embedded_graphics::pixelcolor::Rgb888;
    use embedded_graphics::prelude::*;
    use embedded_graphics_simulator::{
        OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window,
    };

    use super::{Closed, Surface};
    use crate::Result;

    /// SDL window; mouse clicks stand in for touches
    pub struct WindowSurface {
        display: SimulatorDisplay<Rgb888>,
        window: Window,
        touches: VecDeque<Point>,
    }

    impl WindowSurface {
        #[must_use]
        pub fn new(width: u32, height: u32, scale: u32) -> Self {
            let output = OutputSettingsBuilder::new().scale(scale).build();
            Self {
                display: SimulatorDisplay::new(Size::new(width, height)),
                window: Window::new("METAR RasPi", &output),
                touches: VecDeque::new(),
            }
        }
    }

    impl Surface for WindowSurface {
        type Target = SimulatorDisplay<Rgb888>;

        fn target(&mut self) -> &mut Self::Target {
            &mut self.display
        }

        fn present(&mut self) -> Result<()> {
            self.window.update(&self.display);
            Ok(())
        }

        fn poll_touch(&mut self) -> std::result::Result<Option<Point>, Closed> {
            for event in self.window.events() {
                match event {
                    SimulatorEvent::Quit => return Err(Closed),
                    SimulatorEvent::MouseButtonDown { point, .. } => self.touches.push_back(point),
                    _ => {}
                }
            }
            Ok(self.touches.pop_front())
        }
    }
}
