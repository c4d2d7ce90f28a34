//! Frames for scrolling a long line across a narrow panel

use std::time::Duration;

/// One window of the line and how long it stays up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollFrame {
    pub text: String,
    pub hold: Duration,
}

/// Split `line` into `cols` wide windows.
///
/// A line that fits is shown once for `pause`. A longer line shows its
/// first window for `pause`, slides one character per `step` until the
/// end is visible, then rests on the last window for another `pause`.
#[must_use]
pub fn scroll_frames(line: &str, cols: usize, pause: Duration, step: Duration) -> Vec<ScrollFrame> {
    let chars: Vec<char> = line.chars().collect();
    let cols = cols.max(1);

    if chars.len() <= cols {
        return vec![ScrollFrame {
            text: line.to_string(),
            hold: pause,
        }];
    }

    let windows = chars.len() - cols + 1;
    let mut frames: Vec<ScrollFrame> = (0..windows)
        .map(|start| ScrollFrame {
            text: chars[start..start + cols].iter().collect(),
            hold: if start == 0 { pause } else { step },
        })
        .collect();

    if let Some(last) = frames.last_mut() {
        last.hold += pause;
    }
    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAUSE: Duration = Duration::from_secs(2);
    const STEP: Duration = Duration::from_millis(200);

    #[test]
    fn test_short_line_single_frame() {
        let frames = scroll_frames("CALM UNLM", 16, PAUSE, STEP);
        assert_eq!(
            frames,
            vec![ScrollFrame {
                text: "CALM UNLM".to_string(),
                hold: PAUSE
            }]
        );
    }

    #[test]
    fn test_exact_fit_does_not_scroll() {
        let frames = scroll_frames("0123456789ABCDEF", 16, PAUSE, STEP);
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_long_line_slides_one_char() {
        let frames = scroll_frames("ABCDEFGH", 5, PAUSE, STEP);
        let texts: Vec<&str> = frames.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["ABCDE", "BCDEF", "CDEFG", "DEFGH"]);

        assert_eq!(frames[0].hold, PAUSE);
        assert_eq!(frames[1].hold, STEP);
        assert_eq!(frames[3].hold, STEP + PAUSE);

        let total: Duration = frames.iter().map(|f| f.hold).sum();
        assert_eq!(total, PAUSE * 2 + STEP * 3);
    }
}
