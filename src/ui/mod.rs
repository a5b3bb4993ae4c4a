//! Terminal rendering.
//!
//! One module per view plus the shared chrome in [`common`]. Every renderer
//! reads from [`crate::app::App`] and never mutates chain state.

pub mod common;
pub mod deployments;
pub mod detail;
pub mod health;
pub mod latency;
pub mod theme;

pub use theme::Theme;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the last `width` sparkline levels, left-padded with spaces.
pub fn render_sparkline(levels: &[u8], width: usize) -> String {
    let shown = &levels[levels.len().saturating_sub(width)..];
    let mut line = " ".repeat(width - shown.len());
    line.extend(shown.iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]));
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparkline_keeps_newest_values() {
        assert_eq!(render_sparkline(&[0, 7, 3], 2), "█▄");
        assert_eq!(render_sparkline(&[7], 3), "  █");
        assert_eq!(render_sparkline(&[], 2), "  ");
    }
}
