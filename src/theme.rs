//! Colors for the debugger view.

use nu_ansi_term::{Color, Style};

pub mod catppuccin {
    use nu_ansi_term::Color;
    pub struct Mocha;
    impl Mocha {
        pub const TEXT: Color = Color::Rgb(205, 214, 244);
        pub const SURFACE2: Color = Color::Rgb(108, 112, 134);

        pub const RED: Color = Color::Rgb(243, 139, 168);
        pub const GREEN: Color = Color::Rgb(166, 227, 161);
        pub const YELLOW: Color = Color::Rgb(249, 226, 175);
        pub const BLUE: Color = Color::Rgb(137, 180, 250);
        pub const MAUVE: Color = Color::Rgb(203, 166, 247);
    }
}

/// Role-based palette used when rendering the tape window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub cursor: Color,
    pub cell_nonzero: Color,
    pub cell_empty: Color,
    pub breakpoint: Color,
    pub output: Color,
    pub label: Color,
    pub instruction: Color,
}

impl Default for Palette {
    fn default() -> Self {
        use catppuccin::Mocha as P;
        Self {
            cursor: P::YELLOW,
            cell_nonzero: P::TEXT,
            cell_empty: P::SURFACE2,
            breakpoint: P::RED,
            output: P::GREEN,
            label: P::BLUE,
            instruction: P::MAUVE,
        }
    }
}

/// A palette plus a switch; when disabled every `paint` returns plain text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Theme {
    pub palette: Palette,
    pub enabled: bool,
}

impl Theme {
    pub fn plain() -> Self {
        Self { palette: Palette::default(), enabled: false }
    }

    pub fn colored(palette: Palette) -> Self {
        Self { palette, enabled: true }
    }

    pub fn paint(&self, color: Color, bold: bool, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let style = if bold { Style::new().fg(color).bold() } else { Style::new().fg(color) };
        style.paint(text).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_emits_no_escapes() {
        let theme = Theme::plain();
        assert_eq!(theme.paint(theme.palette.cursor, true, "[ 1]"), "[ 1]");
    }

    #[test]
    fn colored_theme_wraps_text_in_escapes() {
        let theme = Theme::colored(Palette::default());
        let painted = theme.paint(theme.palette.cursor, true, "x");
        assert!(painted.contains('\u{1b}'));
        assert!(painted.contains('x'));
    }
}
