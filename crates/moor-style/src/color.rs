#![forbid(unsafe_code)]

//! Color types, palettes, and downsampling.
//!
//! Colors exist at four fidelity levels (default, 16, 256, 24-bit). Input
//! parsing stores whatever the source stream said; downsampling to what the
//! terminal can show happens at emission time.

use std::fmt;

/// How many colors the output terminal supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColorCount {
    /// The basic 8 ANSI colors.
    Ansi8,
    /// Standard 16 ANSI colors.
    Ansi16,
    /// Extended 256-color palette.
    Ansi256,
    /// Full 24-bit RGB color.
    TrueColor,
}

/// Which SGR slot a color is being emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    /// SGR 3x / 38
    Foreground,
    /// SGR 4x / 48
    Background,
    /// SGR 58 / 59
    Underline,
}

/// A color value at varying fidelity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// The terminal's default foreground or background.
    #[default]
    Default,
    /// Standard 16-color ANSI value (0-15). 3-bit colors from input are
    /// stored here too since they map to the same values.
    Ansi16(u8),
    /// 256-color palette index.
    Ansi256(u8),
    /// True-color RGB value.
    Rgb(u8, u8, u8),
}

impl Color {
    /// Create a true-color RGB value.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb(r, g, b)
    }

    /// Check whether this is a real color rather than the terminal default.
    #[must_use]
    pub const fn is_real(self) -> bool {
        !matches!(self, Self::Default)
    }

    /// Convert to an RGB triplet. Not defined for the default color.
    #[must_use]
    pub fn to_rgb(self) -> Option<(u8, u8, u8)> {
        match self {
            Self::Default => None,
            Self::Ansi16(index) => Some(ansi256_to_rgb(index)),
            Self::Ansi256(index) => Some(ansi256_to_rgb(index)),
            Self::Rgb(r, g, b) => Some((r, g, b)),
        }
    }

    /// Downsample this color so the given terminal can show it.
    ///
    /// Already-low-enough colors pass through untouched. When targeting 256
    /// colors, palette indices 0-15 are skipped since users commonly remap
    /// them.
    #[must_use]
    pub fn downsample(self, terminal: ColorCount) -> Self {
        let own_level = match self {
            Self::Default => return self,
            Self::Ansi16(_) => ColorCount::Ansi16,
            Self::Ansi256(_) => ColorCount::Ansi256,
            Self::Rgb(..) => ColorCount::TrueColor,
        };
        if own_level <= terminal {
            return self;
        }

        let Some(target) = self.to_rgb() else {
            return self;
        };

        let (first, last) = match terminal {
            ColorCount::Ansi8 => (0u16, 7u16),
            ColorCount::Ansi16 => (0, 15),
            ColorCount::Ansi256 => (16, 255),
            ColorCount::TrueColor => return self,
        };

        let mut best_index = first;
        let mut best_distance = f64::MAX;
        for index in first..=last {
            let candidate = ansi256_to_rgb(index as u8);
            let distance = rgb_distance(target, candidate);
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }
        }

        if best_index <= 15 {
            Self::Ansi16(best_index as u8)
        } else {
            Self::Ansi256(best_index as u8)
        }
    }

    /// Perceptual distance to another color, scaled so black-to-white is 1.0.
    ///
    /// Uses the redmean approximation from
    /// <https://www.compuphase.com/cmetric.htm>. Not defined for the default
    /// color; callers check `is_real()` first.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let a = self.to_rgb().unwrap_or((0, 0, 0));
        let b = other.to_rgb().unwrap_or((0, 0, 0));
        rgb_distance(a, b) / MAX_RGB_DISTANCE
    }

    /// Mix with another color. Weight 0.0 keeps `self`, weight 1.0 gives
    /// `other`. Both colors must be real; mixing with the default color
    /// returns `self` unchanged.
    #[must_use]
    pub fn mix(self, other: Self, weight: f64) -> Self {
        let (Some((r1, g1, b1)), Some((r2, g2, b2))) = (self.to_rgb(), other.to_rgb()) else {
            return self;
        };
        let weight = weight.clamp(0.0, 1.0);
        let mix_channel = |c1: u8, c2: u8| -> u8 {
            (f64::from(c2) * weight + f64::from(c1) * (1.0 - weight)).round() as u8
        };
        Self::Rgb(
            mix_channel(r1, r2),
            mix_channel(g1, g2),
            mix_channel(b1, b2),
        )
    }

    /// Render this color as an ANSI SGR string for the given role,
    /// downsampled to what the terminal supports.
    ///
    /// 16-color values have no underline-color encoding; those emit nothing.
    #[must_use]
    pub fn ansi_string(self, role: ColorRole, terminal: ColorCount) -> String {
        let role_marker = match role {
            ColorRole::Foreground => '3',
            ColorRole::Background => '4',
            ColorRole::Underline => '5',
        };

        if self == Self::Default {
            return format!("\x1b[{role_marker}9m");
        }

        match self.downsample(terminal) {
            Self::Default => format!("\x1b[{role_marker}9m"),
            Self::Ansi16(value) => {
                if role == ColorRole::Underline {
                    // Only 256 and 24-bit colors can be underline colors
                    return String::new();
                }
                if value < 8 {
                    format!("\x1b[{role_marker}{value}m")
                } else {
                    let bright_marker = match role {
                        ColorRole::Foreground => "9",
                        ColorRole::Background => "10",
                        ColorRole::Underline => unreachable!(),
                    };
                    format!("\x1b[{bright_marker}{}m", value - 8)
                }
            }
            Self::Ansi256(value) => format!("\x1b[{role_marker}8;5;{value}m"),
            Self::Rgb(r, g, b) => format!("\x1b[{role_marker}8;2;{r};{g};{b}m"),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::Ansi16(index) => write!(f, "ansi-{index}"),
            Self::Ansi256(index) => write!(f, "#{index:02x}"),
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

/// Distance between black and white under `rgb_distance`, for scaling.
const MAX_RGB_DISTANCE: f64 = 764.834;

fn rgb_distance(a: (u8, u8, u8), b: (u8, u8, u8)) -> f64 {
    let rmean = (f64::from(a.0) + f64::from(b.0)) / 2.0;
    let dr = f64::from(a.0) - f64::from(b.0);
    let dg = f64::from(a.1) - f64::from(b.1);
    let db = f64::from(a.2) - f64::from(b.2);
    let weight_r = 2.0 + rmean / 256.0;
    let weight_b = 2.0 + (255.0 - rmean) / 256.0;
    (weight_r * dr * dr + 4.0 * dg * dg + weight_b * db * db).sqrt()
}

const ANSI16_PALETTE: [(u8, u8, u8); 16] = [
    (0, 0, 0),       // Black
    (205, 0, 0),     // Red
    (0, 205, 0),     // Green
    (205, 205, 0),   // Yellow
    (0, 0, 238),     // Blue
    (205, 0, 205),   // Magenta
    (0, 205, 205),   // Cyan
    (229, 229, 229), // White
    (127, 127, 127), // Bright black
    (255, 0, 0),     // Bright red
    (0, 255, 0),     // Bright green
    (255, 255, 0),   // Bright yellow
    (92, 92, 255),   // Bright blue
    (255, 0, 255),   // Bright magenta
    (0, 255, 255),   // Bright cyan
    (255, 255, 255), // Bright white
];

/// Convert an ANSI 256-color index to its RGB representation.
#[must_use]
pub fn ansi256_to_rgb(index: u8) -> (u8, u8, u8) {
    if index < 16 {
        return ANSI16_PALETTE[index as usize];
    }
    if index >= 232 {
        let gray = 8 + 10 * (index - 232);
        return (gray, gray, gray);
    }
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let index = index - 16;
    let r = index / 36;
    let g = (index / 6) % 6;
    let b = index % 6;
    (
        LEVELS[r as usize],
        LEVELS[g as usize],
        LEVELS[b as usize],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truecolor_passthrough() {
        let color = Color::rgb(12, 34, 56);
        assert_eq!(color.downsample(ColorCount::TrueColor), color);
    }

    #[test]
    fn default_passthrough() {
        for terminal in [
            ColorCount::Ansi8,
            ColorCount::Ansi16,
            ColorCount::Ansi256,
            ColorCount::TrueColor,
        ] {
            assert_eq!(Color::Default.downsample(terminal), Color::Default);
        }
    }

    #[test]
    fn ansi16_stays_at_ansi256() {
        let color = Color::Ansi16(1);
        assert_eq!(color.downsample(ColorCount::Ansi256), color);
    }

    #[test]
    fn downsample_primaries_to_16() {
        assert_eq!(Color::rgb(255, 0, 0).downsample(ColorCount::Ansi16), Color::Ansi16(9));
        assert_eq!(Color::rgb(0, 255, 0).downsample(ColorCount::Ansi16), Color::Ansi16(10));
        assert_eq!(Color::rgb(0, 0, 0).downsample(ColorCount::Ansi16), Color::Ansi16(0));
        assert_eq!(
            Color::rgb(255, 255, 255).downsample(ColorCount::Ansi16),
            Color::Ansi16(15)
        );
    }

    #[test]
    fn downsample_to_256_skips_customizable_entries() {
        // Pure black exists at index 0, but 0-15 are user-customizable so the
        // cube copy at 16 should win.
        assert_eq!(
            Color::rgb(0, 0, 0).downsample(ColorCount::Ansi256),
            Color::Ansi256(16)
        );
        assert_eq!(
            Color::rgb(255, 0, 0).downsample(ColorCount::Ansi256),
            Color::Ansi256(196)
        );
    }

    #[test]
    fn ansi256_to_rgb_corners() {
        assert_eq!(ansi256_to_rgb(16), (0, 0, 0));
        assert_eq!(ansi256_to_rgb(231), (255, 255, 255));
        assert_eq!(ansi256_to_rgb(196), (255, 0, 0));
        assert_eq!(ansi256_to_rgb(232), (8, 8, 8));
        assert_eq!(ansi256_to_rgb(255), (238, 238, 238));
    }

    #[test]
    fn first_16_match_palette() {
        for i in 0..16u8 {
            assert_eq!(ansi256_to_rgb(i), ANSI16_PALETTE[i as usize]);
        }
    }

    #[test]
    fn distance_is_scaled() {
        let black = Color::rgb(0, 0, 0);
        let white = Color::rgb(255, 255, 255);
        let distance = black.distance(white);
        assert!((distance - 1.0).abs() < 0.001, "got {distance}");
        assert_eq!(black.distance(black), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Color::rgb(10, 200, 30);
        let b = Color::rgb(200, 10, 130);
        assert!((a.distance(b) - b.distance(a)).abs() < 1e-12);
    }

    #[test]
    fn mix_endpoints() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(255, 255, 255);
        assert_eq!(a.mix(b, 0.0), Color::rgb(0, 0, 0));
        assert_eq!(a.mix(b, 1.0), Color::rgb(255, 255, 255));
    }

    #[test]
    fn mix_twenty_percent() {
        let a = Color::rgb(0, 0, 0);
        let b = Color::rgb(255, 255, 255);
        assert_eq!(a.mix(b, 0.2), Color::rgb(51, 51, 51));
    }

    #[test]
    fn mix_with_default_is_identity() {
        let a = Color::rgb(1, 2, 3);
        assert_eq!(a.mix(Color::Default, 0.5), a);
    }

    #[test]
    fn ansi_string_basics() {
        assert_eq!(
            Color::Default.ansi_string(ColorRole::Foreground, ColorCount::TrueColor),
            "\x1b[39m"
        );
        assert_eq!(
            Color::Ansi16(1).ansi_string(ColorRole::Foreground, ColorCount::TrueColor),
            "\x1b[31m"
        );
        assert_eq!(
            Color::Ansi16(9).ansi_string(ColorRole::Foreground, ColorCount::TrueColor),
            "\x1b[91m"
        );
        assert_eq!(
            Color::Ansi16(9).ansi_string(ColorRole::Background, ColorCount::TrueColor),
            "\x1b[101m"
        );
        assert_eq!(
            Color::Ansi256(42).ansi_string(ColorRole::Background, ColorCount::TrueColor),
            "\x1b[48;5;42m"
        );
        assert_eq!(
            Color::rgb(1, 2, 3).ansi_string(ColorRole::Foreground, ColorCount::TrueColor),
            "\x1b[38;2;1;2;3m"
        );
    }

    #[test]
    fn ansi_string_downsamples_for_the_terminal() {
        let rendered = Color::rgb(255, 0, 0).ansi_string(ColorRole::Foreground, ColorCount::Ansi256);
        assert_eq!(rendered, "\x1b[38;5;196m");
    }

    #[test]
    fn no_16_color_underline_encoding() {
        assert_eq!(
            Color::Ansi16(3).ansi_string(ColorRole::Underline, ColorCount::TrueColor),
            ""
        );
    }
}
