//! RGB colors and the textual color forms accepted on the command line.

use std::fmt;
use std::str::FromStr;

use crate::error::PlotError;

/// 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from channel fractions in `[0, 1]`.
    pub fn from_unit(r: f64, g: f64, b: f64) -> Result<Self, PlotError> {
        let channel = |v: f64| -> Result<u8, PlotError> {
            if !(0.0..=1.0).contains(&v) {
                return Err(PlotError::InvalidColor(format!(
                    "channel {v} outside [0, 1]"
                )));
            }
            Ok(unit_to_byte(v))
        };
        Ok(Self::new(channel(r)?, channel(g)?, channel(b)?))
    }

    /// Linear blend: `t = 0` gives `self`, `t = 1` gives `other`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let mix = |a: u8, b: u8| {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            unit_to_byte(v / 255.0)
        };
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    /// `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn unit_to_byte(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = PlotError;

    /// Accepts `#RRGGBB`, `#RGB`, `r,g,b` fractions (optionally in
    /// parentheses) and the single-letter base colors `bgrcmykw`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || PlotError::InvalidColor(s.to_string());

        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }

        if s.contains(',') {
            let inner = s
                .strip_prefix('(')
                .and_then(|t| t.strip_suffix(')'))
                .unwrap_or(s);
            let parts = inner
                .split(',')
                .map(|p| p.trim().parse::<f64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| invalid())?;
            return match parts.as_slice() {
                [r, g, b] => Self::from_unit(*r, *g, *b),
                _ => Err(invalid()),
            };
        }

        match s {
            "b" => Ok(Self::new(0, 0, 255)),
            "g" => Ok(Self::new(0, 128, 0)),
            "r" => Ok(Self::new(255, 0, 0)),
            "c" => Ok(Self::new(0, 191, 191)),
            "m" => Ok(Self::new(191, 0, 191)),
            "y" => Ok(Self::new(191, 191, 0)),
            "k" => Ok(Self::new(0, 0, 0)),
            "w" => Ok(Self::new(255, 255, 255)),
            _ => Err(invalid()),
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
    match hex.len() {
        6 => Some(Rgb::new(byte(0)?, byte(2)?, byte(4)?)),
        3 => Some(Rgb::new(nibble(0)?, nibble(1)?, nibble(2)?)),
        _ => None,
    }
}

/// Parse a list of color strings, failing on the first bad entry.
pub fn parse_colors<S: AsRef<str>>(colors: &[S]) -> Result<Vec<Rgb>, PlotError> {
    colors.iter().map(|c| c.as_ref().parse()).collect()
}
