//! Named colormaps as piecewise-linear color ramps.
//!
//! Each map is a list of stops on `[0, 1]`. A `_r` suffix reverses any map.

use std::fmt;
use std::str::FromStr;

use crate::color::Rgb;
use crate::error::PlotError;

type Stop = (f64, Rgb);

const fn stop(t: f64, r: u8, g: u8, b: u8) -> Stop {
    (t, Rgb::new(r, g, b))
}

const VIRIDIS: &[(u8, u8, u8)] = &[
    (68, 1, 84), (72, 40, 120), (62, 73, 137), (49, 104, 142), (38, 130, 142),
    (31, 158, 137), (53, 183, 121), (110, 206, 88), (181, 222, 43), (253, 231, 37),
];
const PLASMA: &[(u8, u8, u8)] = &[
    (13, 8, 135), (70, 3, 159), (114, 1, 168), (156, 23, 158), (189, 55, 134),
    (216, 87, 107), (237, 121, 83), (251, 159, 58), (253, 202, 38), (240, 249, 33),
];
const INFERNO: &[(u8, u8, u8)] = &[
    (0, 0, 4), (27, 12, 65), (74, 12, 107), (120, 28, 109), (165, 44, 96),
    (207, 68, 70), (237, 105, 37), (251, 155, 6), (247, 209, 61), (252, 255, 164),
];
const MAGMA: &[(u8, u8, u8)] = &[
    (0, 0, 4), (24, 15, 61), (68, 15, 118), (114, 31, 129), (158, 47, 127),
    (205, 64, 113), (241, 96, 93), (253, 150, 104), (254, 202, 141), (252, 253, 191),
];
const CIVIDIS: &[(u8, u8, u8)] = &[
    (0, 34, 78), (18, 53, 112), (59, 73, 108), (87, 93, 109), (112, 113, 115),
    (138, 134, 120), (165, 156, 116), (195, 179, 105), (225, 204, 85), (254, 232, 56),
];
const COOLWARM: &[(u8, u8, u8)] = &[
    (59, 76, 192), (98, 130, 234), (141, 176, 254), (184, 208, 249), (221, 221, 221),
    (245, 196, 173), (244, 154, 123), (222, 96, 77), (180, 4, 38),
];
const BWR: &[(u8, u8, u8)] = &[
    (0, 0, 255), (255, 255, 255), (255, 0, 0),
];
const SEISMIC: &[(u8, u8, u8)] = &[
    (0, 0, 77), (0, 0, 255), (255, 255, 255), (255, 0, 0), (128, 0, 0),
];
const RAINBOW: &[(u8, u8, u8)] = &[
    (128, 0, 255), (0, 180, 236), (128, 255, 180), (255, 180, 98), (255, 0, 0),
];
const GREYS: &[(u8, u8, u8)] = &[
    (255, 255, 255), (0, 0, 0),
];
const GRAY: &[(u8, u8, u8)] = &[
    (0, 0, 0), (255, 255, 255),
];

const JET: &[Stop] = &[
    stop(0.0, 0, 0, 128),
    stop(0.125, 0, 0, 255),
    stop(0.375, 0, 255, 255),
    stop(0.625, 255, 255, 0),
    stop(0.875, 255, 0, 0),
    stop(1.0, 128, 0, 0),
];

/// Base names of the built-in maps.
pub const NAMES: [&str; 12] = [
    "viridis", "plasma", "inferno", "magma", "cividis", "coolwarm", "bwr", "seismic", "jet",
    "rainbow", "Greys", "gray",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum Ramp {
    Even(&'static [(u8, u8, u8)]),
    Stops(&'static [Stop]),
}

impl Ramp {
    fn lookup(name: &str) -> Option<Self> {
        let ramp = match name {
            "viridis" => Self::Even(VIRIDIS),
            "plasma" => Self::Even(PLASMA),
            "inferno" => Self::Even(INFERNO),
            "magma" => Self::Even(MAGMA),
            "cividis" => Self::Even(CIVIDIS),
            "coolwarm" => Self::Even(COOLWARM),
            "bwr" => Self::Even(BWR),
            "seismic" => Self::Even(SEISMIC),
            "jet" => Self::Stops(JET),
            "rainbow" => Self::Even(RAINBOW),
            "Greys" => Self::Even(GREYS),
            "gray" | "grey" => Self::Even(GRAY),
            _ => return None,
        };
        Some(ramp)
    }

    fn at(self, t: f64) -> Rgb {
        match self {
            Self::Even(colors) => {
                let last = colors.len() - 1;
                let pos = t * last as f64;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let i = (pos.floor() as usize).min(last.saturating_sub(1));
                let (r0, g0, b0) = colors[i];
                let (r1, g1, b1) = colors[(i + 1).min(last)];
                Rgb::new(r0, g0, b0).lerp(Rgb::new(r1, g1, b1), pos - i as f64)
            }
            Self::Stops(stops) => {
                let j = stops.partition_point(|&(s, _)| s < t).clamp(1, stops.len() - 1);
                let (t0, c0) = stops[j - 1];
                let (t1, c1) = stops[j];
                c0.lerp(c1, (t - t0) / (t1 - t0))
            }
        }
    }
}

/// A named colormap, possibly reversed.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    name: String,
    ramp: Ramp,
    reversed: bool,
}

impl Colormap {
    pub fn from_name(name: &str) -> Result<Self, PlotError> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(base) => (base, true),
            None => (name, false),
        };
        let ramp = Ramp::lookup(base)
            .ok_or_else(|| PlotError::UnknownColormap(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            ramp,
            reversed,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color at position `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn at(&self, t: f64) -> Rgb {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        self.ramp.at(if self.reversed { 1.0 - t } else { t })
    }

    /// `n` colors at positions `i / (n - 1)`; a single color samples 0.
    #[must_use]
    pub fn sample(&self, n: usize) -> Vec<Rgb> {
        match n {
            0 => Vec::new(),
            1 => vec![self.at(0.0)],
            _ => (0..n)
                .map(|i| self.at(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

impl FromStr for Colormap {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

impl fmt::Display for Colormap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_name_resolves() {
        for name in NAMES {
            assert!(Colormap::from_name(name).is_ok(), "{name}");
            assert!(Colormap::from_name(&format!("{name}_r")).is_ok(), "{name}_r");
        }
    }

    #[test]
    fn unknown_name() {
        assert!(matches!(
            Colormap::from_name("sunset"),
            Err(PlotError::UnknownColormap(n)) if n == "sunset"
        ));
    }

    #[test]
    fn coolwarm_endpoints() {
        let cmap = Colormap::from_name("coolwarm").unwrap();
        assert_eq!(cmap.at(0.0), Rgb::new(59, 76, 192));
        assert_eq!(cmap.at(0.5), Rgb::new(221, 221, 221));
        assert_eq!(cmap.at(1.0), Rgb::new(180, 4, 38));
    }

    #[test]
    fn reversed_map_mirrors() {
        let fwd = Colormap::from_name("viridis").unwrap();
        let rev = Colormap::from_name("viridis_r").unwrap();
        for t in [0.0, 0.25, 0.75, 1.0] {
            assert_eq!(fwd.at(t), rev.at(1.0 - t));
        }
    }

    #[test]
    fn jet_stops() {
        let jet = Colormap::from_name("jet").unwrap();
        assert_eq!(jet.at(0.0), Rgb::new(0, 0, 128));
        assert_eq!(jet.at(0.375), Rgb::new(0, 255, 255));
        assert_eq!(jet.at(1.0), Rgb::new(128, 0, 0));
    }

    #[test]
    fn sampling_positions() {
        let cmap = Colormap::from_name("gray").unwrap();
        assert!(cmap.sample(0).is_empty());
        assert_eq!(cmap.sample(1), vec![Rgb::new(0, 0, 0)]);
        let six = cmap.sample(6);
        assert_eq!(six.len(), 6);
        assert_eq!(six[0], cmap.at(0.0));
        assert_eq!(six[2], cmap.at(0.4));
        assert_eq!(six[5], Rgb::new(255, 255, 255));
    }

    #[test]
    fn out_of_range_positions_clamp() {
        let cmap = Colormap::from_name("plasma").unwrap();
        assert_eq!(cmap.at(-1.0), cmap.at(0.0));
        assert_eq!(cmap.at(2.0), cmap.at(1.0));
    }
}
