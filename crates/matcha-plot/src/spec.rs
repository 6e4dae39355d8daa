//! Plot selection.

use std::path::PathBuf;

use serde::Deserialize;

/// Default colormap when no explicit colors are given.
pub const DEFAULT_COLORMAP: &str = "coolwarm";

/// Which bins to draw and how to color them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotSpec {
    /// Ordered result keys to draw (e.g. `"9p5"`).
    pub keys: Vec<String>,
    /// Explicit colors, one per key, in any form `Rgb` parses.
    pub colors: Option<Vec<String>>,
    /// Colormap sampled when `colors` is absent.
    pub colormap: String,
    /// Auxiliary data file written next to the figures.
    #[serde(alias = "data_filename")]
    pub data_file: Option<PathBuf>,
    /// Optional reference table overlaid as dotted lines.
    pub reference: Option<PathBuf>,
}

impl Default for PlotSpec {
    fn default() -> Self {
        Self {
            keys: ["9", "9p5", "10", "10p5", "11", "11p5"]
                .map(String::from)
                .to_vec(),
            colors: None,
            colormap: DEFAULT_COLORMAP.to_string(),
            data_file: None,
            reference: None,
        }
    }
}

impl PlotSpec {
    /// Spec for `keys` with the default colormap and no files.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_colors(mut self, colors: Vec<String>) -> Self {
        self.colors = Some(colors);
        self
    }

    #[must_use]
    pub fn with_colormap(mut self, colormap: impl Into<String>) -> Self {
        self.colormap = colormap.into();
        self
    }

    #[must_use]
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.reference = Some(path.into());
        self
    }
}
