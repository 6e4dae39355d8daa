//! # matcha-plot
//!
//! Turns a `ResultsTable` into the two evolution figures: cumulative halo
//! number density and stellar mass, both against `1+z`. Figures are plain
//! data so the CLI can export them as SVG and the TUI can draw them.

pub mod color;
pub mod colormap;
pub mod datafile;
pub mod error;
pub mod export;
pub mod figure;
pub mod spec;

pub use color::Rgb;
pub use colormap::Colormap;
pub use error::PlotError;
pub use export::export_svg;
pub use figure::{render, Figure, FigureSet, LineStyle};
pub use spec::PlotSpec;
