//! Application configuration from CLI flags, environment, and an optional
//! JSON run file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;
use serde_json::{Map, Value};

use matcha_core::calculator::CalcError;
use matcha_core::cosmology::{CosmologyParameters, COSMOLOGY_FIELDS};
use matcha_core::params::HmfParams;
use matcha_plot::PlotSpec;

/// Redshift samples when neither the flags nor the run file set them.
pub const DEFAULT_SAMPLES: i64 = 100;

/// matcha: evolve stellar-mass-selected galaxy populations back in time by
/// abundance matching against the halo mass function.
#[derive(Parser, Debug, Default)]
#[command(name = "matcha", version, about)]
#[allow(clippy::struct_excessive_bools)]
pub struct AppConfig {
    /// Dimensionless Hubble parameter h.
    #[arg(long = "h0", env = "MATCHA_H_0")]
    pub h_0: Option<f64>,

    /// Matter density parameter today.
    #[arg(long = "omega-m0", env = "MATCHA_O_M0")]
    pub o_m0: Option<f64>,

    /// Baryon density parameter today.
    #[arg(long = "omega-b0", env = "MATCHA_O_B0")]
    pub o_b0: Option<f64>,

    /// Spectral index of the primordial power spectrum.
    #[arg(long = "ns", env = "MATCHA_N")]
    pub n: Option<f64>,

    /// Power spectrum normalization at 8 Mpc/h.
    #[arg(long = "sigma8", env = "MATCHA_SIGMA_8")]
    pub sigma_8: Option<f64>,

    /// Critical linear overdensity for collapse.
    #[arg(long = "delta-c", env = "MATCHA_DELTA_C")]
    pub delta_c: Option<f64>,

    /// Starting redshift of the progenitor tracks [default: 0].
    #[arg(long, env = "MATCHA_Z0", allow_negative_numbers = true)]
    pub z0: Option<f64>,

    /// Number of redshift samples [default: 100].
    #[arg(short, long, env = "MATCHA_SAMPLES", allow_negative_numbers = true)]
    pub samples: Option<i64>,

    /// Comma-separated mass-bin keys to plot (e.g. 9,9p5,10).
    #[arg(long, value_delimiter = ',')]
    pub keys: Option<Vec<String>>,

    /// Semicolon-separated colors, one per key (#RRGGBB, #RGB, r,g,b or a
    /// single letter).
    #[arg(long, value_delimiter = ';')]
    pub colors: Option<Vec<String>>,

    /// Colormap sampled when no colors are given [default: coolwarm].
    #[arg(long, env = "MATCHA_COLORMAP")]
    pub colormap: Option<String>,

    /// Write the plotted series to this whitespace table.
    #[arg(long)]
    pub data_file: Option<PathBuf>,

    /// Reference table drawn as dotted lines in the stellar-mass figure.
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Export both figures as SVG into this directory.
    #[arg(long, env = "MATCHA_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Multiplicity model: PS, ST, Tinker08, Behroozi, or all.
    #[arg(long, env = "MATCHA_HMF_MODEL")]
    pub hmf_model: Option<String>,

    /// Transfer function: EH, EH_NoBAO or BBKS.
    #[arg(long)]
    pub transfer: Option<String>,

    /// Stellar mass function calibration.
    #[arg(long)]
    pub gsmf_mode: Option<String>,

    /// Launch interactive TUI.
    #[arg(long)]
    pub tui: bool,

    /// Quiet mode (only the final stellar mass per bin).
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the full series of every bin.
    #[arg(short, long)]
    pub details: bool,

    /// Generate shell completion.
    #[arg(long, value_enum)]
    pub completion: Option<clap_complete::Shell>,

    /// JSON run file with cosmology, hmf_params, z0, samples and plot.
    #[arg(short, long, env = "MATCHA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the results table as JSON.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Contents of a `--config` run file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunFile {
    /// Kept as raw JSON so field errors name the field.
    pub cosmology: Option<Value>,
    pub hmf_params: HmfParams,
    pub z0: Option<f64>,
    pub samples: Option<i64>,
    pub plot: Option<PlotSpec>,
}

impl RunFile {
    pub fn load(path: &Path) -> Result<Self, CalcError> {
        let text = fs::read_to_string(path)
            .map_err(|e| CalcError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&text).map_err(|e| match e {
            CalcError::Config(msg) => CalcError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn parse(text: &str) -> Result<Self, CalcError> {
        serde_json::from_str(text).map_err(|e| CalcError::Config(e.to_string()))
    }
}

/// Everything a run needs, after merging flags over the run file.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub cosmology: CosmologyParameters,
    pub z0: f64,
    /// Unvalidated; checked when the request is built.
    pub samples: i64,
    pub params: HmfParams,
    /// Model selection, possibly `all`.
    pub model: String,
    pub plot: PlotSpec,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    fn cosmology_flags(&self) -> [Option<f64>; 6] {
        [
            self.h_0,
            self.o_m0,
            self.o_b0,
            self.n,
            self.sigma_8,
            self.delta_c,
        ]
    }

    /// Merge the flags over the run file, if any.
    pub fn resolve(&self) -> Result<RunSettings, CalcError> {
        let file = match &self.config {
            Some(path) => RunFile::load(path)?,
            None => RunFile::default(),
        };
        self.merge(file)
    }

    /// Merge the flags over an already loaded run file. Flags win.
    pub fn merge(&self, file: RunFile) -> Result<RunSettings, CalcError> {
        let mut cosmology = file
            .cosmology
            .unwrap_or_else(|| Value::Object(Map::new()));
        if let Value::Object(map) = &mut cosmology {
            for (name, flag) in COSMOLOGY_FIELDS.iter().zip(self.cosmology_flags()) {
                if let Some(value) = flag {
                    map.insert((*name).to_string(), Value::from(value));
                }
            }
        }
        let cosmology = CosmologyParameters::from_value(&cosmology)?;

        let mut params = file.hmf_params;
        if let Some(transfer) = &self.transfer {
            params.transfer_model.clone_from(transfer);
        }
        if let Some(mode) = &self.gsmf_mode {
            params.gsmf_mode.clone_from(mode);
        }
        let model = self
            .hmf_model
            .clone()
            .unwrap_or_else(|| params.hmf_model.clone());

        let mut plot = file.plot.unwrap_or_default();
        if let Some(keys) = &self.keys {
            plot.keys.clone_from(keys);
        }
        if let Some(colors) = &self.colors {
            plot.colors = Some(colors.clone());
        }
        if let Some(colormap) = &self.colormap {
            plot.colormap.clone_from(colormap);
        }
        if let Some(path) = &self.data_file {
            plot.data_file = Some(path.clone());
        }
        if let Some(path) = &self.reference {
            plot.reference = Some(path.clone());
        }

        Ok(RunSettings {
            cosmology,
            z0: self.z0.or(file.z0).unwrap_or(0.0),
            samples: self.samples.or(file.samples).unwrap_or(DEFAULT_SAMPLES),
            params,
            model,
            plot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COSMOLOGY: &str = r#"{"h_0": 0.678, "O_m0": 0.307115, "O_b0": 0.048,
        "n": 0.96, "sigma_8": 0.823, "delta_c": 1.686}"#;

    fn flags(args: &[&str]) -> AppConfig {
        let mut argv = vec!["matcha"];
        argv.extend_from_slice(args);
        AppConfig::try_parse_from(argv).unwrap()
    }

    fn file(text: &str) -> RunFile {
        RunFile::parse(text).unwrap()
    }

    const ALL_FLAGS: [&str; 12] = [
        "--h0",
        "0.678",
        "--omega-m0",
        "0.307115",
        "--omega-b0",
        "0.048",
        "--ns",
        "0.96",
        "--sigma8",
        "0.823",
        "--delta-c",
        "1.686",
    ];

    #[test]
    fn flags_alone_are_enough() {
        let settings = flags(&ALL_FLAGS).merge(RunFile::default()).unwrap();
        assert!((settings.cosmology.h_0() - 0.678).abs() < 1e-12);
        assert_eq!(settings.z0, 0.0);
        assert_eq!(settings.samples, DEFAULT_SAMPLES);
        assert_eq!(settings.model, "Behroozi");
        assert_eq!(settings.plot, PlotSpec::default());
    }

    #[test]
    fn missing_field_is_named() {
        let err = flags(&ALL_FLAGS[..10]).merge(RunFile::default()).unwrap_err();
        assert!(matches!(&err, CalcError::InvalidParameter(m) if m.contains("delta_c")));
    }

    #[test]
    fn run_file_fills_in_and_flags_override() {
        let run = file(&format!(
            r#"{{"cosmology": {COSMOLOGY}, "z0": 0.5, "samples": 20,
                "hmf_params": {{"hmf_model": "PS"}},
                "plot": {{"keys": ["10"], "colormap": "viridis"}}}}"#
        ));
        let settings = flags(&["--samples", "7", "--h0", "0.7", "--colormap", "magma"])
            .merge(run)
            .unwrap();
        assert!((settings.cosmology.h_0() - 0.7).abs() < 1e-12);
        assert!((settings.cosmology.o_m0() - 0.307115).abs() < 1e-12);
        assert_eq!(settings.z0, 0.5);
        assert_eq!(settings.samples, 7);
        assert_eq!(settings.model, "PS");
        assert_eq!(settings.plot.keys, vec!["10".to_string()]);
        assert_eq!(settings.plot.colormap, "magma");
    }

    #[test]
    fn non_numeric_field_in_file() {
        let run = file(r#"{"cosmology": {"h_0": "high"}}"#);
        let err = flags(&[]).merge(run).unwrap_err();
        assert!(matches!(&err, CalcError::InvalidParameter(m) if m.contains("h_0")));
    }

    #[test]
    fn unknown_section_is_a_config_error() {
        assert!(matches!(
            RunFile::parse(r#"{"cosmo": {}}"#),
            Err(CalcError::Config(_))
        ));
    }

    #[test]
    fn list_flags() {
        let config = flags(&[
            "--keys",
            "9,10p5",
            "--colors",
            "#ff0000;0.1,0.2,0.3",
            "--hmf-model",
            "all",
            "--transfer",
            "BBKS",
            "--samples",
            "-3",
        ]);
        assert_eq!(config.samples, Some(-3));
        let settings = AppConfig {
            h_0: Some(0.678),
            o_m0: Some(0.307115),
            o_b0: Some(0.048),
            n: Some(0.96),
            sigma_8: Some(0.823),
            delta_c: Some(1.686),
            ..config
        }
        .merge(RunFile::default())
        .unwrap();
        assert_eq!(settings.plot.keys, vec!["9".to_string(), "10p5".to_string()]);
        assert_eq!(
            settings.plot.colors,
            Some(vec!["#ff0000".to_string(), "0.1,0.2,0.3".to_string()])
        );
        assert_eq!(settings.model, "all");
        assert_eq!(settings.params.transfer_model, "BBKS");
    }

    #[test]
    fn load_reports_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        fs::write(&path, "{ not json").unwrap();
        let err = RunFile::load(&path).unwrap_err();
        assert!(matches!(&err, CalcError::Config(m) if m.contains("run.json")));
        assert!(RunFile::load(&dir.path().join("missing.json")).is_err());
    }
}
