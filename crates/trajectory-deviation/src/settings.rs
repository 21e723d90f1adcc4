use crate::CliError;
use crate::output::OutputFormat;
use clap::Parser;
use std::path::PathBuf;
use trajectory_deviation_lib::{EngineConfig, IndexAlgorithm, PositiveSide, SmoothingMode};

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Trajectory Deviation - Evaluate how closely driven paths follow a reference path
pub struct Settings {
    /// Reference path file (whitespace-separated columns with a header line)
    #[clap(short, long, value_name = "FILE")]
    pub reference: PathBuf,

    /// Driven path files to evaluate against the reference
    #[clap(value_name = "QUERY", required = true)]
    pub queries: Vec<PathBuf>,

    /// JSON engine configuration; options given here override its values
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Spatial index: rtree, quadtree or exhaustive
    #[clap(long)]
    pub index_algorithm: Option<IndexAlgorithm>,

    /// Side of the reference heading with positive lateral deviation: left or right
    #[clap(long)]
    pub positive_side: Option<PositiveSide>,

    /// Curvature moving-average window in samples
    #[clap(long)]
    pub window: Option<usize>,

    /// Minimum defined samples inside the curvature window
    #[clap(long)]
    pub min_periods: Option<usize>,

    /// Center the curvature window on each sample instead of trailing it
    #[clap(long, default_value = "false")]
    pub centered: bool,

    /// Fold heading deviations into (-π, π]
    #[clap(long, default_value = "false")]
    pub wrap_heading: bool,

    /// Evaluate on a single thread
    #[clap(long, default_value = "false")]
    pub sequential: bool,

    /// Distance in meters excluded from the start of each summary
    #[clap(short, long, default_value = "50.0")]
    pub warmup_distance: f64,

    /// Output format for per-point results
    #[clap(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Directory for result files (one per query); standard output if omitted
    #[clap(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Also write the smoothed reference curvature to this file
    #[clap(long, value_name = "FILE")]
    pub curvature_output: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Settings {
    /// Engine configuration from the optional JSON file with command-line overrides applied
    pub fn engine_config(&self) -> Result<EngineConfig, CliError> {
        let base = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| CliError::Read {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&text).map_err(|source| CliError::ConfigFile {
                    path: path.clone(),
                    source,
                })?
            }
            None => EngineConfig::default(),
        };

        let config = self.apply_overrides(base);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, mut config: EngineConfig) -> EngineConfig {
        if let Some(algorithm) = self.index_algorithm {
            config.index_algorithm = algorithm;
        }
        if let Some(side) = self.positive_side {
            config.positive_side = side;
        }
        if let Some(window) = self.window {
            config.curvature.window = window;
        }
        if let Some(min_periods) = self.min_periods {
            config.curvature.min_periods = min_periods;
        }
        if self.centered {
            config.curvature.mode = SmoothingMode::Centered;
        }
        if self.wrap_heading {
            config.heading.wrap_deviation = true;
        }
        if self.sequential {
            config.parallel = false;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        Settings::try_parse_from(std::iter::once("trajectory-deviation").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&["-r", "ref.txt", "lap1.txt", "lap2.txt"]);
        assert_eq!(settings.reference, PathBuf::from("ref.txt"));
        assert_eq!(settings.queries.len(), 2);
        assert_eq!(settings.warmup_distance, 50.0);
        assert_eq!(settings.format, OutputFormat::Text);
        assert_eq!(settings.engine_config().unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_query_required() {
        let result = Settings::try_parse_from(["trajectory-deviation", "-r", "ref.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let settings = parse(&[
            "-r",
            "ref.txt",
            "--index-algorithm",
            "quadtree",
            "--positive-side",
            "right",
            "--window",
            "10",
            "--min-periods",
            "3",
            "--centered",
            "--wrap-heading",
            "--sequential",
            "-f",
            "json",
            "lap.txt",
        ]);
        let config = settings.engine_config().unwrap();
        assert_eq!(config.index_algorithm, IndexAlgorithm::Quadtree);
        assert_eq!(config.positive_side, PositiveSide::Right);
        assert_eq!(config.curvature.window, 10);
        assert_eq!(config.curvature.min_periods, 3);
        assert_eq!(config.curvature.mode, SmoothingMode::Centered);
        assert!(config.heading.wrap_deviation);
        assert!(!config.parallel);
        assert_eq!(settings.format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result =
            Settings::try_parse_from(["trajectory-deviation", "-r", "r", "--positive-side", "up", "q"]);
        assert!(result.is_err());

        let settings = parse(&["-r", "ref.txt", "--window", "0", "lap.txt"]);
        assert!(matches!(settings.engine_config(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_config_file_with_override() {
        let dir = std::env::temp_dir().join(format!("trajectory-deviation-cfg-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("engine.json");
        std::fs::write(
            &path,
            r#"{ "index_algorithm": "exhaustive", "curvature": { "window": 5 } }"#,
        )
        .unwrap();

        let config_arg = path.to_string_lossy().to_string();
        let settings = parse(&["-r", "ref.txt", "-c", &config_arg, "--window", "7", "lap.txt"]);
        let config = settings.engine_config().unwrap();
        assert_eq!(config.index_algorithm, IndexAlgorithm::Exhaustive);
        assert_eq!(config.curvature.window, 7);
        assert_eq!(config.curvature.min_periods, 1);
        assert_eq!(config.positive_side, PositiveSide::Left);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            settings.engine_config(),
            Err(CliError::ConfigFile { .. })
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
