//! Whitespace-separated trajectory files
//!
//! The first non-empty line is a header naming the columns; every following line is one
//! sample. Columns are located by name, so extra columns and any column order are fine:
//!
//! ```text
//! utmX(m)      utmY(m)       heading(rad)  velocity(m/s)  distance
//! 500012.31    4182003.97    1.5702        8.31           0.0
//! ```
//!
//! Rows that cannot be parsed are skipped with a warning.

use crate::CliError;
use std::path::Path as FsPath;
use trajectory_deviation_lib::{EngineConfig, Path};

pub const X_COLUMN: &str = "utmX(m)";
pub const Y_COLUMN: &str = "utmY(m)";
pub const HEADING_COLUMN: &str = "heading(rad)";
pub const SPEED_COLUMN: &str = "velocity(m/s)";

/// Parsed file contents before path construction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Samples {
    /// `(x, y, heading)` per accepted row
    pub points: Vec<(f64, f64, f64)>,
    /// Per-row speed, present when the header has a speed column
    pub speeds: Option<Vec<f64>>,
    /// Number of rows that were skipped
    pub skipped: usize,
}

struct Columns {
    x: usize,
    y: usize,
    heading: usize,
    speed: Option<usize>,
}

impl Columns {
    fn from_header(header: &str, source: &FsPath) -> Result<Self, CliError> {
        let names: Vec<&str> = header.split_whitespace().collect();
        let find = |column: &'static str| {
            names
                .iter()
                .position(|name| *name == column)
                .ok_or_else(|| CliError::MissingColumn {
                    path: source.to_path_buf(),
                    column,
                })
        };
        Ok(Self {
            x: find(X_COLUMN)?,
            y: find(Y_COLUMN)?,
            heading: find(HEADING_COLUMN)?,
            speed: find(SPEED_COLUMN).ok(),
        })
    }

    fn parse_field(fields: &[&str], column: usize, name: &str) -> Result<f64, String> {
        let field = fields
            .get(column)
            .ok_or_else(|| format!("missing '{name}' value"))?;
        let value: f64 = field
            .parse()
            .map_err(|e| format!("'{field}' in column '{name}': {e}"))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(format!("non-finite '{name}' value {field}"))
        }
    }

    fn parse_row(&self, line: &str) -> Result<((f64, f64, f64), Option<f64>), String> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let x = Self::parse_field(&fields, self.x, X_COLUMN)?;
        let y = Self::parse_field(&fields, self.y, Y_COLUMN)?;
        let heading = Self::parse_field(&fields, self.heading, HEADING_COLUMN)?;
        let speed = self
            .speed
            .map(|column| Self::parse_field(&fields, column, SPEED_COLUMN))
            .transpose()?;
        Ok(((x, y, heading), speed))
    }
}

/// Parse the text of a trajectory file; `source` is only used for messages
pub fn parse_samples(text: &str, source: &FsPath) -> Result<Samples, CliError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or_else(|| CliError::MissingHeader {
        path: source.to_path_buf(),
    })?;
    let columns = Columns::from_header(header, source)?;

    let mut samples = Samples {
        speeds: columns.speed.map(|_| Vec::new()),
        ..Samples::default()
    };
    for (line_index, line) in lines {
        match columns.parse_row(line) {
            Ok((point, speed)) => {
                samples.points.push(point);
                if let (Some(speeds), Some(speed)) = (samples.speeds.as_mut(), speed) {
                    speeds.push(speed);
                }
            }
            Err(reason) => {
                tracing::warn!(
                    "{}:{}: skipping row: {reason}",
                    source.display(),
                    line_index + 1
                );
                samples.skipped += 1;
            }
        }
    }

    Ok(samples)
}

/// Build a path from parsed samples with the engine's unwrap threshold
pub fn build_path(
    samples: Samples,
    config: &EngineConfig,
    source: &FsPath,
) -> Result<Path, CliError> {
    let engine_error = |source_error| CliError::Engine {
        path: source.to_path_buf(),
        source: source_error,
    };
    let path = config.build_path(samples.points).map_err(engine_error)?;
    match samples.speeds {
        Some(speeds) => path.with_speeds(speeds).map_err(engine_error),
        None => Ok(path),
    }
}

/// Read and parse a trajectory file
pub fn read_path(file: &FsPath, config: &EngineConfig) -> Result<Path, CliError> {
    #[cfg(feature = "profiling")]
    profiling::scope!("input::read_path");

    let text = std::fs::read_to_string(file).map_err(|source| CliError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let samples = parse_samples(&text, file)?;
    if samples.skipped > 0 {
        tracing::warn!(
            "{}: skipped {} unparsable rows",
            file.display(),
            samples.skipped
        );
    }

    let path = build_path(samples, config, file)?;
    tracing::info!(
        "Loaded {} points ({:.1} m) from {}",
        path.len(),
        path.total_distance(),
        file.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "test.txt";

    fn parse(text: &str) -> Result<Samples, CliError> {
        parse_samples(text, FsPath::new(SOURCE))
    }

    #[test]
    fn test_parse_with_speed() {
        let text = "\
utmX(m) utmY(m) heading(rad) velocity(m/s) distance
10.0 20.0 0.5 3.0 0.0
11.0 20.5 0.6 3.5 1.1
";
        let samples = parse(text).unwrap();
        assert_eq!(samples.points, vec![(10.0, 20.0, 0.5), (11.0, 20.5, 0.6)]);
        assert_eq!(samples.speeds, Some(vec![3.0, 3.5]));
        assert_eq!(samples.skipped, 0);
    }

    #[test]
    fn test_columns_found_by_name() {
        let text = "\
heading(rad)   utmY(m)   extra   utmX(m)

1.0   2.0   x   3.0
";
        let samples = parse(text).unwrap();
        assert_eq!(samples.points, vec![(3.0, 2.0, 1.0)]);
        assert_eq!(samples.speeds, None);
    }

    #[test]
    fn test_bad_rows_skipped() {
        let text = "\
utmX(m) utmY(m) heading(rad)
0 0 0
1 abc 0
2 0
3 0 NaN
4 0 0
";
        let samples = parse(text).unwrap();
        assert_eq!(samples.points, vec![(0.0, 0.0, 0.0), (4.0, 0.0, 0.0)]);
        assert_eq!(samples.skipped, 3);
    }

    #[test]
    fn test_missing_column() {
        let result = parse("utmX(m) utmY(m)\n1 2\n");
        assert!(matches!(
            result,
            Err(CliError::MissingColumn {
                column: HEADING_COLUMN,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(parse("\n  \n"), Err(CliError::MissingHeader { .. })));
    }

    #[test]
    fn test_build_path_carries_speeds() {
        let samples = Samples {
            points: vec![(0.0, 0.0, 0.0), (3.0, 4.0, 0.0)],
            speeds: Some(vec![1.0, 2.0]),
            skipped: 0,
        };
        let path = build_path(samples, &EngineConfig::default(), FsPath::new(SOURCE)).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.speed(1), Some(2.0));
        assert_eq!(path.total_distance(), 5.0);
    }

    #[test]
    fn test_build_path_too_short() {
        let samples = Samples {
            points: vec![(0.0, 0.0, 0.0)],
            speeds: None,
            skipped: 4,
        };
        let err = build_path(samples, &EngineConfig::default(), FsPath::new(SOURCE)).unwrap_err();
        assert!(err.to_string().starts_with("test.txt: "));
    }
}
