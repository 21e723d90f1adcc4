//! Result writers
//!
//! Text output mirrors the input layout: a header line, then one whitespace-separated row
//! per query point. JSON output adds the summaries and the source file name. When several
//! queries share one stream, text tables are introduced by a `# <source>` line and JSON
//! documents are collected into one array.

use serde::Serialize;
use std::io::Write;
use std::path::{Path as FsPath, PathBuf};
use trajectory_deviation_lib::{
    CurvatureSample, DeviationRow, DeviationSummary, HeadingSummary, Path,
    TrajectoryDeviationReport,
};

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Whitespace-separated columns with a header line
    #[default]
    Text,
    /// JSON with summaries: one document per query file, or one array of them on standard output
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

/// JSON document written for one query path
#[derive(Serialize)]
struct QueryDocument<'a> {
    source: String,
    warmup_distance: f64,
    deviation_summary: Option<DeviationSummary>,
    heading_summary: Option<HeadingSummary>,
    degenerate_count: usize,
    rows: &'a [DeviationRow],
}

impl<'a> QueryDocument<'a> {
    fn new(source: &FsPath, report: &'a TrajectoryDeviationReport, warmup_distance: f64) -> Self {
        Self {
            source: source.display().to_string(),
            warmup_distance,
            deviation_summary: report.deviation_summary(warmup_distance),
            heading_summary: report.heading_summary(warmup_distance),
            degenerate_count: report.degenerate_count(),
            rows: report.rows(),
        }
    }
}

/// Where the results of `query` go inside `directory`: `<stem>_deviation.<ext>`
pub fn destination(directory: &FsPath, query: &FsPath, format: OutputFormat) -> PathBuf {
    let stem = query
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "query".to_string());
    directory.join(format!("{stem}_deviation.{}", format.extension()))
}

/// Write per-point rows as whitespace-separated text
pub fn write_text<W: Write>(writer: &mut W, report: &TrajectoryDeviationReport) -> std::io::Result<()> {
    let with_speed = report.rows().iter().any(|r| r.speed.is_some());

    write!(
        writer,
        "distance(m) lateral_deviation(m) heading_deviation(rad) curvature(1/m) nearest_index second_nearest_index degenerate"
    )?;
    if with_speed {
        write!(writer, " velocity(m/s)")?;
    }
    writeln!(writer)?;

    for row in report.rows() {
        write!(
            writer,
            "{:.4} {:.6} {:.6} {:.8} {} {} {}",
            row.cumulative_distance,
            row.signed_lateral_offset,
            row.heading_deviation,
            row.reference_curvature,
            row.nearest_index,
            row.second_nearest_index,
            u8::from(row.degenerate)
        )?;
        if with_speed {
            match row.speed {
                Some(speed) => write!(writer, " {speed:.4}")?,
                None => write!(writer, " NaN")?,
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Write the report of one query as a pretty-printed JSON document
pub fn write_json<W: Write>(
    writer: &mut W,
    source: &FsPath,
    report: &TrajectoryDeviationReport,
    warmup_distance: f64,
) -> serde_json::Result<()> {
    let document = QueryDocument::new(source, report, warmup_distance);
    serde_json::to_writer_pretty(&mut *writer, &document)?;
    writeln!(writer).map_err(serde_json::Error::io)
}

/// Write the reports of several queries as a single JSON array, in the given order
pub fn write_json_all<'a, W, I>(writer: &mut W, reports: I, warmup_distance: f64) -> serde_json::Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a FsPath, &'a TrajectoryDeviationReport)>,
{
    let documents: Vec<QueryDocument<'a>> = reports
        .into_iter()
        .map(|(source, report)| QueryDocument::new(source, report, warmup_distance))
        .collect();
    serde_json::to_writer_pretty(&mut *writer, &documents)?;
    writeln!(writer).map_err(serde_json::Error::io)
}

/// Write per-point rows preceded by a `# <source>` line naming the query file
pub fn write_text_section<W: Write>(
    writer: &mut W,
    source: &FsPath,
    report: &TrajectoryDeviationReport,
) -> std::io::Result<()> {
    writeln!(writer, "# {}", source.display())?;
    write_text(writer, report)
}

/// Write reference positions with their smoothed curvature
pub fn write_curvature<W: Write>(
    writer: &mut W,
    reference: &Path,
    curvature: &[CurvatureSample],
) -> std::io::Result<()> {
    writeln!(writer, "utmX(m) utmY(m) distance(m) curvature(1/m)")?;
    for (point, sample) in reference.points().iter().zip(curvature) {
        writeln!(
            writer,
            "{:.4} {:.4} {:.4} {:.8}",
            point.position.x(),
            point.position.y(),
            point.cumulative_distance,
            sample.signed_curvature
        )?;
    }
    Ok(())
}
