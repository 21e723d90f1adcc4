use crate::output::{self, OutputFormat};
use crate::{CliError, Settings, input};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path as FsPath;
use std::sync::Arc;
use trajectory_deviation_lib::{TrajectoryDeviationReport, TrajectoryEngine};

/// Evaluate every query file against the reference and write the results
pub fn run(settings: &Settings) -> Result<(), CliError> {
    #[cfg(feature = "profiling")]
    profiling::scope!("run");

    let config = settings.engine_config()?;
    let reference = input::read_path(&settings.reference, &config)?;
    let engine = TrajectoryEngine::new(config.clone(), Arc::new(reference)).map_err(|source| {
        CliError::Engine {
            path: settings.reference.clone(),
            source,
        }
    })?;

    let queries = settings
        .queries
        .iter()
        .map(|file| input::read_path(file, &config))
        .collect::<Result<Vec<_>, _>>()?;
    let reports = engine.evaluate_many(&queries);

    if let Some(directory) = &settings.output {
        std::fs::create_dir_all(directory).map_err(|source| CliError::Write {
            path: directory.clone(),
            source,
        })?;
    }

    for (file, report) in settings.queries.iter().zip(&reports) {
        log_summary(file, report, settings.warmup_distance);
    }

    match &settings.output {
        Some(directory) => {
            for (file, report) in settings.queries.iter().zip(&reports) {
                let destination = output::destination(directory, file, settings.format);
                let handle = File::create(&destination).map_err(|source| CliError::Write {
                    path: destination.clone(),
                    source,
                })?;
                write_report(&mut BufWriter::new(handle), settings, file, report, &destination)?;
                tracing::info!("Wrote {}", destination.display());
            }
        }
        None => {
            let stdout = std::io::stdout();
            write_combined(&mut stdout.lock(), settings, &reports, FsPath::new("<stdout>"))?;
        }
    }

    if let Some(destination) = &settings.curvature_output {
        let write_error = |source| CliError::Write {
            path: destination.clone(),
            source,
        };
        let mut writer = BufWriter::new(File::create(destination).map_err(write_error)?);
        output::write_curvature(&mut writer, engine.reference(), engine.reference_curvature())
            .and_then(|()| writer.flush())
            .map_err(write_error)?;
        tracing::info!("Wrote reference curvature to {}", destination.display());
    }

    Ok(())
}

fn write_report<W: Write>(
    writer: &mut W,
    settings: &Settings,
    source: &FsPath,
    report: &TrajectoryDeviationReport,
    destination: &FsPath,
) -> Result<(), CliError> {
    let write_error = |source| CliError::Write {
        path: destination.to_path_buf(),
        source,
    };
    match settings.format {
        OutputFormat::Text => output::write_text(writer, report).map_err(write_error)?,
        OutputFormat::Json => output::write_json(writer, source, report, settings.warmup_distance)?,
    }
    writer.flush().map_err(write_error)
}

/// Write every report to one stream: a JSON array, or text tables each headed by `# <file>`
fn write_combined<W: Write>(
    writer: &mut W,
    settings: &Settings,
    reports: &[TrajectoryDeviationReport],
    destination: &FsPath,
) -> Result<(), CliError> {
    let write_error = |source| CliError::Write {
        path: destination.to_path_buf(),
        source,
    };
    let sources = settings.queries.iter().map(|file| file.as_path());
    match settings.format {
        OutputFormat::Text => {
            for (source, report) in sources.zip(reports) {
                output::write_text_section(writer, source, report).map_err(write_error)?;
            }
        }
        OutputFormat::Json => {
            output::write_json_all(writer, sources.zip(reports), settings.warmup_distance)?
        }
    }
    writer.flush().map_err(write_error)
}

fn log_summary(file: &FsPath, report: &TrajectoryDeviationReport, warmup_distance: f64) {
    match report.deviation_summary(warmup_distance) {
        Some(summary) => tracing::info!(
            "{}: |lateral deviation| after {warmup_distance} m: max {:.3} m, min {:.3} m, mean {:.3} m, std {:.3} m ({} points)",
            file.display(),
            summary.max_abs,
            summary.min_abs,
            summary.mean_abs,
            summary.std_abs,
            summary.count
        ),
        None => tracing::warn!(
            "{}: no points beyond the {warmup_distance} m warm-up distance",
            file.display()
        ),
    }
    if let Some(heading) = report.heading_summary(warmup_distance) {
        tracing::info!(
            "{}: heading deviation range [{:.4}, {:.4}] rad",
            file.display(),
            heading.min,
            heading.max
        );
    }
    let degenerate = report.degenerate_count();
    if degenerate > 0 {
        tracing::warn!(
            "{}: {degenerate} points matched coincident reference points; their deviation is unsigned",
            file.display()
        );
    }
}
