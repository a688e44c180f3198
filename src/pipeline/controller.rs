use crate::coverage::{render, AlignmentSummary, TrackMode};
use crate::pipeline::context::RunContext;
use crate::pipeline::tools::ToolRunner;
use crate::utils::{self, Result};
use colored::Colorize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

const DOWNLOAD_ATTEMPTS: usize = 3;

/// Terminal state of one accession's trip through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessionOutcome {
    /// Recruited, aligned, and synthesized.
    Done,
    /// The recruitment filter matched nothing; alignment was skipped.
    SkippedEmpty,
    /// All download attempts failed.
    FailedDownload,
    /// The recruitment filter exited non-zero.
    FailedRecruit,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub completed: usize,
    pub skipped_empty: usize,
    pub failed_download: usize,
    pub failed_recruit: usize,
    pub failed_synthesis: usize,
}

impl BatchSummary {
    /// Accessions worth retrying against the unitig sets.
    pub fn recorded_failures(&self) -> usize {
        self.skipped_empty + self.failed_download + self.failed_recruit
    }
}

/// Drives every accession in the batch file through
/// download -> recruit -> align -> synthesize. Accessions are processed one
/// at a time in file order; no single accession's failure stops the batch.
pub fn process_batch(ctx: &RunContext, tools: &dyn ToolRunner) -> Result<BatchSummary> {
    let file = File::open(&ctx.accession_file)
        .map_err(|e| format!("Accession file {}: {}", ctx.accession_file.display(), e))?;
    let reader = BufReader::new(file);

    let mut summary = BatchSummary::default();
    for line in reader.lines() {
        let line = line
            .map_err(|e| format!("Accession file {}: {}", ctx.accession_file.display(), e))?;
        let accession = line.trim();
        if accession.is_empty() {
            continue;
        }
        if ctx.limit != 0 && summary.attempted >= ctx.limit {
            log::info!(
                "Reached limit of {} accessions, stopping further processing",
                ctx.limit
            );
            break;
        }
        summary.attempted += 1;

        println!("\n{}", "==========================================".blue());
        println!(
            "{}",
            format!(">>> Processing accession: {} <<<", accession).cyan()
        );
        println!("{}", "==========================================".blue());

        match process_accession(ctx, tools, accession) {
            Ok(AccessionOutcome::Done) => summary.completed += 1,
            Ok(AccessionOutcome::SkippedEmpty) => {
                summary.skipped_empty += 1;
                record_failure(ctx, accession)?;
            }
            Ok(AccessionOutcome::FailedDownload) => {
                summary.failed_download += 1;
                record_failure(ctx, accession)?;
            }
            Ok(AccessionOutcome::FailedRecruit) => {
                summary.failed_recruit += 1;
                record_failure(ctx, accession)?;
            }
            Err(e) => {
                // data inconsistency, not a recruitment dead end; kept out
                // of the failure list
                summary.failed_synthesis += 1;
                log::error!("Accession {}: {}", accession, e);
            }
        }
    }
    Ok(summary)
}

fn process_accession(
    ctx: &RunContext,
    tools: &dyn ToolRunner,
    accession: &str,
) -> Result<AccessionOutcome> {
    let archive = ctx.archive_path(accession);
    if archive.exists() {
        log::info!("Using existing local copy of {}", archive.display());
    } else if !download_with_retries(ctx, tools, accession, &archive) {
        log::error!(
            "Failed to download {} after {} attempts",
            ctx.flavor.archive_name(accession),
            DOWNLOAD_ATTEMPTS
        );
        return Ok(AccessionOutcome::FailedDownload);
    }

    let recruited = ctx.recruited_path(accession);
    log::info!(
        "Recruiting sequences from {} sharing {}-mers with {}",
        archive.display(),
        ctx.kmer_size,
        ctx.query_file.display()
    );
    if let Err(e) = tools.recruit(ctx.kmer_size, &ctx.query_file, &archive, &recruited) {
        log::error!("Recruitment failed for accession {}: {}", accession, e);
        remove_intermediates(&recruited, &archive);
        return Ok(AccessionOutcome::FailedRecruit);
    }

    let recruited_size = fs::metadata(&recruited).map(|m| m.len()).unwrap_or(0);
    if recruited_size == 0 {
        log::info!(
            "No sequences were recruited from {}, skipping alignment",
            ctx.flavor.archive_name(accession)
        );
        if ctx.delete_intermediates {
            remove_intermediates(&recruited, &archive);
        }
        return Ok(AccessionOutcome::SkippedEmpty);
    }

    let result = synthesize(ctx, tools, accession, &recruited);
    if ctx.delete_intermediates {
        remove_intermediates(&recruited, &archive);
    }
    result.map(|_| AccessionOutcome::Done)
}

fn download_with_retries(
    ctx: &RunContext,
    tools: &dyn ToolRunner,
    accession: &str,
    dest: &Path,
) -> bool {
    log::info!("Downloading {}...", ctx.flavor.archive_name(accession));
    for attempt in 1..=DOWNLOAD_ATTEMPTS {
        match tools.fetch(accession, ctx.flavor, dest) {
            Ok(()) => return true,
            Err(e) => log::warn!(
                "Download attempt {}/{} failed for {}: {}",
                attempt,
                DOWNLOAD_ATTEMPTS,
                ctx.flavor.archive_name(accession),
                e
            ),
        }
    }
    false
}

/// Aligns the recruited sequences against the query and renders the coverage
/// synthesis file. The query sequence must match the length declared by the
/// alignment report; a mismatch means the report was paired with the wrong
/// query and aborts this accession loudly.
fn synthesize(
    ctx: &RunContext,
    tools: &dyn ToolRunner,
    accession: &str,
    recruited: &Path,
) -> Result<()> {
    let query_id = utils::first_record_id(&ctx.query_file)?;
    let target_stem = recruited
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .unwrap_or(accession);
    let report_name = format!("{}_vs_{}.txt", query_id, target_stem);
    let report_path = ctx.alignment_dir.join(&report_name);

    log::info!("Aligning {} vs {}...", target_stem, query_id);
    tools.align(&ctx.query_file, recruited, &report_path)?;

    log::info!("Synthesizing alignment results into synth_{}", report_name);
    let summary = AlignmentSummary::from_path(&report_path)?;
    let sequence = utils::first_record_seq(&ctx.query_file)?;
    match summary.query_length {
        Some(length) if length == sequence.len() => {}
        Some(length) => {
            return Err(format!(
                "Query in {} has length {} but alignment report {} declares length {}",
                ctx.query_file.display(),
                sequence.len(),
                report_path.display(),
                length
            ))
        }
        None => {
            return Err(format!(
                "Alignment report {} declares no query length",
                report_path.display()
            ))
        }
    }

    let synth_path = ctx.alignment_dir.join(format!("synth_{}", report_name));
    let file = File::create(&synth_path)
        .map_err(|e| format!("File {}: {}", synth_path.display(), e))?;
    let mut out = BufWriter::new(file);
    let name = summary.query_name.as_deref().unwrap_or("unknown");
    render(
        &mut out,
        name,
        &sequence,
        &summary.coverage,
        TrackMode::Abundance,
    )
    .map_err(|e| format!("File {}: {}", synth_path.display(), e))?;
    Ok(())
}

/// Appends to the failure sink, if this run has one. The sink is reopened per
/// append so a killed run still leaves a valid list of failures so far.
fn record_failure(ctx: &RunContext, accession: &str) -> Result<()> {
    let Some(path) = &ctx.failure_sink else {
        return Ok(());
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("Failure list {}: {}", path.display(), e))?;
    writeln!(file, "{}", accession)
        .map_err(|e| format!("Failure list {}: {}", path.display(), e))
}

fn remove_intermediates(recruited: &Path, archive: &Path) {
    log::info!(
        "Removing {} and {}",
        recruited.display(),
        archive.display()
    );
    for path in [recruited, archive] {
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {}", path.display(), e);
            }
        }
    }
}
