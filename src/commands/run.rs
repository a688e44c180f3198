use crate::cli::Args;
use crate::pipeline::context::{Flavor, RunContext};
use crate::pipeline::controller::{self, BatchSummary};
use crate::pipeline::session;
use crate::pipeline::tools::{self, SystemTools};
use crate::pipeline::workspace::{self, Workspace};
use crate::utils::Result;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Sets up the workspace and inputs, then hands the batch to the controller.
/// Everything that can fail here is a configuration error and aborts before
/// any accession is touched.
pub fn run(args: Args) -> Result<()> {
    let flavor = if args.unitigs {
        Flavor::Unitig
    } else {
        Flavor::Contig
    };
    preflight_tools(&args)?;

    let root = match (&args.output, &args.session) {
        (Some(name), _) => PathBuf::from(name),
        (None, Some(id)) => PathBuf::from(format!("session_{}", id)),
        (None, None) => {
            let query = required(&args.query, "--query")?;
            workspace::default_root(query, Path::new("."))?
        }
    };
    let ws = Workspace::create(root)?;

    let (query_file, accession_file) = match &args.session {
        Some(id) => {
            let inputs = session::resolve(id, &ws.input_dir)?;
            (inputs.query_file, inputs.accession_file)
        }
        None => {
            let query = required(&args.query, "--query")?;
            let accessions = required(&args.accessions, "--accessions")?;
            ws.import_inputs(query, accessions)?
        }
    };

    for (label, path) in [("Query", &query_file), ("Accession", &accession_file)] {
        if !path.exists() {
            return Err(format!(
                "{} file '{}' does not exist",
                label,
                path.display()
            ));
        }
    }

    let failure_sink = match flavor {
        Flavor::Contig => Some(ws.touch_failed_list()?),
        Flavor::Unitig => None,
    };

    let ctx = RunContext {
        archive_dir: ws.archive_dir.clone(),
        alignment_dir: ws.alignment_dir.clone(),
        query_file,
        accession_file,
        flavor,
        kmer_size: args.kmer_size,
        limit: args.limit,
        delete_intermediates: args.delete,
        failure_sink,
    };

    let system_tools = SystemTools::new();
    let summary = controller::process_batch(&ctx, &system_tools)?;

    println!("\n{}", "================".blue());
    println!("{}", ">>> All done <<<".cyan());
    println!("{}\n", "================".blue());

    report_summary(&ctx, &ws, &args, &summary);
    Ok(())
}

fn preflight_tools(args: &Args) -> Result<()> {
    let mut names: Vec<&str> = vec!["back_to_sequences", "blastn"];
    if args.session.is_some() {
        names.push("unzip");
    }
    tools::require_tools(&names)?;
    if tools::find_in_path("aws").is_none() && tools::find_in_path("wget").is_none() {
        return Err(
            "Neither 'aws' nor 'wget' was found in PATH; one is needed to download archives"
                .to_string(),
        );
    }
    Ok(())
}

fn required<'a>(value: &'a Option<PathBuf>, flag: &str) -> Result<&'a PathBuf> {
    value
        .as_ref()
        .ok_or_else(|| format!("{} is required unless --session is given", flag))
}

fn report_summary(ctx: &RunContext, ws: &Workspace, args: &Args, summary: &BatchSummary) {
    log::info!(
        "Processed {} accession(s): {} completed, {} without recruited sequences, {} download failures, {} recruitment failures, {} synthesis failures",
        summary.attempted,
        summary.completed,
        summary.skipped_empty,
        summary.failed_download,
        summary.failed_recruit,
        summary.failed_synthesis
    );
    if !args.delete {
        log::info!(
            "Intermediate files were kept; remove them with: rm -rf {}",
            ws.archive_dir.display()
        );
    }
    log::info!("Results can be found in directory {}", ws.root.display());

    let Some(sink) = &ctx.failure_sink else {
        return;
    };
    let recorded = fs::read_to_string(sink)
        .map(|text| text.lines().count())
        .unwrap_or(0);
    if recorded == 0 {
        return;
    }
    log::info!(
        "{} accession{} failed to download or had no recruited sequences",
        recorded,
        if recorded > 1 { "s" } else { "" }
    );
    log::info!("List of failed accessions: {}", sink.display());
    log::info!("You can retry them against the unitig sets with:");
    let delete_flag = if args.delete { " --delete" } else { "" };
    println!(
        "{}",
        format!(
            "{} --accessions {} --query {} --unitigs --kmer-size {}{}",
            env!("CARGO_PKG_NAME"),
            sink.display(),
            ctx.query_file.display(),
            args.kmer_size,
            delete_flag
        )
        .yellow()
    );
}
