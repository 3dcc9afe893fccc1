mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command, ProcessArgs, RenameArgs, VerifyArgs};
use prodimg::batch::BatchProcessor;
use prodimg::logging::init_logging;
use prodimg::rename::{create_size_variants, rename_scope, rename_targets, BACKFILL_VARIANTS};
use prodimg::verify::verify_tree;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Process(args) => process(args),
        Command::Rename(args) => rename(args),
        Command::Verify(args) => verify(args),
    }
}

fn process(args: ProcessArgs) -> Result<ExitCode> {
    info!("handles both structures: nested input/<brand>/<images>, flat input/<images> (use --brand)");

    if !args.input.exists() {
        error!("input folder not found: {}", args.input.display());
        return Ok(ExitCode::FAILURE);
    }

    let config = args.to_config();
    info!(
        padding = config.padding,
        quality = config.quality,
        variants = ?config.variants(),
        "settings"
    );

    let processor = BatchProcessor::new(config)?;
    let stats = processor.run(&args.input, &args.output)?;

    println!("Processed: {} images", stats.processed);
    println!("Failed: {} images", stats.failed);
    println!("Skipped: {} files", stats.skipped);
    if stats.processed > 0 {
        println!("Processing complete! Check '{}'", args.output.display());
    }

    Ok(if stats.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn rename(args: RenameArgs) -> Result<ExitCode> {
    let mut collisions = 0;
    let mut failures = 0;

    for dir in rename_targets(&args.folder)? {
        match rename_scope(&dir) {
            Ok(report) => {
                for outcome in report.collisions() {
                    warn!("unresolved name collision: {:?}", outcome);
                }
                collisions += report.collisions().len();
                failures += report.failures().len();
                println!("{}: {} renamed", dir.display(), report.renamed());
            }
            Err(e) => {
                error!(folder = %dir.display(), error = %e, "cannot rename folder");
                failures += 1;
                continue;
            }
        }

        if args.create_sizes {
            match create_size_variants(&dir, BACKFILL_VARIANTS, args.quality) {
                Ok(variants) => {
                    println!("{}: {} variants created", dir.display(), variants.created.len());
                    failures += variants.failed.len();
                }
                Err(e) => {
                    error!(folder = %dir.display(), error = %e, "cannot create size variants");
                    failures += 1;
                }
            }
        }
    }

    if collisions > 0 {
        println!("{} file(s) parked under a temporary name, rerun after resolving", collisions);
    }
    println!("Done!");

    Ok(if collisions == 0 && failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn verify(args: VerifyArgs) -> Result<ExitCode> {
    let report = verify_tree(&args.folder)?;
    print!("{}", report);
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
