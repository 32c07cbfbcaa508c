use std::io;

use anyhow::bail;
use colored::Colorize;

use magpie_catalog::CatalogRepo;
use magpie_pipeline::{extract, ExporterConfig, RestoreClient};
use magpie_store::registry::DEFAULT_SCHEME;
use magpie_store::{Backends, BlobPath};
use magpie_types::generate_dump_filename;

use crate::cli::*;

/// Overrides the root directory of the default `fs` storage backend.
const STORE_ROOT_ENV: &str = "MAGPIE_STORE_ROOT";
const DEFAULT_STORE_ROOT: &str = ".magpie";

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Stash(args) => cmd_stash(args),
        Command::Restore(args) => cmd_restore(args),
        Command::List(args) => cmd_list(args),
    }
}

fn backends() -> Backends {
    let root =
        std::env::var(STORE_ROOT_ENV).unwrap_or_else(|_| DEFAULT_STORE_ROOT.to_string());
    Backends::with_default_backend(root)
}

fn cmd_stash(args: StashArgs) -> anyhow::Result<()> {
    let backends = backends();
    let mut exporter = ExporterConfig::default();
    if let Some(config) = args.config {
        exporter = exporter.with_config(config);
    }

    println!("{}", "Extracting dump...".blue());
    let path = BlobPath::new(&args.bucket, generate_dump_filename());
    let storage_url = extract(&exporter, &args.source, |stream| {
        backends
            .store_stream(DEFAULT_SCHEME, &path, stream)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    })?;
    println!("Dump extracted: {}", storage_url.as_str().blue());

    let repo = CatalogRepo::new(backends.get(DEFAULT_SCHEME)?);
    let dump = repo.update(&args.bucket, |stash| {
        let dump = stash.add_dump(storage_url.clone());
        stash.tag_dump(&dump, &args.tags);
        dump
    })?;

    let tags = repo.load(&args.bucket)?.get_tags(&dump.dump_id);
    println!(
        "{} Dump stashed: id: {}, tags: [{}]",
        "✓".green().bold(),
        dump.dump_id.yellow(),
        tags.join(", ").green(),
    );
    Ok(())
}

fn cmd_restore(args: RestoreArgs) -> anyhow::Result<()> {
    let backends = backends();
    let repo = CatalogRepo::new(backends.get(DEFAULT_SCHEME)?);
    let stash = repo.load(&args.bucket)?;
    let Some(dump) = stash.get_dump(&args.dump) else {
        bail!("dump not found: {}", args.dump);
    };

    println!("{}", "Restoring dump...".blue());
    let mut stream = backends.open_url(&dump.storage_url)?;
    RestoreClient::new().write_dump(&args.target, stream.as_mut())?;

    println!(
        "{} Dump restored: id: {}",
        "✓".green().bold(),
        dump.dump_id.yellow(),
    );
    Ok(())
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let backends = backends();
    let repo = CatalogRepo::new(backends.get(DEFAULT_SCHEME)?);
    let stash = repo.load(&args.bucket)?;

    if stash.dumps.is_empty() {
        println!("No dumps stashed in {}.", args.bucket.bold());
        return Ok(());
    }
    for dump in &stash.dumps {
        let tags = stash.get_tags(&dump.dump_id);
        let suffix = if tags.is_empty() {
            String::new()
        } else {
            format!("  [{}]", tags.join(", "))
        };
        println!(
            "{}  {}  {}{}",
            dump.dump_id.yellow(),
            dump.timestamp.dimmed(),
            dump.storage_url,
            suffix.green(),
        );
    }
    Ok(())
}
