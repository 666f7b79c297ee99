mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use depot_core::{Digest, FileContent, StorageEngine, StoreConfig};
use output::{
    AddOutput, CheckOutput, ContentOutput, InfoOutput, LsOutput, OutputWriter, RmOutput,
    SearchOutput, StatsOutput, format_size,
};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Depot - a deduplicating content-addressed file store
#[derive(Parser)]
#[command(name = "depot")]
#[command(about = "Deduplicating content-addressed file store", long_about = None)]
#[command(version)]
struct Cli {
    /// Store root directory (defaults to DEPOT_ROOT env var or ./depot-store)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Per-file size ceiling in bytes
    #[arg(long, global = true)]
    max_object_bytes: Option<u64>,

    /// Store-wide size ceiling in bytes
    #[arg(long, global = true)]
    max_total_bytes: Option<u64>,

    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a file ('-' reads from stdin)
    Add {
        /// File to upload
        path: PathBuf,

        /// Display name to record (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Download a file by digest
    Get {
        /// Digest of the file
        digest: String,

        /// Write content to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Delete a file by digest
    Rm {
        /// Digest of the file
        digest: String,
    },

    /// List stored files, most recent first
    Ls {
        /// Maximum number of entries to show
        #[arg(long, default_value_t = 50)]
        limit: i64,

        /// Number of entries to skip
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },

    /// Show metadata for a digest
    Info {
        /// Digest of the file
        digest: String,
    },

    /// Show storage usage and configured limits
    Stats,

    /// Search display names (case-insensitive substring)
    Search {
        /// Substring to search for
        query: String,
    },

    /// Download the first file with an exact display name
    Fetch {
        /// Display name to look up
        name: String,

        /// Write content to this path instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify a stored object against its digest
    Check {
        /// Digest of the file
        digest: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let out = OutputWriter::new(cli.json);

    if let Err(err) = run(cli, &out) {
        out.write_error(&err);
        std::process::exit(1);
    }
}

fn run(cli: Cli, out: &OutputWriter) -> Result<()> {
    // Store root: CLI arg > DEPOT_ROOT env var > ./depot-store default
    let root = cli
        .root
        .or_else(|| std::env::var("DEPOT_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./depot-store"));

    let mut config = StoreConfig::new(&root);
    if let Some(limit) = cli.max_object_bytes {
        config.max_object_bytes = limit;
    }
    if let Some(limit) = cli.max_total_bytes {
        config.max_total_bytes = limit;
    }

    let engine = StorageEngine::open(config)
        .with_context(|| format!("Failed to open store at {}", root.display()))?;

    match cli.command {
        Commands::Add { path, name } => cmd_add(&engine, out, &path, name),
        Commands::Get { digest, output } => cmd_get(&engine, out, &digest, output.as_deref()),
        Commands::Rm { digest } => cmd_rm(&engine, out, &digest),
        Commands::Ls { limit, offset } => cmd_ls(&engine, out, limit, offset),
        Commands::Info { digest } => cmd_info(&engine, out, &digest),
        Commands::Stats => cmd_stats(&engine, out),
        Commands::Search { query } => cmd_search(&engine, out, &query),
        Commands::Fetch { name, output } => cmd_fetch(&engine, out, &name, output.as_deref()),
        Commands::Check { digest } => cmd_check(&engine, out, &digest),
    }
}

fn parse_digest(digest_str: &str) -> Result<Digest> {
    Digest::from_hex(digest_str).with_context(|| format!("Invalid digest: {}", digest_str))
}

fn cmd_add(
    engine: &StorageEngine,
    out: &OutputWriter,
    path: &Path,
    name: Option<String>,
) -> Result<()> {
    let (bytes, display_name) = if path == Path::new("-") {
        if atty::is(atty::Stream::Stdin) {
            anyhow::bail!("Refusing to read from a terminal; pipe data in or pass a file path");
        }
        let name = name
            .ok_or_else(|| anyhow::anyhow!("Reading from stdin requires --name"))?;
        let mut bytes = Vec::new();
        io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read from stdin")?;
        (bytes, name)
    } else {
        let bytes =
            fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let display_name = match name {
            Some(name) => name,
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| anyhow::anyhow!("Cannot derive a file name from {}", path.display()))?,
        };
        (bytes, display_name)
    };

    if display_name.is_empty() {
        anyhow::bail!("Display name must not be empty");
    }

    let outcome = engine
        .upload(&bytes, &display_name)
        .with_context(|| format!("Failed to upload {}", display_name))?;

    let data = AddOutput {
        success: true,
        digest: outcome.digest,
        display_name: outcome.record.display_name.clone(),
        size_bytes: outcome.record.size_bytes,
        media_type: outcome.record.media_type.clone(),
        deduplicated: outcome.deduplicated,
    };
    out.write(&data, || {
        let mut text = format!(
            "{} {} ({})\n",
            outcome.digest,
            outcome.record.display_name,
            format_size(outcome.record.size_bytes)
        );
        if outcome.deduplicated {
            text.push_str("Content already stored; metadata refreshed\n");
        }
        text
    })
}

fn cmd_get(
    engine: &StorageEngine,
    out: &OutputWriter,
    digest_str: &str,
    dest: Option<&Path>,
) -> Result<()> {
    let digest = parse_digest(digest_str)?;
    let content = engine
        .download(&digest)
        .with_context(|| format!("Failed to download {}", digest_str))?;

    write_content(out, digest, &content, dest)
}

fn cmd_fetch(
    engine: &StorageEngine,
    out: &OutputWriter,
    name: &str,
    dest: Option<&Path>,
) -> Result<()> {
    let content = engine
        .find_by_exact_name(name)
        .with_context(|| format!("Failed to fetch {}", name))?;

    let digest = Digest::of_bytes(&content.bytes);
    write_content(out, digest, &content, dest)
}

/// Write downloaded content to a file or to stdout.
fn write_content(
    out: &OutputWriter,
    digest: Digest,
    content: &FileContent,
    dest: Option<&Path>,
) -> Result<()> {
    match dest {
        Some(dest) => {
            fs::write(dest, &content.bytes)
                .with_context(|| format!("Failed to write {}", dest.display()))?;

            let data = ContentOutput {
                success: true,
                digest,
                display_name: content.display_name.clone(),
                media_type: content.media_type.clone(),
                size_bytes: content.bytes.len() as u64,
                written_to: dest.display().to_string(),
            };
            out.write(&data, || {
                format!(
                    "Wrote {} to {}\n",
                    format_size(content.bytes.len() as u64),
                    dest.display()
                )
            })
        }
        None => {
            if out.is_json() {
                anyhow::bail!("JSON mode cannot stream file content; use --output");
            }
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(&content.bytes)?;
            Ok(())
        }
    }
}

fn cmd_rm(engine: &StorageEngine, out: &OutputWriter, digest_str: &str) -> Result<()> {
    let digest = parse_digest(digest_str)?;
    let record = engine
        .delete(&digest)
        .with_context(|| format!("Failed to delete {}", digest_str))?;

    let data = RmOutput {
        success: true,
        digest,
        display_name: record.display_name.clone(),
        size_bytes: record.size_bytes,
    };
    out.write(&data, || {
        format!("Deleted {} ({})\n", record.display_name, digest)
    })
}

fn cmd_ls(engine: &StorageEngine, out: &OutputWriter, limit: i64, offset: i64) -> Result<()> {
    // Negative values clamp to zero; a zero limit yields an empty page
    let listing = engine.list(limit.max(0) as usize, offset.max(0) as usize);

    let data = LsOutput {
        success: true,
        files: listing.files.clone(),
        total: listing.total,
        limit: listing.limit,
        offset: listing.offset,
    };
    out.write(&data, || {
        let mut text = String::new();
        for file in &listing.files {
            text.push_str(&format!(
                "{}  {:>10}  {}  {}\n",
                file.digest,
                format_size(file.size_bytes),
                file.upload_time.format("%Y-%m-%d %H:%M:%S"),
                file.display_name
            ));
        }
        text.push_str(&format!(
            "Showing {} of {} file(s)\n",
            listing.files.len(),
            listing.total
        ));
        text
    })
}

fn cmd_info(engine: &StorageEngine, out: &OutputWriter, digest_str: &str) -> Result<()> {
    let digest = parse_digest(digest_str)?;
    let record = engine
        .info(&digest)
        .with_context(|| format!("No file with digest {}", digest_str))?;

    let data = InfoOutput {
        success: true,
        file: record.clone(),
    };
    out.write(&data, || {
        format!(
            "Digest: {}\nName: {}\nSize: {} ({} bytes)\nUploaded: {}\nMedia type: {}\n",
            record.digest,
            record.display_name,
            format_size(record.size_bytes),
            record.size_bytes,
            record.upload_time.format("%Y-%m-%d %H:%M:%S UTC"),
            record.media_type
        )
    })
}

fn cmd_stats(engine: &StorageEngine, out: &OutputWriter) -> Result<()> {
    let report = engine.stats();

    let data = StatsOutput {
        success: true,
        stats: report.stats,
        max_object_bytes: report.max_object_bytes,
        max_total_bytes: report.max_total_bytes,
    };
    out.write(&data, || {
        format!(
            "Files: {}\nUsed: {} of {}\nPer-file limit: {}\n",
            report.stats.total_files,
            format_size(report.stats.total_bytes),
            format_size(report.max_total_bytes),
            format_size(report.max_object_bytes)
        )
    })
}

fn cmd_search(engine: &StorageEngine, out: &OutputWriter, query: &str) -> Result<()> {
    let files = engine.search_by_name(query);

    let data = SearchOutput {
        success: true,
        total: files.len() as u64,
        files: files.clone(),
    };
    out.write(&data, || {
        let mut text = String::new();
        for file in &files {
            text.push_str(&format!(
                "{}  {:>10}  {}\n",
                file.digest,
                format_size(file.size_bytes),
                file.display_name
            ));
        }
        text.push_str(&format!("{} match(es)\n", files.len()));
        text
    })
}

fn cmd_check(engine: &StorageEngine, out: &OutputWriter, digest_str: &str) -> Result<()> {
    let digest = parse_digest(digest_str)?;
    let intact = engine
        .verify(&digest)
        .with_context(|| format!("Failed to verify {}", digest_str))?;

    let data = CheckOutput {
        success: true,
        digest,
        intact,
    };
    out.write(&data, || {
        if intact {
            format!("{} OK\n", digest)
        } else {
            format!("{} CORRUPT\n", digest)
        }
    })
}
