//! blockrec CLI
//!
//! Generates, stores, looks up and reports on block-structured record files.

use std::error::Error;
use std::path::PathBuf;

use blockrec::record::RecordGenerator;
use blockrec::stats::BlockStats;
use blockrec::{Config, DanglingChunkPolicy, Layout, Record, RecordFile, StorageStats};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

/// Width of the occupancy bar in the block map
const BAR_WIDTH: usize = 20;

/// blockrec CLI
#[derive(Parser, Debug)]
#[command(name = "blockrec-cli")]
#[command(about = "Block-structured record files with fixed, contiguous and fragmented layouts")]
#[command(version)]
struct Args {
    /// Data file
    #[arg(short, long, default_value = "records.dat")]
    file: PathBuf,

    /// Block size in bytes; must match the value the file was written with
    #[arg(short, long, default_value = "4096")]
    block_size: usize,

    /// Packing layout (fixed, contiguous, fragmented)
    #[arg(short, long, default_value = "contiguous")]
    layout: Layout,

    /// Count the bytes of incomplete fragmented records as used
    #[arg(long)]
    lenient: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate records and replace the file with them
    Write {
        /// Number of records to generate
        #[arg(short, long)]
        count: usize,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Generate records and add them after the existing ones
    Append {
        /// Number of records to generate
        #[arg(short, long)]
        count: usize,

        /// Seed for reproducible output
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Look up one record by key
    Find {
        /// The key to look up
        key: u32,
    },

    /// Print every record in file order
    List,

    /// Report block occupancy
    Stats {
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,

        /// Include one line per block
        #[arg(long)]
        blocks: bool,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blockrec=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::debug!("blockrec v{}", blockrec::VERSION);

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let dangling = if args.lenient {
        DanglingChunkPolicy::Lenient
    } else {
        DanglingChunkPolicy::Strict
    };

    let config = Config::builder()
        .data_file(&args.file)
        .block_size(args.block_size)
        .layout(args.layout)
        .dangling_chunks(dangling)
        .build();

    let file = RecordFile::open(config)?;

    match args.command {
        Commands::Write { count, seed } => {
            let records = generator(seed).generate(count, file.validator());
            let stats = file.write_all(&records)?;
            println!(
                "Wrote {} records to {} ({} blocks, {:.2}% efficiency)",
                records.len(),
                file.path().display(),
                stats.total_blocks,
                stats.efficiency
            );
        }
        Commands::Append { count, seed } => {
            let first_key = file.next_key()?;
            let records = generator(seed)
                .starting_at(first_key)
                .generate(count, file.validator());
            let stats = file.append(&records)?;
            println!(
                "Appended {} records to {} ({} blocks, {:.2}% efficiency)",
                records.len(),
                file.path().display(),
                stats.total_blocks,
                stats.efficiency
            );
        }
        Commands::Find { key } => {
            let record = file.find_by_key(key)?;
            print_record(&record);
        }
        Commands::List => {
            let records = file.read_all()?;
            for record in &records {
                print_record(record);
            }
            println!("{} records", records.len());
        }
        Commands::Stats { json, blocks } => {
            let stats = file.stats()?;
            if json {
                let report = StatsReport {
                    layout: file.layout(),
                    block_size: file.config().block_size,
                    stats: &stats,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_stats(&file, &stats, blocks);
            }
        }
    }

    Ok(())
}

fn generator(seed: Option<u64>) -> RecordGenerator {
    match seed {
        Some(seed) => RecordGenerator::seeded(seed),
        None => RecordGenerator::from_entropy(),
    }
}

// =============================================================================
// Reporting
// =============================================================================

/// JSON form of the `stats` command
#[derive(Serialize)]
struct StatsReport<'a> {
    layout: Layout,
    block_size: usize,
    #[serde(flatten)]
    stats: &'a StorageStats,
}

fn print_record(record: &Record) {
    println!(
        "{:>9}  {:<24} {}  {:<24} {}  {:>5.2}  [{} / {}]",
        record.key,
        record.name,
        record.national_id,
        record.program,
        record.enrollment_year,
        record.score,
        record.guardian_a,
        record.guardian_b
    );
}

fn print_stats(file: &RecordFile, stats: &StorageStats, per_block: bool) {
    println!("File:              {}", file.path().display());
    println!("Layout:            {}", file.layout());
    println!("Block size:        {} bytes", file.config().block_size);
    println!("Blocks:            {}", stats.total_blocks);
    println!("Records:           {}", stats.total_records());
    println!("Bytes used:        {}", stats.total_bytes_used);
    println!("Bytes available:   {}", stats.total_bytes_available);
    println!("Efficiency:        {:.2}%", stats.efficiency);
    println!("Average occupancy: {:.2}%", stats.average_occupancy());
    println!("Partial blocks:    {}", stats.partial_blocks);

    if stats.corrupt_records > 0 {
        println!("Corrupt records:   {}", stats.corrupt_records);
    }

    if per_block {
        println!();
        for block in &stats.blocks {
            println!("{}", block_line(block));
        }
    }
}

fn block_line(block: &BlockStats) -> String {
    let filled = (block.occupancy / 100.0 * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);

    format!(
        "#{:05} [{}{}] {:>6.2}%  {:>5}/{} bytes  {} records",
        block.block_number,
        "#".repeat(filled),
        ".".repeat(BAR_WIDTH - filled),
        block.occupancy,
        block.bytes_used,
        block.bytes_total,
        block.record_count
    )
}
