//! exthash CLI
//!
//! Command-line driver for a table of `TextRecord`s.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use exthash::{Config, Engine, TextRecord};
use tracing_subscriber::{fmt, EnvFilter};

/// exthash CLI
#[derive(Parser, Debug)]
#[command(name = "exthash-cli")]
#[command(about = "CLI for the exthash persistent extensible hash table")]
#[command(version)]
struct Args {
    /// Data directory holding directory.db and buckets.db
    #[arg(short, long, default_value = "./exthash_data")]
    data_dir: PathBuf,

    /// Records per bucket (used when the files are created)
    #[arg(short, long, default_value = "3")]
    capacity: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Insert a new record
    Insert {
        /// The record key
        key: i32,

        /// The record value (at most 20 bytes are kept)
        value: String,
    },

    /// Get a record by key
    Get {
        /// The key to get
        key: i32,
    },

    /// Replace the value of an existing record
    Update {
        /// The record key
        key: i32,

        /// The new value
        value: String,
    },

    /// Delete a record by key
    Del {
        /// The key to delete
        key: i32,
    },

    /// Print the directory and every bucket slot
    Dump,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,exthash=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .bucket_capacity(args.capacity)
        .build();

    let mut engine = match Engine::<TextRecord>::open(config) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Failed to open table: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&mut engine, args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }

    if let Err(e) = engine.close() {
        tracing::error!("Failed to close table: {}", e);
        process::exit(1);
    }
}

fn run(engine: &mut Engine<TextRecord>, command: Commands) -> exthash::Result<()> {
    match command {
        Commands::Insert { key, value } => {
            let record = TextRecord::new(key, value);
            engine.create(record.clone())?;
            println!("Inserted {}", record);
        }
        Commands::Get { key } => match engine.read(key.into())? {
            Some(record) => println!("{}", record),
            None => println!("Key {} not found", key),
        },
        Commands::Update { key, value } => {
            if engine.update(TextRecord::new(key, value))? {
                println!("Updated key {}", key);
            } else {
                println!("Key {} not found", key);
            }
        }
        Commands::Del { key } => {
            if engine.delete(key.into())? {
                println!("Deleted key {}", key);
            } else {
                println!("Key {} not found", key);
            }
        }
        Commands::Dump => dump(engine)?,
    }
    Ok(())
}

fn dump(engine: &Engine<TextRecord>) -> exthash::Result<()> {
    println!("DIRECTORY ------------------");
    println!("Global depth: {}", engine.global_depth()?);
    for (index, offset) in engine.directory_snapshot()? {
        println!("{}: {}", index, offset);
    }

    println!();
    println!("BUCKETS --------------------");
    for bucket in engine.buckets()? {
        let bucket = bucket?;
        println!("Offset: {}", bucket.offset);
        println!("Local depth: {}", bucket.local_depth);
        println!("Count: {}/{}", bucket.count, bucket.capacity);

        let mut line = String::from("| ");
        for record in &bucket.records {
            line.push_str(&format!("{} | ", record));
        }
        for _ in bucket.count..bucket.capacity {
            line.push_str("- | ");
        }
        println!("{}", line);
    }
    Ok(())
}
