//! kasin — fix Kindle ASINs in a Calibre library
//!
//! Extracts the Amazon identifiers recorded in `.opf` files, looks up the
//! Kindle-edition ASIN in the retail catalog, writes verified values back
//! into the metadata, and mirrors them into the Calibre database so a
//! Kindle can fetch the right covers.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use kasin_core::apply::apply;
use kasin_core::clean::clean;
use kasin_core::db::{sync, CalibreDb};
use kasin_core::extract::extract;
use kasin_core::resolve::{FileCheckpoint, Resolver, StdinPrompt};
use kasin_core::sources::amazon::AmazonKindleSource;
use kasin_core::{LookupConfig, MappingSet, Result};

#[derive(Parser)]
#[command(
    name = "kasin",
    version,
    about = "Reconcile Calibre Amazon identifiers with Kindle-edition ASINs"
)]
struct Cli {
    /// Emit stage summaries as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract Amazon identifiers from .opf files into a mapping file
    Extract {
        /// Library root to search
        #[arg(default_value = ".")]
        root_dir: PathBuf,
        /// Mapping file to write
        #[arg(default_value = "amazon_ids.txt")]
        output_file: PathBuf,
    },
    /// Look up Kindle-edition ASINs for unresolved mapping entries
    Scrape {
        /// Mapping file produced by `extract`
        input_file: PathBuf,
        /// Seconds between catalog requests
        #[arg(long)]
        delay: Option<u64>,
        /// Catalog base URL
        #[arg(long)]
        base_url: Option<String>,
        /// User agent for catalog requests
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Write confirmed ASINs back into the .opf files
    Update {
        /// Mapping file with confirmed identifiers
        mapping_file: PathBuf,
        /// Directory relative entry paths resolve against
        #[arg(long, default_value = ".")]
        root_dir: PathBuf,
    },
    /// Mirror .opf identifiers into the Calibre database
    #[command(name = "update-db", alias = "update_db")]
    UpdateDb {
        /// Path to Calibre's metadata.db
        db_file: PathBuf,
    },
    /// Drop resolved entries so the mapping file can seed a fresh run
    Clean {
        /// Mapping file to prune in place
        input_file: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Extract {
            root_dir,
            output_file,
        } => {
            let report = extract(&root_dir, &output_file)?;
            print_report(&report, cli.json);
        }
        Command::Scrape {
            input_file,
            delay,
            base_url,
            user_agent,
        } => {
            let mut config = LookupConfig::load_default();
            if let Some(delay) = delay {
                config.delay_seconds = delay;
            }
            if let Some(base_url) = base_url {
                config.base_url = base_url;
            }
            if let Some(user_agent) = user_agent {
                config.user_agent = user_agent;
            }

            let mut set = MappingSet::load(&input_file)?;
            let source = AmazonKindleSource::new(&config);
            let mut resolver = Resolver::new(source, StdinPrompt, &config);
            let mut checkpoint = FileCheckpoint::new(&input_file);
            let report = resolver.run(&mut set, &mut checkpoint)?;
            set.save(&input_file)?;
            print_report(&report, cli.json);
        }
        Command::Update {
            mapping_file,
            root_dir,
        } => {
            let set = MappingSet::load(&mapping_file)?;
            let report = apply(&set, &root_dir)?;
            print_report(&report, cli.json);
        }
        Command::UpdateDb { db_file } => {
            let db = CalibreDb::open(&db_file)?;
            // Calibre keeps metadata.db at the library root
            let root = db_file
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."));
            let report = sync(&db, &root)?;
            print_report(&report, cli.json);
        }
        Command::Clean { input_file } => {
            let set = MappingSet::load(&input_file)?;
            let (cleaned, report) = clean(set);
            cleaned.save(&input_file)?;
            print_report(&report, cli.json);
        }
    }
    Ok(())
}

fn print_report<R: Serialize + Display>(report: &R, json: bool) {
    if json {
        match serde_json::to_string_pretty(report) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => warn!(%err, "could not render JSON summary"),
        }
    } else {
        println!("{report}");
    }
}
