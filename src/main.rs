// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! annotrack - track store tooling for video annotation projects.
//!
//! Loads a project file, runs one store operation and prints or saves
//! the result.

use annotrack::config::AppConfig;
use annotrack::io::serialization;
use annotrack::views::event_chart::event_chart_data;
use annotrack::views::filters::enabled_tracks;
use annotrack::{Frame, PendingChangeLog, TrackId, TrackStore};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Parser)]
#[command(name = "annotrack", version, about = "Track store tooling for video annotation")]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the event chart of a project as JSON
    Chart {
        /// Project file (.json, .yaml)
        project: PathBuf,

        /// Selected track id
        #[arg(long)]
        selected: Option<TrackId>,

        /// Only enable these types (defaults to all)
        #[arg(long = "type")]
        types: Vec<String>,
    },

    /// List tracks active at a frame, or overlapping [FRAME, END]
    Query {
        project: PathBuf,
        frame: Frame,
        end: Option<Frame>,
    },

    /// Add a single-frame track and save the project
    Add {
        project: PathBuf,
        frame: Frame,

        /// Track type (defaults to config default_type)
        #[arg(long)]
        label: Option<String>,

        /// Place the new track right after this id
        #[arg(long)]
        after: Option<TrackId>,

        /// Output file (defaults to overwriting the project)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove tracks whose best confidence is below a threshold
    Prune {
        project: PathBuf,

        /// Threshold (defaults to config confidence_threshold)
        #[arg(long)]
        threshold: Option<f64>,

        /// Output file (defaults to overwriting the project)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn open_store(path: &Path) -> Result<(TrackStore, Rc<RefCell<PendingChangeLog>>, String)> {
    let project = serialization::load(path)
        .with_context(|| format!("Failed to load project {}", path.display()))?;
    let ledger = Rc::new(RefCell::new(PendingChangeLog::new()));
    let store = TrackStore::new(Rc::clone(&ledger));
    store
        .load_project(&project)
        .with_context(|| format!("Inconsistent tracks in {}", path.display()))?;
    Ok((store, ledger, project.media_file))
}

fn write_store(store: &TrackStore, media_file: String, path: &Path) -> Result<()> {
    let project = store.to_project(media_file)?;
    serialization::save(&project, path)
        .with_context(|| format!("Failed to save project {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = AppConfig::load(cli.config.as_deref());

    match cli.command {
        Commands::Chart {
            project,
            selected,
            types,
        } => {
            let (store, _, _) = open_store(&project)?;
            let mut filter = config.track_filter();
            if !types.is_empty() {
                filter = filter.with_checked_types(types);
            }
            let enabled = enabled_tracks(&store.sorted_tracks()?, &filter);
            let chart = event_chart_data(&enabled, selected, &config.type_colors());
            println!("{}", serde_json::to_string_pretty(&chart)?);
        }
        Commands::Query {
            project,
            frame,
            end,
        } => {
            let (store, _, _) = open_store(&project)?;
            let ids = store.tracks_in_range(frame, end.unwrap_or(frame));
            for id in ids {
                let track = store.get_track(id)?;
                let track = track.borrow();
                let label = track.get_type(0).map_or("-", |(label, _)| label);
                println!("{}\t[{}, {}]\t{}", id, track.begin(), track.end(), label);
            }
        }
        Commands::Add {
            project,
            frame,
            label,
            after,
            output,
        } => {
            let (store, ledger, media_file) = open_store(&project)?;
            let label = label.unwrap_or_else(|| config.default_type.clone());
            let track = store.add_track(frame, &label, after)?;
            println!("Added track {}", track.borrow().track_id());
            log::info!("{} pending changes", ledger.borrow().pending_save_count());
            write_store(&store, media_file, output.as_deref().unwrap_or(&project))?;
        }
        Commands::Prune {
            project,
            threshold,
            output,
        } => {
            let (store, ledger, media_file) = open_store(&project)?;
            let threshold = threshold.unwrap_or(config.confidence_threshold);
            let removed = store.remove_tracks_below_confidence(threshold)?;
            let payload = ledger.borrow().save_payload();
            println!(
                "Removed {} of {} tracks: {:?}",
                payload.delete.len(),
                removed.len() + store.len(),
                payload.delete
            );
            write_store(&store, media_file, output.as_deref().unwrap_or(&project))?;
        }
    }

    Ok(())
}
