use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::WrapErr;
use flash_export::{DeckExporter, DeckImporter, MemoryCollection, RemoteOutcome, Settings, notifier::{Notification, Notifier, TracingNotifier}, sink::{GitHubStore, RemoteSink}};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "flash-export", version, about = "Export flashcard decks to diffable JSON and back")]
struct Cli {
	/// Collection file to read and update
	#[arg(long, default_value = "collection.json")]
	collection: PathBuf,

	/// Settings file (TOML)
	#[arg(long, default_value = "flash-export.toml")]
	config: PathBuf,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand)]
enum Command {
	/// Export a deck and its subdecks to a directory
	Export {
		#[arg(long)]
		deck:     String,
		#[arg(long, default_value = ".")]
		out:      PathBuf,
		/// Don't copy referenced media files
		#[arg(long)]
		no_media: bool,
		/// Write into the output directory instead of a per-deck subdirectory
		#[arg(long)]
		flat:     bool,
	},
	/// Upload a deck to the configured GitHub repository
	Push {
		#[arg(long)]
		deck:  String,
		/// Overrides the token from the settings file
		#[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
		token: Option<String>,
	},
	/// Import an exported deck directory
	Import {
		#[arg(long)]
		from:     PathBuf,
		#[arg(long)]
		no_media: bool,
	},
	/// Export every configured root deck into the snapshot directory
	Snapshot {
		#[arg(long)]
		out: Option<PathBuf>,
	},
}

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	tracing_subscriber::registry()
		.with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.with(tracing_subscriber::fmt::layer())
		.init();

	let cli = Cli::parse();
	let settings = Settings::load(&cli.config).wrap_err("loading settings")?;
	let mut collection = MemoryCollection::load(&cli.collection)
		.wrap_err_with(|| format!("opening collection {}", cli.collection.display()))?;
	let notifier = TracingNotifier;

	match cli.command {
		Command::Export { deck, out, no_media, flat } => {
			let create_subdirectory = settings.export_create_deck_subdirectory && !flat;
			let mut exporter = DeckExporter::new(&mut collection, &settings);
			let export = exporter.export_to_directory(&deck, &out, !no_media, create_subdirectory)?;

			if let Some(media) = &export.media {
				for failure in &media.failures {
					notifier.notify(&Notification::warning("Media file skipped", failure.to_string()));
				}
			}
			notifier.notify(&Notification::info(
				"Export finished",
				format!("{} notes written to {}", export.note_count, export.deck_directory.display()),
			));
		}

		Command::Push { deck, token } => {
			let github = &settings.github;
			let token = token.unwrap_or_else(|| github.token.clone());
			if github.repository.is_empty() {
				eyre::bail!("no GitHub repository configured in {}", cli.config.display());
			}

			let store = GitHubStore::new(&github.username, token, &github.repository)?;
			let mut sink = RemoteSink::new(store, &github.branch);
			let mut exporter = DeckExporter::new(&mut collection, &settings);

			match exporter.export_to_remote(&deck, &mut sink, settings.export_create_deck_subdirectory)? {
				RemoteOutcome::Uploaded { path, .. } => notifier.notify(&Notification::info(
					"Upload finished",
					format!("{} notes uploaded to {}", exporter.last_exported_count(), path),
				)),
				RemoteOutcome::Warning(warning) => notifier.notify(&warning),
			}
		}

		Command::Import { from, no_media } => {
			let mut importer = DeckImporter::new(&mut collection, &settings);
			let summary = importer.import_from_directory(&from, !no_media)?;
			notifier.notify(&Notification::info(
				"Import finished",
				format!(
					"{} decks, {} notes added, {} notes updated, {} media files",
					summary.decks, summary.notes_added, summary.notes_updated, summary.media_copied
				),
			));
		}

		Command::Snapshot { out } => {
			let root = out.unwrap_or_else(|| settings.snapshot_path.clone());
			let mut exporter = DeckExporter::new(&mut collection, &settings);
			let exports = exporter.export_snapshot(&root, &settings.snapshot_root_decks)?;
			notifier.notify(&Notification::info(
				"Snapshot finished",
				format!("{} decks written to {}", exports.len(), root.display()),
			));
		}
	}

	if !collection.journal().is_empty() {
		collection.persist(&cli.collection)?;
		info!("Recorded {} changes in the collection", collection.journal().len());
	}

	Ok(())
}
