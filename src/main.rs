use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use art_catalog::utils::config::get_catalog_paths;
use art_catalog::{Artwork, Catalog, CatalogConfig, RenameChoice, SaveDecision, SaveRequest, Selection};

#[derive(Parser, Debug)]
#[command(author, version, about = "Catalog, tag and search local artwork", long_about = None)]
struct Args {
    /// Catalog database file
    #[arg(long, requires = "images")]
    db: Option<PathBuf>,

    /// Directory holding full-size images and thumbnails
    #[arg(long, requires = "db")]
    images: Option<PathBuf>,

    /// Env file consulted when --db/--images are not given
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List artworks matching every term (all artworks when no terms are given)
    Search {
        terms: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show a single artwork
    Show { id: i64 },
    /// Save an image file as an artwork
    Save {
        file: PathBuf,
        #[arg(short, long)]
        name: String,
        #[arg(short, long, default_value = "")]
        artist: String,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        /// Id of the artwork currently being edited
        #[arg(long)]
        selected: Option<i64>,
        /// What to do when the selected artwork is saved under a new name
        #[arg(long, value_enum)]
        on_rename: Option<OnRename>,
    },
    /// Replace the image of an artwork, keeping its metadata
    Replace { id: i64, file: PathBuf },
    /// Import every PNG/JPEG/BMP/GIF file in a folder
    Import { folder: PathBuf },
    /// Delete an artwork and its files
    Delete { id: i64 },
    #[command(subcommand)]
    Tags(TagCommand),
    /// Delete every artwork, tag and image file
    Wipe {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum TagCommand {
    List,
    Add { name: String },
    Rename { old: String, new: String },
    Delete { name: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum OnRename {
    Rename,
    New,
    Cancel,
}

impl From<OnRename> for RenameChoice {
    fn from(value: OnRename) -> Self {
        match value {
            OnRename::Rename => RenameChoice::Rename,
            OnRename::New => RenameChoice::SaveAsNew,
            OnRename::Cancel => RenameChoice::Cancel,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = match (args.db, args.images) {
        (Some(db_path), Some(image_dir)) => CatalogConfig { db_path, image_dir },
        _ => get_catalog_paths(&args.env_file)?,
    };
    info!("DB: {:?}", config.db_path);
    info!("Images: {:?}", config.image_dir);

    let mut catalog = Catalog::open(config).context("Failed to open catalog")?;

    match args.command {
        Command::Search { terms, json } => {
            let found = catalog.search(&terms.join(" "))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else {
                for artwork in &found {
                    print_row(artwork);
                }
            }
        }
        Command::Show { id } => {
            let artwork = catalog.get_artwork(id)?;
            println!("{}", serde_json::to_string_pretty(&artwork)?);
        }
        Command::Save {
            file,
            name,
            artist,
            tags,
            selected,
            on_rename,
        } => {
            let selection = match selected {
                Some(id) => Some(Selection {
                    id,
                    name: catalog.get_artwork(id)?.name,
                }),
                None => None,
            };
            let decision = catalog.decide_save(selection.as_ref(), &name)?;
            let choice: RenameChoice = match (&decision, on_rename) {
                (SaveDecision::NeedsConfirmation { current_name, candidate_name, .. }, None) => bail!(
                    "Artwork '{}' would be saved as '{}'; pass --on-rename rename|new|cancel",
                    current_name,
                    candidate_name
                ),
                (_, Some(choice)) => choice.into(),
                (_, None) => RenameChoice::Cancel,
            };
            let Some(intent) = decision.resolve(choice) else {
                println!("Cancelled.");
                return Ok(());
            };

            let request = SaveRequest {
                image: read_image(&file)?,
                name,
                artist,
                tags: tags.into_iter().collect(),
                intent,
            };
            let saved = catalog.save_artwork(request).wait()?;
            println!("Saved artwork {} at {}", saved.id, saved.path.display());
        }
        Command::Replace { id, file } => {
            let saved = catalog.replace_image(id, read_image(&file)?)?.wait()?;
            println!("Replaced image of artwork {} ({})", saved.id, saved.path.display());
        }
        Command::Import { folder } => {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                    .map_err(|e| anyhow!("Bad progress template: {}", e))?,
            );
            let outcome = catalog.import_folder(folder).wait_with_progress(|p| {
                bar.set_length(p.total as u64);
                bar.set_position((p.current - 1) as u64);
                bar.set_message(p.item.clone());
            });
            bar.finish_and_clear();

            let report = outcome?;
            println!("Imported {} artwork(s).", report.imported.len());
            if let Some(summary) = report.duplicates_summary() {
                println!("{}", summary);
            }
        }
        Command::Delete { id } => {
            catalog.delete_artwork(id)?;
            println!("Deleted artwork {}", id);
        }
        Command::Tags(cmd) => match cmd {
            TagCommand::List => {
                for tag in catalog.list_tags()? {
                    println!("{}", tag);
                }
            }
            TagCommand::Add { name } => catalog.add_tag(&name)?,
            TagCommand::Rename { old, new } => catalog.rename_tag(&old, &new)?,
            TagCommand::Delete { name } => catalog.delete_tag(&name)?,
        },
        Command::Wipe { yes } => {
            if !yes {
                bail!("Refusing to wipe the catalog without --yes");
            }
            catalog.wipe_all()?;
            println!("Catalog wiped.");
        }
    }

    Ok(())
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read image {:?}", path))
}

fn print_row(artwork: &Artwork) {
    println!(
        "{:>5}  {:<30}  {:<20}  {}",
        artwork.id, artwork.name, artwork.artist, artwork.tags
    );
}
