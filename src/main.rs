use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::Command;
use thoughtindex::visualization::{generate_focused_graph, generate_graph_data};
use thoughtindex::{ui, Name, Tag, Thought, ThoughtDir, ThoughtError, ThoughtFilter, ThoughtIndex};

/// Directory under the platform data dir holding the default notes and index
const APP_DIR: &str = "thoughtindex";

/// Default directory name for thought files
const DEFAULT_DIRNAME: &str = "thoughts";

/// Default filename for the index database
const DEFAULT_DB_FILENAME: &str = "thoughts.db";

/// Command-line arguments
#[derive(Parser)]
#[command(author, version, about = "Command-line tool for managing a directory of linked thoughts", long_about = None)]
struct Cli {
    /// Directory holding the thought files
    #[arg(short = 'b', long = "dir", env = "THOUGHTS_DIR", value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Path to the index database
    #[arg(short, long, env = "THOUGHTS_DB", value_name = "FILE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReadBy {
    Name,
    Tag,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReadFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphFormat {
    Dot,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new thought file
    Create {
        /// Name of the thought (defaults to the next free top-level name)
        name: Option<String>,

        /// Create the next free child of this thought instead
        #[arg(long, value_name = "BASE", conflicts_with = "name")]
        child_of: Option<String>,

        /// Overwrite an existing file instead of moving on to the next name
        #[arg(long)]
        force: bool,

        /// Open the new file in $EDITOR and index it afterwards
        #[arg(long)]
        edit: bool,
    },

    /// Read thoughts from the index
    Read {
        /// List thoughts by name or grouped by tag
        #[arg(long, value_enum, default_value_t = ReadBy::Name)]
        by: ReadBy,

        /// Only thoughts with these names
        #[arg(short, long, num_args = 1..)]
        names: Vec<String>,

        /// Only thoughts with one of these tags
        #[arg(short, long, num_args = 1..)]
        tags: Vec<String>,

        /// Only thoughts linking to one of these names
        #[arg(short, long, num_args = 1..)]
        links: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = ReadFormat::Text)]
        format: ReadFormat,
    },

    /// Write a thought directly to the index
    Write {
        /// Name of the thought to write
        name: String,

        /// Title of the thought
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        /// Tag to add to the thought (can be repeated)
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,

        /// Outward link to add to the thought (can be repeated)
        #[arg(short = 'l', long = "link")]
        links: Vec<String>,
    },

    /// Parse thought files into the index
    Parse {
        /// Name of the thought to parse
        #[arg(required_unless_present = "all")]
        name: Option<String>,

        /// Parse every file in the directory
        #[arg(long, conflicts_with = "name")]
        all: bool,
    },

    /// Rename a thought in the index and on disk
    Rename {
        /// Current name of the thought
        #[arg(short, long)]
        from: String,

        /// New name of the thought
        #[arg(short, long)]
        to: String,

        /// Rewrite links in other thoughts to point at the new name
        #[arg(long)]
        update_links: bool,
    },

    /// Delete a thought from the index and disk
    Delete {
        /// Name of the thought to delete
        name: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// List all tags in use
    Tags,

    /// Export the link graph
    Graph {
        /// Format for the export
        #[arg(short, long, value_enum, default_value_t = GraphFormat::Dot)]
        format: GraphFormat,

        /// Focus the graph on a specific thought
        #[arg(long)]
        focus: Option<String>,

        /// Depth limit for a focused graph
        #[arg(long, default_value = "1")]
        depth: usize,

        /// Output file (if not specified, outputs to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let dir_path = match cli.dir {
        Some(path) => path,
        None => app_dir()?.join(DEFAULT_DIRNAME),
    };
    let db_path = match cli.database {
        Some(path) => path,
        None => app_dir()?.join(DEFAULT_DB_FILENAME),
    };
    log::debug!("Using thoughts in {} and index {}", dir_path.display(), db_path.display());

    let dir = ThoughtDir::new(&dir_path)
        .with_context(|| format!("Failed to open thought directory {}", dir_path.display()))?;
    let mut index = ThoughtIndex::open(&db_path)
        .with_context(|| format!("Failed to open index {}", db_path.display()))?;

    match cli.command {
        Commands::Create { name, child_of, force, edit } => {
            create_thought(&dir, &mut index, name, child_of, force, edit)
        }
        Commands::Read { by, names, tags, links, format } => {
            read_thoughts(&index, by, names, tags, links, format)
        }
        Commands::Write { name, title, tags, links } => write_thought(&mut index, &name, &title, tags, links),
        Commands::Parse { name, all } => parse_thoughts(&dir, &mut index, name, all),
        Commands::Rename { from, to, update_links } => {
            rename_thought(&dir, &mut index, &from, &to, update_links)
        }
        Commands::Delete { name, force } => delete_thought(&dir, &mut index, &name, force),
        Commands::Tags => list_tags(&index),
        Commands::Graph { format, focus, depth, output } => {
            export_graph(&dir, &index, format, focus, depth, output)
        }
    }
}

/// Application data directory, used when no explicit paths are given
fn app_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().context("Could not determine data directory for your platform")?;
    Ok(data_dir.join(APP_DIR))
}

/// Create a new thought file, optionally editing and indexing it
fn create_thought(
    dir: &ThoughtDir,
    index: &mut ThoughtIndex,
    name: Option<String>,
    child_of: Option<String>,
    force: bool,
    edit: bool,
) -> Result<()> {
    let requested = match (name, child_of) {
        (Some(name), _) => Name::parse(&name),
        (None, base) => {
            let base = base.map(|b| Name::parse(&b)).unwrap_or_default();
            Name::find_next(&index.list_names()?, &base)
        }
    };

    let created = dir
        .create_new(&requested, force)
        .with_context(|| format!("Failed to create thought file for {}", requested))?;

    if created != requested {
        println!(
            "{} is taken, created thought '{}' instead",
            requested.to_string().yellow(),
            created.to_string().green()
        );
    } else {
        println!("Created thought '{}' successfully", created.to_string().green());
    }
    let path = dir.path_for(&created)?;
    println!("  {}", path.display().to_string().dimmed());

    if edit {
        if !io::stdin().is_terminal() {
            return Err(anyhow!("--edit requires an interactive terminal"));
        }
        edit_in_external_editor(&path)?;
        let thought = dir.read(&created)?;
        index
            .add_or_update(&thought)
            .with_context(|| format!("Failed to index thought {}", created))?;
        println!("Indexed thought '{}'", created.to_string().green());
    }

    Ok(())
}

/// Read thoughts from the index, filtered and formatted
fn read_thoughts(
    index: &ThoughtIndex,
    by: ReadBy,
    names: Vec<String>,
    tags: Vec<String>,
    links: Vec<String>,
    format: ReadFormat,
) -> Result<()> {
    let filter = ThoughtFilter::new()
        .names(names.iter().map(|n| Name::parse(n)))
        .tags(tags.into_iter().map(Tag::new))
        .linked_to(links.iter().map(|l| Name::parse(l)));

    match (by, format) {
        (ReadBy::Name, ReadFormat::Text) => {
            ui::display_thought_list(&index.list_thoughts(&filter)?);
        }
        (ReadBy::Name, ReadFormat::Json) => {
            let thoughts = index.list_thoughts(&filter)?;
            println!("{}", serde_json::to_string_pretty(&thoughts)?);
        }
        (ReadBy::Tag, ReadFormat::Text) => {
            ui::display_tag_groups(&index.list_thoughts_by_tag(&filter)?);
        }
        (ReadBy::Tag, ReadFormat::Json) => {
            let grouped: BTreeMap<String, Vec<Thought>> = index
                .list_thoughts_by_tag(&filter)?
                .into_iter()
                .map(|(tag, thoughts)| (tag.title, thoughts))
                .collect();
            println!("{}", serde_json::to_string_pretty(&grouped)?);
        }
    }

    Ok(())
}

/// Write a thought straight into the index
fn write_thought(
    index: &mut ThoughtIndex,
    name: &str,
    title: &[String],
    tags: Vec<String>,
    links: Vec<String>,
) -> Result<()> {
    let name = Name::parse(name);
    let thought = Thought::from_parts(name.clone(), title.join(" "), tags, links);
    index
        .add_or_update(&thought)
        .with_context(|| format!("Failed to write thought {}", name))?;

    println!("Wrote thought '{}' to the index", name.to_string().green());
    Ok(())
}

/// Parse one or all thought files into the index
fn parse_thoughts(dir: &ThoughtDir, index: &mut ThoughtIndex, name: Option<String>, all: bool) -> Result<()> {
    if !all {
        let name = name.map(|n| Name::parse(&n)).ok_or_else(|| anyhow!("Give a name or --all"))?;
        let thought = dir.read(&name).with_context(|| format!("Failed to read thought {}", name))?;
        index.add_or_update(&thought)?;
        println!("Parsed thought '{}'", name.to_string().green());
        return Ok(());
    }

    let names = dir.list_names()?;
    let count = names.len();
    ui::with_loading_progress(&format!("Parsing {} thoughts...", count), || -> Result<()> {
        for name in &names {
            let thought = dir.read(name).with_context(|| format!("Failed to read thought {}", name))?;
            index.add_or_update(&thought)?;
        }
        Ok(())
    })?;

    println!("Parsed {} thoughts", count.to_string().green());
    Ok(())
}

/// Rename a thought in the index, then on disk
fn rename_thought(
    dir: &ThoughtDir,
    index: &mut ThoughtIndex,
    from: &str,
    to: &str,
    update_links: bool,
) -> Result<()> {
    let from = Name::parse(from);
    let to = Name::parse(to);

    let stale = dir
        .rename_synced(index, &from, &to)
        .with_context(|| format!("Failed to rename {} to {}", from, to))?;

    println!(
        "Renamed thought '{}' to '{}'",
        from.to_string().green(),
        to.to_string().green()
    );

    if !update_links {
        ui::display_stale_links(&from, &stale);
        return Ok(());
    }

    for name in &stale {
        if let Some(thought) = dir
            .rewrite_links(name, &from, &to)
            .with_context(|| format!("Failed to rewrite links in {}", name))?
        {
            index.add_or_update(&thought)?;
            println!("  Updated links in {}", name.to_string().blue());
        }
    }

    Ok(())
}

/// Delete a thought from the index, then from disk
fn delete_thought(dir: &ThoughtDir, index: &mut ThoughtIndex, name: &str, force: bool) -> Result<()> {
    let name = Name::parse(name);

    if index.get(&name)?.is_none() && !dir.exists(&name) {
        return Err(ThoughtError::ThoughtNotFound(name).into());
    }

    // Confirm deletion if not forced
    if !force {
        if io::stdin().is_terminal() {
            let prompt = format!("Are you sure you want to delete thought '{}'?", name);
            if !ui::confirm(&prompt, false)? {
                println!("Deletion cancelled");
                return Ok(());
            }
        } else {
            return Err(anyhow!("Deletion requires --force flag in non-interactive mode"));
        }
    }

    dir.delete_synced(index, &name)
        .with_context(|| format!("Failed to delete {}", name))?;

    println!("Thought '{}' deleted successfully", name.to_string().green());
    Ok(())
}

/// List all tags with their usage counts
fn list_tags(index: &ThoughtIndex) -> Result<()> {
    let grouped = index.list_thoughts_by_tag(&ThoughtFilter::new())?;
    let counts: Vec<(Tag, usize)> = index
        .list_tags()?
        .into_iter()
        .map(|tag| {
            let count = grouped.get(&tag).map_or(0, Vec::len);
            (tag, count)
        })
        .collect();

    ui::display_tags(&counts);
    Ok(())
}

/// Export the link graph
fn export_graph(
    dir: &ThoughtDir,
    index: &ThoughtIndex,
    format: GraphFormat,
    focus: Option<String>,
    depth: usize,
    output: Option<PathBuf>,
) -> Result<()> {
    if let (None, GraphFormat::Dot, Some(path)) = (&focus, format, &output) {
        dir.write_dot_graph(index, path)?;
        println!("Graph saved to {}", path.display());
        return Ok(());
    }

    let graph_data = match focus {
        Some(focus) => {
            let center = Name::parse(&focus);
            if index.get(&center)?.is_none() {
                return Err(ThoughtError::ThoughtNotFound(center).into());
            }
            generate_focused_graph(index, &center, depth)?
        }
        None => generate_graph_data(index)?,
    };

    let output_text = match format {
        GraphFormat::Dot => graph_data.to_dot(),
        GraphFormat::Json => graph_data.to_json()?,
    };

    if let Some(output_path) = output {
        fs::write(&output_path, output_text)?;
        println!("Graph saved to {}", output_path.display());
    } else {
        println!("{}", output_text);
    }

    Ok(())
}

/// Open a file in the user's editor and wait for it to close
fn edit_in_external_editor(path: &Path) -> thoughtindex::Result<()> {
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

    let status = Command::new(&editor)
        .arg(path)
        .status()
        .map_err(|e| ThoughtError::EditorError(format!("Failed to open editor {}: {}", editor, e)))?;

    if !status.success() {
        return Err(ThoughtError::EditorError(format!(
            "{} exited with {}",
            editor, status
        )));
    }

    Ok(())
}
