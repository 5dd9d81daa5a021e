//! User interface utilities for the `thoughts` command
//!
//! This module provides the terminal rendering used by the command-line
//! interface: tables of thoughts and tags, confirmation prompts, and a
//! spinner for long-running operations.

use anyhow::Result;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::{Name, Tag, Thought};

const NAME_WIDTH: usize = 12;
const TITLE_WIDTH: usize = 40;

/// Format a string with the given width for display
pub fn format_column(text: &str, width: usize) -> String {
    format!("{:<width$}", text, width = width)
}

/// UI Theme to use consistently throughout the application
pub fn get_theme() -> ColorfulTheme {
    ColorfulTheme::default()
}

/// Display a spinner while running an operation
pub fn with_loading_progress<F, T>(message: &str, operation: F) -> T
where
    F: FnOnce() -> T,
{
    let pb = ProgressBar::new_spinner();
    let spinner = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(spinner);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));

    let result = operation();

    pb.finish_with_message(format!("{} Done!", message));
    result
}

/// Confirmation dialog with enhanced styling
pub fn confirm(message: &str, default: bool) -> Result<bool> {
    Ok(Confirm::with_theme(&get_theme())
        .with_prompt(message)
        .default(default)
        .interact()?)
}

/// Title shown for a thought, falling back for untitled ones.
pub fn display_title(thought: &Thought) -> &str {
    if thought.title.is_empty() {
        "(Untitled)"
    } else {
        &thought.title
    }
}

/// Space separated `#tag` list.
pub fn tag_line(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| format!("#{}", t.title))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Space separated `[[link]]` list.
pub fn link_line(thought: &Thought) -> String {
    thought
        .links
        .iter()
        .map(|l| format!("[[{}]]", l.target))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display a list of thoughts as a table
pub fn display_thought_list(thoughts: &[Thought]) {
    if thoughts.is_empty() {
        println!("{}", style("No thoughts found").italic());
        return;
    }

    println!(
        "{} {}",
        style(format_column("NAME", NAME_WIDTH)).bold().underlined(),
        style(format_column("TITLE", TITLE_WIDTH)).bold().underlined()
    );

    for thought in thoughts {
        display_thought_row(thought);
    }
}

fn display_thought_row(thought: &Thought) {
    println!(
        "{} {}",
        style(format_column(&thought.name.to_string(), NAME_WIDTH)).blue(),
        display_title(thought)
    );
    if !thought.tags.is_empty() {
        println!("  {}", style(tag_line(&thought.tags)).yellow());
    }
    if !thought.links.is_empty() {
        println!("  {}", style(link_line(thought)).dim());
    }
}

/// Display thoughts grouped under their tags
pub fn display_tag_groups(groups: &BTreeMap<Tag, Vec<Thought>>) {
    if groups.is_empty() {
        println!("{}", style("No thoughts found").italic());
        return;
    }

    for (tag, thoughts) in groups {
        println!("{}", style(format!("#{}", tag.title)).bold().yellow());
        for thought in thoughts {
            println!(
                "  {} {}",
                style(format_column(&thought.name.to_string(), NAME_WIDTH)).blue(),
                display_title(thought)
            );
        }
        println!();
    }
}

/// Display tags with the number of thoughts carrying each
pub fn display_tags(counts: &[(Tag, usize)]) {
    if counts.is_empty() {
        println!("{}", style("No tags found").italic());
        return;
    }

    println!(
        "{} {}",
        style(format_column("TAG", 30)).bold().underlined(),
        style(format_column("COUNT", 10)).bold().underlined()
    );
    for (tag, count) in counts {
        println!(
            "{} {}",
            style(format_column(&format!("#{}", tag.title), 30)).yellow(),
            count
        );
    }
}

/// Display the names of thoughts that still link to an old name
pub fn display_stale_links(old: &Name, names: &[Name]) {
    if names.is_empty() {
        return;
    }
    println!("{}", style(format!("Still linking to [[{}]]:", old)).bold());
    for name in names {
        println!("  ← {}", style(name).blue());
    }
}
