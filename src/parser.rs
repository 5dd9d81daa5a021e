//! Parser for thought files.
//!
//! A thought file is plain text split into sections by `# ` headings. The
//! first heading is the title and opens the main content. Later headings
//! named `tags` or `sources` open those sections; any other section is
//! skipped.
//!
//! Tags are written inline as `#word` in the content and sources, or listed
//! comma separated in the tags section (which allows spaces). Links are
//! written inline as `[[target]]`.

use crate::name::Name;
use crate::thought::{Link, Tag, Thought};
use regex::Regex;
use std::sync::OnceLock;

/// The sections a thought file can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Content,
    Tags,
    Sources,
    Ignored,
}

impl Section {
    /// Maps a heading after the title to its section.
    pub fn from_heading(heading: &str) -> Self {
        match heading {
            "content" => Section::Content,
            "tags" => Section::Tags,
            "sources" => Section::Sources,
            _ => Section::Ignored,
        }
    }
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\w+)").expect("valid tag regex"))
}

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[(.*?)\]\]").expect("valid link regex"))
}

/// Returns the heading text if `line` is a heading line.
pub fn heading(line: &str) -> Option<&str> {
    line.strip_prefix("# ").map(str::trim)
}

/// Lines of a thought file sorted into their sections.
#[derive(Debug, Default)]
struct Sections {
    title: Option<String>,
    content: Vec<String>,
    tags: Vec<String>,
    sources: Vec<String>,
}

impl Sections {
    fn lines_mut(&mut self, section: Section) -> Option<&mut Vec<String>> {
        match section {
            Section::Content => Some(&mut self.content),
            Section::Tags => Some(&mut self.tags),
            Section::Sources => Some(&mut self.sources),
            Section::Ignored => None,
        }
    }
}

/// Parses the lines of a thought file into a [`Thought`] called `name`.
///
/// Tags and links are sorted; duplicates are kept.
///
/// # Examples
///
/// ```
/// use thoughtindex::{parser, Name};
///
/// let lines = [
///     "# Cats",
///     "The #cat sat on [[2a]]",
///     "# tags",
///     "pets, four legs",
/// ];
/// let thought = parser::parse(&lines, Name::parse("1"));
/// assert_eq!(thought.title, "Cats");
/// let tags: Vec<&str> = thought.tags.iter().map(|t| t.title.as_str()).collect();
/// assert_eq!(tags, ["cat", "four legs", "pets"]);
/// assert_eq!(thought.links[0].target, "2a");
/// ```
pub fn parse<S: AsRef<str>>(lines: &[S], name: Name) -> Thought {
    let mut sections = Sections::default();
    let mut current: Option<Section> = None;

    for line in lines {
        let line = line.as_ref();
        if let Some(text) = heading(line) {
            if sections.title.is_none() {
                sections.title = Some(text.to_string());
                current = Some(Section::Content);
            } else {
                let section = Section::from_heading(text);
                if section == Section::Ignored {
                    log::warn!("Ignoring unknown heading '{}' in thought {}", text, name);
                }
                current = Some(section);
            }
            continue;
        }

        if let Some(lines) = current.and_then(|s| sections.lines_mut(s)) {
            lines.push(line.to_string());
        }
    }

    let scanned = sections.content.iter().chain(&sections.sources);

    let mut tags: Vec<String> = Vec::new();
    let mut links: Vec<String> = Vec::new();
    for line in scanned {
        tags.extend(tag_regex().captures_iter(line).map(|c| c[1].to_string()));
        links.extend(link_regex().captures_iter(line).map(|c| c[1].to_string()));
    }
    for line in &sections.tags {
        tags.extend(split_tag_line(line));
    }

    tags.sort();
    links.sort();

    Thought {
        tags: tags.into_iter().map(Tag::new).collect(),
        links: links
            .into_iter()
            .map(|target| Link::new(name.clone(), target))
            .collect(),
        name,
        title: sections.title.unwrap_or_default(),
        content: sections.content,
        sources: sections.sources,
    }
}

/// Splits one line of the tags section into tag titles.
fn split_tag_line(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split(',')
        .map(|token| token.trim())
        .map(|token| token.strip_prefix('#').unwrap_or(token).trim())
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Replaces every `[[old]]` link in `lines` with `[[new]]`.
///
/// Returns the number of links rewritten.
pub fn rewrite_links(lines: &mut [String], old: &str, new: &str) -> usize {
    let mut count = 0;
    for line in lines.iter_mut() {
        let rewritten = link_regex().replace_all(line, |caps: &regex::Captures| {
            if &caps[1] == old {
                count += 1;
                format!("[[{}]]", new)
            } else {
                caps[0].to_string()
            }
        });
        if let std::borrow::Cow::Owned(text) = rewritten {
            *line = text;
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(thought: &Thought) -> Vec<String> {
        thought.tags.iter().map(|t| t.title.clone()).collect()
    }

    fn targets(thought: &Thought) -> Vec<String> {
        thought.links.iter().map(|l| l.target.clone()).collect()
    }

    fn test_name() -> Name {
        Name::parse("test")
    }

    #[test]
    fn test_parse_full_file() {
        let lines = [
            "# heading",
            "content 1",
            "content 2",
            "",
            "The #cat jumped",
            "#dog jumped too",
            "as did the #kangaroo",
            "",
            "The cat [[1]] jumped",
            "[[2]] dog jumped too",
            "as did the kangaroo [[3]]",
            "",
            "# tags",
            "tag1, tag1b",
            "tag 2, tag 2b,",
            "tag 3, tag 3b",
            "",
            "# sources",
            "sources 1",
            "sources 2",
            "",
        ];

        let thought = parse(&lines, test_name());
        assert_eq!(thought.title, "heading");
        assert_eq!(thought.content, lines[1..12].to_vec());
        assert_eq!(thought.sources, ["sources 1", "sources 2", ""]);
        assert_eq!(
            titles(&thought),
            ["cat", "dog", "kangaroo", "tag 2", "tag 2b", "tag 3", "tag 3b", "tag1", "tag1b"]
        );
        assert_eq!(targets(&thought), ["1", "2", "3"]);
        assert!(thought.links.iter().all(|l| l.source == test_name()));
    }

    #[test]
    fn test_parse_heading() {
        let empty: [&str; 0] = [];
        let thought = parse(&empty, test_name());
        assert_eq!(thought.title, "");
        assert!(thought.content.is_empty());
        assert!(thought.tags.is_empty());

        let thought = parse(&["# heading"], test_name());
        assert_eq!(thought.title, "heading");
        assert!(thought.content.is_empty());

        let thought = parse(&["# heading 2", "content 1", "content 2", ""], test_name());
        assert_eq!(thought.title, "heading 2");
        assert_eq!(thought.content, ["content 1", "content 2", ""]);
    }

    #[test]
    fn test_first_heading_is_always_title() {
        // a thought may be titled "tags"; its body is still content
        let lines = ["# tags", "tag1, tag1b", "tag 2, tag 2b,"];
        let thought = parse(&lines, test_name());
        assert_eq!(thought.title, "tags");
        assert_eq!(thought.content, ["tag1, tag1b", "tag 2, tag 2b,"]);
        assert!(thought.tags.is_empty());
    }

    #[test]
    fn test_lines_before_first_heading_are_skipped() {
        let lines = ["preamble #hidden [[x]]", "# title", "body"];
        let thought = parse(&lines, test_name());
        assert_eq!(thought.title, "title");
        assert_eq!(thought.content, ["body"]);
        assert!(thought.tags.is_empty());
        assert!(thought.links.is_empty());
    }

    #[test]
    fn test_parse_tags_section() {
        let lines = ["# heading", "# tags", "#first, second ,, third tag", " , "];
        let thought = parse(&lines, test_name());
        assert!(thought.content.is_empty());
        assert_eq!(titles(&thought), ["first", "second", "third tag"]);
        assert!(thought.tags.iter().all(|t| !t.is_saved()));
    }

    #[test]
    fn test_inline_tags_need_a_word() {
        let lines = ["# heading", "a lone # sign", "## subheading", "#ok"];
        let thought = parse(&lines, test_name());
        assert_eq!(titles(&thought), ["ok"]);
    }

    #[test]
    fn test_parse_links() {
        let lines = [
            "# heading",
            "all [[4]] jumping together [[5]]",
            "The cat [[1]] jumped",
            "[[2]] dog jumped too [[2]]",
        ];
        let thought = parse(&lines, test_name());
        assert_eq!(targets(&thought), ["1", "2", "2", "4", "5"]);
    }

    #[test]
    fn test_parse_sources() {
        let lines = ["# heading", "# sources", "#first source", "sources #second [[cats]]]", ""];
        let thought = parse(&lines, test_name());
        assert!(thought.content.is_empty());
        assert_eq!(thought.sources, ["#first source", "sources #second [[cats]]]", ""]);
        assert_eq!(titles(&thought), ["first", "second"]);
        assert_eq!(targets(&thought), ["cats"]);
    }

    #[test]
    fn test_parse_other_headings() {
        let lines = [
            "# heading",
            "content #1",
            "content [[2]]",
            "# sources",
            "sources #2",
            "sources [[cats]]",
            "# other",
            "other #3",
            "other [[dogs]]",
        ];
        let thought = parse(&lines, test_name());
        assert_eq!(thought.content, ["content #1", "content [[2]]"]);
        assert_eq!(titles(&thought), ["1", "2"]);
        assert_eq!(targets(&thought), ["2", "cats"]);
    }

    #[test]
    fn test_content_heading_resumes_content() {
        let lines = ["# heading", "one", "# other", "skip", "# content", "two #more"];
        let thought = parse(&lines, test_name());
        assert_eq!(thought.content, ["one", "two #more"]);
        assert_eq!(titles(&thought), ["more"]);
    }

    #[test]
    fn test_rewrite_links() {
        let mut lines = vec![
            "see [[2]] and [[2a]]".to_string(),
            "nothing here".to_string(),
            "[[2]][[2]]".to_string(),
        ];
        let count = rewrite_links(&mut lines, "2", "5");
        assert_eq!(count, 3);
        assert_eq!(lines, ["see [[5]] and [[2a]]", "nothing here", "[[5]][[5]]"]);
    }
}
