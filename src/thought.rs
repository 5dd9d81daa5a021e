//! Thoughts and the tags and links they carry.

use crate::name::Name;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Id carried by a tag that has not been stored in an index yet.
pub const UNSAVED_TAG_ID: i64 = -1;

/// A label attached to thoughts.
///
/// The title is the identity of a tag. The numeric id is assigned by the
/// index and is ignored by equality, hashing and ordering, so a freshly
/// parsed tag and a stored tag with the same title are interchangeable.
///
/// # Examples
///
/// ```
/// use thoughtindex::Tag;
///
/// let parsed = Tag::new("rust");
/// let stored = Tag::with_id(7, "rust");
/// assert_eq!(parsed, stored);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tag {
    /// Row id in the index, or [`UNSAVED_TAG_ID`]
    pub id: i64,
    /// The label itself
    pub title: String,
}

impl Tag {
    /// Creates a tag that has not been stored yet.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(UNSAVED_TAG_ID, title)
    }

    /// Creates a tag carrying an id assigned by the index.
    pub fn with_id(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    /// True once the index has assigned this tag an id.
    pub fn is_saved(&self) -> bool {
        self.id != UNSAVED_TAG_ID
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.title.cmp(&other.title)
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A directed link from one thought to something it mentions.
///
/// The target is kept as raw text because links may point at thoughts that
/// do not exist yet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// The thought containing the link
    pub source: Name,
    /// What the link points at
    pub target: String,
}

impl Link {
    pub fn new(source: Name, target: impl Into<String>) -> Self {
        Self {
            source,
            target: target.into(),
        }
    }

    /// The target read as a name.
    pub fn target_name(&self) -> Name {
        Name::parse(&self.target)
    }
}

/// A single note.
///
/// `content` and `sources` hold the raw lines of the note file. They are
/// filled in when a thought is read from disk and left empty when it comes
/// out of the index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thought {
    /// Hierarchical name of the thought
    pub name: Name,
    /// Title taken from the first heading
    pub title: String,
    /// Tags, sorted by title
    pub tags: Vec<Tag>,
    /// Outbound links, all sourced from `name`
    pub links: Vec<Link>,
    /// Lines of the main section
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<String>,
    /// Lines of the sources section
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl Thought {
    /// Creates a thought without any file content.
    pub fn new(name: Name, title: impl Into<String>, tags: Vec<Tag>, links: Vec<Link>) -> Self {
        Self {
            name,
            title: title.into(),
            tags,
            links,
            content: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Builds a thought from plain tag titles and link targets.
    ///
    /// ```
    /// use thoughtindex::{Name, Thought};
    ///
    /// let thought = Thought::from_parts(Name::parse("1"), "first", ["cat"], ["2", "3"]);
    /// assert_eq!(thought.tags[0].title, "cat");
    /// assert_eq!(thought.links[1].source, Name::parse("1"));
    /// ```
    pub fn from_parts<T, L>(
        name: Name,
        title: impl Into<String>,
        tags: impl IntoIterator<Item = T>,
        links: impl IntoIterator<Item = L>,
    ) -> Self
    where
        T: Into<String>,
        L: Into<String>,
    {
        let tags = tags.into_iter().map(Tag::new).collect();
        let links = links
            .into_iter()
            .map(|target| Link::new(name.clone(), target))
            .collect();
        Self::new(name, title, tags, links)
    }

    /// True if one of the tags has the given title.
    pub fn has_tag(&self, title: &str) -> bool {
        self.tags.iter().any(|t| t.title == title)
    }

    /// True if one of the outbound links points at `target`.
    pub fn links_to(&self, target: &str) -> bool {
        self.links.iter().any(|l| l.target == target)
    }
}
