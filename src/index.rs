//! SQLite-backed index of thoughts, tags and links.
//!
//! The index is the single source of truth for listing and filtering. Every
//! mutating call runs in one transaction, so readers never see a thought
//! removed while its tags are still waiting to be purged.
//!
//! Links are stored per source. Removing a thought removes the links it
//! makes but leaves links pointing at it untouched; renaming does not rewrite
//! those inbound links either, it reports who holds them instead.

use crate::name::Name;
use crate::thought::{Link, Tag, Thought};
use crate::{Result, ThoughtError};
use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS thoughts (
    name  TEXT PRIMARY KEY,
    title TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS tags (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL UNIQUE
);
CREATE TABLE IF NOT EXISTS links (
    source TEXT NOT NULL,
    target TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS tag_links (
    thought TEXT NOT NULL,
    tag     INTEGER NOT NULL,
    UNIQUE (thought, tag)
);
CREATE INDEX IF NOT EXISTS links_source ON links (source);
CREATE INDEX IF NOT EXISTS links_target ON links (target);
CREATE INDEX IF NOT EXISTS tag_links_tag ON tag_links (tag);
";

impl ToSql for Name {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Name {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Name::parse)
    }
}

/// Restricts which thoughts a listing returns.
///
/// Each non-empty list is one condition; a thought must match at least one
/// entry of every non-empty list. An empty filter matches everything.
///
/// # Examples
///
/// ```
/// use thoughtindex::{Name, Tag, ThoughtFilter};
///
/// // thoughts tagged "cat" or "dog" that link to "1"
/// let filter = ThoughtFilter::new()
///     .tags([Tag::new("cat"), Tag::new("dog")])
///     .linked_to([Name::parse("1")]);
/// assert!(!filter.is_empty());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ThoughtFilter {
    /// Thoughts with one of these names
    pub names: Vec<Name>,
    /// Thoughts carrying one of these tags
    pub tags: Vec<Tag>,
    /// Thoughts with a link to one of these names
    pub linked_to: Vec<Name>,
}

impl ThoughtFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(mut self, names: impl IntoIterator<Item = Name>) -> Self {
        self.names.extend(names);
        self
    }

    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    pub fn linked_to(mut self, targets: impl IntoIterator<Item = Name>) -> Self {
        self.linked_to.extend(targets);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.tags.is_empty() && self.linked_to.is_empty()
    }

    /// Builds the WHERE clause and its positional parameters.
    fn to_sql(&self) -> (String, Vec<String>) {
        let mut clause = String::from("1 = 1");
        let mut values = Vec::new();

        if !self.names.is_empty() {
            clause.push_str(&format!(
                " AND t.name IN ({})",
                placeholders(self.names.len())
            ));
            values.extend(self.names.iter().map(Name::to_string));
        }
        if !self.tags.is_empty() {
            clause.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM tag_links AS tl JOIN tags AS g ON g.id = tl.tag \
                 WHERE tl.thought = t.name AND g.title IN ({}))",
                placeholders(self.tags.len())
            ));
            values.extend(self.tags.iter().map(|t| t.title.clone()));
        }
        if !self.linked_to.is_empty() {
            clause.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM links AS l \
                 WHERE l.source = t.name AND l.target IN ({}))",
                placeholders(self.linked_to.len())
            ));
            values.extend(self.linked_to.iter().map(Name::to_string));
        }

        (clause, values)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// The persistent store of thoughts.
pub struct ThoughtIndex {
    conn: Connection,
}

impl ThoughtIndex {
    /// Opens the index at `path`, creating the file and schema if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        log::debug!("Opening thought index at {}", path.display());
        Self::with_connection(Connection::open(path)?)
    }

    /// Opens a throwaway index that lives only in memory.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// All tags used by at least one thought, ordered by title.
    pub fn list_tags(&self) -> Result<BTreeSet<Tag>> {
        let mut stmt = self.conn.prepare("SELECT id, title FROM tags")?;
        let tags = stmt
            .query_map([], |row| Ok(Tag::with_id(row.get(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<BTreeSet<_>>>()?;
        Ok(tags)
    }

    /// Names of every stored thought in outline order.
    pub fn list_names(&self) -> Result<Vec<Name>> {
        let mut stmt = self.conn.prepare("SELECT name FROM thoughts")?;
        let mut names = stmt
            .query_map([], |row| row.get::<_, Name>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }

    /// Thoughts matching `filter`, ordered by name.
    ///
    /// The returned thoughts carry their title, tags and links. File content
    /// is not part of the index and is left empty.
    pub fn list_thoughts(&self, filter: &ThoughtFilter) -> Result<Vec<Thought>> {
        let (clause, values) = filter.to_sql();
        let sql = format!("SELECT t.name, t.title FROM thoughts AS t WHERE {}", clause);

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                Ok((row.get::<_, Name>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut thoughts = rows
            .into_iter()
            .map(|(name, title)| self.load_thought(name, title))
            .collect::<Result<Vec<_>>>()?;
        thoughts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(thoughts)
    }

    /// Thoughts matching `filter`, grouped under each of their tags.
    ///
    /// A thought with several tags appears under each of them. When the
    /// filter names tags, only those tags become keys.
    pub fn list_thoughts_by_tag(&self, filter: &ThoughtFilter) -> Result<BTreeMap<Tag, Vec<Thought>>> {
        let mut grouped: BTreeMap<Tag, Vec<Thought>> = BTreeMap::new();

        for thought in self.list_thoughts(filter)? {
            for tag in &thought.tags {
                if filter.tags.is_empty() || filter.tags.contains(tag) {
                    grouped.entry(tag.clone()).or_default().push(thought.clone());
                }
            }
        }

        Ok(grouped)
    }

    /// Looks up a single thought.
    pub fn get(&self, name: &Name) -> Result<Option<Thought>> {
        let title: Option<String> = self
            .conn
            .query_row(
                "SELECT title FROM thoughts WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;

        title
            .map(|title| self.load_thought(name.clone(), title))
            .transpose()
    }

    /// Names of the thoughts holding a link to `target`, in outline order.
    pub fn backlinks(&self, target: &Name) -> Result<Vec<Name>> {
        backlinks(&self.conn, target)
    }

    /// Stores `thought`, replacing any thought with the same name.
    ///
    /// The old title, tags and links are dropped first, then the new ones
    /// are written. Tags no longer used by anything are purged.
    pub fn add_or_update(&mut self, thought: &Thought) -> Result<()> {
        let name = &thought.name;
        let tx = self.conn.transaction()?;

        remove_thought(&tx, name)?;

        tx.execute(
            "INSERT INTO thoughts (name, title) VALUES (?1, ?2)",
            params![name, thought.title],
        )?;

        for tag in &thought.tags {
            tx.execute(
                "INSERT OR IGNORE INTO tags (title) VALUES (?1)",
                params![tag.title],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO tag_links (thought, tag) \
                 SELECT ?1, id FROM tags WHERE title = ?2",
                params![name, tag.title],
            )?;
        }

        for link in &thought.links {
            tx.execute(
                "INSERT INTO links (source, target) VALUES (?1, ?2)",
                params![name, link.target],
            )?;
        }

        let purged = purge_unused_tags(&tx)?;
        tx.commit()?;

        log::debug!(
            "Indexed thought {} ({} tags, {} links, {} tags purged)",
            name,
            thought.tags.len(),
            thought.links.len(),
            purged
        );
        Ok(())
    }

    /// Removes a thought, its outbound links and any tags left unused.
    ///
    /// Deleting a name that is not stored does nothing.
    pub fn delete(&mut self, name: &Name) -> Result<()> {
        let tx = self.conn.transaction()?;
        let removed = remove_thought(&tx, name)?;
        let purged = purge_unused_tags(&tx)?;
        tx.commit()?;

        log::debug!("Deleted thought {} (found: {}, {} tags purged)", name, removed, purged);
        Ok(())
    }

    /// Moves a thought to a new name.
    ///
    /// The thought keeps its title and tags, and its outbound links now start
    /// from `new_name`. Links held by other thoughts still point at
    /// `old_name`; the names of those thoughts are returned so their files
    /// can be updated.
    ///
    /// Fails with [`ThoughtError::ThoughtExists`] if `new_name` is taken, in
    /// which case nothing changes. Renaming a name that is not stored only
    /// reports the thoughts linking to it.
    pub fn rename(&mut self, old_name: &Name, new_name: &Name) -> Result<Vec<Name>> {
        if old_name == new_name {
            return self.backlinks(old_name);
        }

        let tx = self.conn.transaction()?;

        let taken: bool = tx.query_row(
            "SELECT EXISTS (SELECT 1 FROM thoughts WHERE name = ?1)",
            params![new_name],
            |row| row.get(0),
        )?;
        if taken {
            return Err(ThoughtError::ThoughtExists(new_name.clone()));
        }

        tx.execute(
            "UPDATE thoughts SET name = ?2 WHERE name = ?1",
            params![old_name, new_name],
        )?;
        tx.execute(
            "UPDATE links SET source = ?2 WHERE source = ?1",
            params![old_name, new_name],
        )?;
        tx.execute(
            "UPDATE tag_links SET thought = ?2 WHERE thought = ?1",
            params![old_name, new_name],
        )?;

        let needs_updating = backlinks(&tx, old_name)?;
        tx.commit()?;

        log::debug!(
            "Renamed thought {} to {} ({} thoughts still link to the old name)",
            old_name,
            new_name,
            needs_updating.len()
        );
        Ok(needs_updating)
    }

    fn load_thought(&self, name: Name, title: String) -> Result<Thought> {
        let mut tag_stmt = self.conn.prepare_cached(
            "SELECT g.id, g.title FROM tag_links AS tl JOIN tags AS g ON g.id = tl.tag \
             WHERE tl.thought = ?1 ORDER BY g.title",
        )?;
        let tags = tag_stmt
            .query_map(params![name], |row| {
                Ok(Tag::with_id(row.get(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut link_stmt = self
            .conn
            .prepare_cached("SELECT target FROM links WHERE source = ?1 ORDER BY rowid")?;
        let links = link_stmt
            .query_map(params![name], |row| {
                Ok(Link::new(name.clone(), row.get::<_, String>(0)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Thought::new(name, title, tags, links))
    }
}

/// Deletes a thought row with its outbound links and tag associations.
/// Returns whether a thought row existed.
fn remove_thought(conn: &Connection, name: &Name) -> Result<bool> {
    conn.execute("DELETE FROM links WHERE source = ?1", params![name])?;
    conn.execute("DELETE FROM tag_links WHERE thought = ?1", params![name])?;
    let removed = conn.execute("DELETE FROM thoughts WHERE name = ?1", params![name])?;
    Ok(removed > 0)
}

/// Drops every tag no thought refers to in a single sweep.
fn purge_unused_tags(conn: &Connection) -> Result<usize> {
    let purged = conn.execute(
        "DELETE FROM tags WHERE id NOT IN (SELECT tag FROM tag_links)",
        [],
    )?;
    Ok(purged)
}

fn backlinks(conn: &Connection, target: &Name) -> Result<Vec<Name>> {
    let mut stmt = conn.prepare("SELECT DISTINCT source FROM links WHERE target = ?1")?;
    let mut names = stmt
        .query_map(params![target], |row| row.get::<_, Name>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn name(s: &str) -> Name {
        Name::parse(s)
    }

    fn names(list: &[&str]) -> Vec<Name> {
        list.iter().map(|s| name(s)).collect()
    }

    fn tags(list: &[&str]) -> Vec<Tag> {
        list.iter().map(|s| Tag::new(*s)).collect()
    }

    fn summary(thoughts: &[Thought]) -> Vec<(String, String)> {
        thoughts
            .iter()
            .map(|t| (t.name.to_string(), t.title.clone()))
            .collect()
    }

    fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
        list.iter()
            .map(|(n, t)| (n.to_string(), t.to_string()))
            .collect()
    }

    fn tag_titles(index: &ThoughtIndex) -> Vec<String> {
        index
            .list_tags()
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect()
    }

    fn add(index: &mut ThoughtIndex, n: &str, title: &str, tags: &[&str], links: &[&str]) {
        let thought = Thought::from_parts(name(n), title, tags.iter().copied(), links.iter().copied());
        index.add_or_update(&thought).unwrap();
    }

    // links:
    //   1 -> 2 -> 4 -> 1
    //   1 -> 3 -> 4 -> 3
    // tags:
    //   first  -> 1
    //   second -> 2
    //   cat    -> 1, 4
    //   dog    -> 2, 3
    //   mouse  -> 3, 4
    fn populate(index: &mut ThoughtIndex) {
        add(index, "1", "first", &["first", "cat"], &["2", "3"]);
        add(index, "2", "second", &["second", "dog"], &["4"]);
        add(index, "3", "third", &["dog", "mouse"], &["4"]);
        add(index, "4", "forth", &["cat", "mouse"], &["1", "3"]);
    }

    fn create_test_index() -> ThoughtIndex {
        let mut index = ThoughtIndex::open_in_memory().unwrap();
        populate(&mut index);
        index
    }

    fn grouped(map: &BTreeMap<Tag, Vec<Thought>>, tag: &str) -> Vec<(String, String)> {
        summary(&map[&Tag::new(tag)])
    }

    #[test]
    fn test_list_tags() {
        let index = create_test_index();
        let titles = tag_titles(&index);
        assert_eq!(titles, ["cat", "dog", "first", "mouse", "second"]);
        assert!(index.list_tags().unwrap().iter().all(Tag::is_saved));
    }

    #[test]
    fn test_list_thoughts() {
        let index = create_test_index();
        let thoughts = index.list_thoughts(&ThoughtFilter::new()).unwrap();
        assert_eq!(
            summary(&thoughts),
            pairs(&[("1", "first"), ("2", "second"), ("3", "third"), ("4", "forth")])
        );

        let first = &thoughts[0];
        assert_eq!(first.tags, tags(&["cat", "first"]));
        let targets: Vec<&str> = first.links.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, ["2", "3"]);
        assert!(first.links.iter().all(|l| l.source == name("1")));
        assert!(first.content.is_empty());
    }

    #[test]
    fn test_list_thoughts_outline_order() {
        let mut index = ThoughtIndex::open_in_memory().unwrap();
        for n in ["10", "2", "1a", "1", "2a1"] {
            add(&mut index, n, n, &[], &[]);
        }
        let listed: Vec<String> = index
            .list_thoughts(&ThoughtFilter::new())
            .unwrap()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(listed, ["1", "1a", "2", "2a1", "10"]);
        assert_eq!(index.list_names().unwrap(), names(&["1", "1a", "2", "2a1", "10"]));
    }

    #[test]
    fn test_list_thoughts_with_names() {
        let index = create_test_index();
        let filter = ThoughtFilter::new().names(names(&["1", "3"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("1", "first"), ("3", "third")]));
    }

    #[test]
    fn test_list_thoughts_with_tags() {
        let index = create_test_index();
        let filter = ThoughtFilter::new().tags(tags(&["cat", "mouse"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(
            summary(&thoughts),
            pairs(&[("1", "first"), ("3", "third"), ("4", "forth")])
        );
    }

    #[test]
    fn test_list_thoughts_with_links() {
        let index = create_test_index();

        let filter = ThoughtFilter::new().linked_to(names(&["1"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("4", "forth")]));

        let filter = ThoughtFilter::new().linked_to(names(&["4"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("2", "second"), ("3", "third")]));

        let filter = ThoughtFilter::new().linked_to(names(&["1", "4"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(
            summary(&thoughts),
            pairs(&[("2", "second"), ("3", "third"), ("4", "forth")])
        );
    }

    #[test]
    fn test_filters_combine_with_and() {
        let index = create_test_index();
        let filter = ThoughtFilter::new()
            .tags(tags(&["dog", "cat"]))
            .linked_to(names(&["4"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("2", "second"), ("3", "third")]));

        let filter = ThoughtFilter::new()
            .names(names(&["1", "2"]))
            .tags(tags(&["mouse"]));
        assert!(index.list_thoughts(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_filter_values_are_not_interpolated() {
        let index = create_test_index();
        let filter = ThoughtFilter::new().tags(tags(&["cat') OR 1=1 --"]));
        assert!(index.list_thoughts(&filter).unwrap().is_empty());
    }

    #[test]
    fn test_list_thoughts_by_tag() {
        let index = create_test_index();
        let map = index.list_thoughts_by_tag(&ThoughtFilter::new()).unwrap();
        assert_eq!(map.len(), 5);
        assert_eq!(grouped(&map, "first"), pairs(&[("1", "first")]));
        assert_eq!(grouped(&map, "second"), pairs(&[("2", "second")]));
        assert_eq!(grouped(&map, "cat"), pairs(&[("1", "first"), ("4", "forth")]));
        assert_eq!(grouped(&map, "dog"), pairs(&[("2", "second"), ("3", "third")]));
        assert_eq!(grouped(&map, "mouse"), pairs(&[("3", "third"), ("4", "forth")]));
    }

    #[test]
    fn test_list_thoughts_by_tag_with_names() {
        let index = create_test_index();
        let filter = ThoughtFilter::new().names(names(&["1", "3"]));
        let map = index.list_thoughts_by_tag(&filter).unwrap();
        assert_eq!(grouped(&map, "first"), pairs(&[("1", "first")]));
        assert_eq!(grouped(&map, "cat"), pairs(&[("1", "first")]));
        assert_eq!(grouped(&map, "dog"), pairs(&[("3", "third")]));
        assert_eq!(grouped(&map, "mouse"), pairs(&[("3", "third")]));
        assert!(!map.contains_key(&Tag::new("second")));
    }

    #[test]
    fn test_list_thoughts_by_tag_with_tags() {
        let index = create_test_index();
        let filter = ThoughtFilter::new().tags(tags(&["cat", "mouse"]));
        let map = index.list_thoughts_by_tag(&filter).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(grouped(&map, "cat"), pairs(&[("1", "first"), ("4", "forth")]));
        assert_eq!(grouped(&map, "mouse"), pairs(&[("3", "third"), ("4", "forth")]));
    }

    #[test]
    fn test_list_thoughts_by_tag_with_links() {
        let index = create_test_index();

        let filter = ThoughtFilter::new().linked_to(names(&["1"]));
        let map = index.list_thoughts_by_tag(&filter).unwrap();
        assert_eq!(grouped(&map, "cat"), pairs(&[("4", "forth")]));
        assert_eq!(grouped(&map, "mouse"), pairs(&[("4", "forth")]));

        let filter = ThoughtFilter::new().linked_to(names(&["2", "4"]));
        let map = index.list_thoughts_by_tag(&filter).unwrap();
        assert_eq!(grouped(&map, "second"), pairs(&[("2", "second")]));
        assert_eq!(grouped(&map, "cat"), pairs(&[("1", "first")]));
        assert_eq!(grouped(&map, "dog"), pairs(&[("2", "second"), ("3", "third")]));
        assert_eq!(grouped(&map, "mouse"), pairs(&[("3", "third")]));
    }

    #[test]
    fn test_add_or_update_replaces() {
        let mut index = create_test_index();
        add(&mut index, "3", "new title", &["dog", "mouse", "new_tag"], &["2"]);

        let filter = ThoughtFilter::new().names(names(&["3"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("3", "new title")]));
        assert_eq!(thoughts[0].tags, tags(&["dog", "mouse", "new_tag"]));

        assert!(tag_titles(&index).contains(&"new_tag".to_string()));

        let filter = ThoughtFilter::new().linked_to(names(&["2"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("1", "first"), ("3", "new title")]));

        // 3 no longer links to 4
        let filter = ThoughtFilter::new().linked_to(names(&["4"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("2", "second")]));
    }

    #[test]
    fn test_add_or_update_purges_replaced_tags() {
        let mut index = create_test_index();
        add(&mut index, "2", "second", &["dog", "puppy"], &["4"]);

        let titles = tag_titles(&index);
        assert!(!titles.contains(&"second".to_string()));
        assert!(titles.contains(&"puppy".to_string()));
    }

    #[test]
    fn test_add_or_update_reuses_tag_ids() {
        let mut index = create_test_index();
        let before = index.list_tags().unwrap();
        let cat_id = before.get(&Tag::new("cat")).unwrap().id;

        add(&mut index, "5", "fifth", &["cat"], &[]);
        let after = index.list_tags().unwrap();
        assert_eq!(after.get(&Tag::new("cat")).unwrap().id, cat_id);
    }

    #[test]
    fn test_add_or_update_duplicate_tags() {
        let mut index = ThoughtIndex::open_in_memory().unwrap();
        add(&mut index, "1", "twice", &["cat", "cat"], &["2", "2"]);
        let thought = index.get(&name("1")).unwrap().unwrap();
        assert_eq!(thought.tags, tags(&["cat"]));
        assert_eq!(thought.links.len(), 2);
    }

    #[test]
    fn test_delete() {
        let mut index = create_test_index();
        index.delete(&name("2")).unwrap();

        let thoughts = index.list_thoughts(&ThoughtFilter::new()).unwrap();
        assert_eq!(
            summary(&thoughts),
            pairs(&[("1", "first"), ("3", "third"), ("4", "forth")])
        );

        // links out of 2 are gone
        let filter = ThoughtFilter::new().linked_to(names(&["4"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("3", "third")]));

        // links into 2 are kept
        let first = index.get(&name("1")).unwrap().unwrap();
        assert!(first.links_to("2"));
        assert!(first.links_to("3"));

        assert_eq!(tag_titles(&index), ["cat", "dog", "first", "mouse"]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut index = create_test_index();
        index.delete(&name("9")).unwrap();
        assert_eq!(index.list_names().unwrap(), names(&["1", "2", "3", "4"]));
        assert_eq!(tag_titles(&index).len(), 5);
    }

    #[test]
    fn test_rename() {
        let mut index = create_test_index();
        let needs_updating = index.rename(&name("2"), &name("5")).unwrap();

        assert_eq!(needs_updating, names(&["1"]));
        let filter = ThoughtFilter::new().linked_to(names(&["2"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("1", "first")]));

        let thoughts = index.list_thoughts(&ThoughtFilter::new()).unwrap();
        assert_eq!(
            summary(&thoughts),
            pairs(&[("1", "first"), ("3", "third"), ("4", "forth"), ("5", "second")])
        );

        // links out follow the new name
        let filter = ThoughtFilter::new().linked_to(names(&["4"]));
        let thoughts = index.list_thoughts(&filter).unwrap();
        assert_eq!(summary(&thoughts), pairs(&[("3", "third"), ("5", "second")]));

        // links in are not rewritten
        let first = index.get(&name("1")).unwrap().unwrap();
        assert!(first.links_to("2"));
        assert!(first.links_to("3"));

        let renamed = index.get(&name("5")).unwrap().unwrap();
        assert_eq!(renamed.tags, tags(&["dog", "second"]));
        assert!(renamed.links.iter().all(|l| l.source == name("5")));

        assert_eq!(tag_titles(&index), ["cat", "dog", "first", "mouse", "second"]);
    }

    #[test]
    fn test_rename_onto_existing_fails() {
        let mut index = create_test_index();
        let err = index.rename(&name("2"), &name("3")).unwrap_err();
        assert!(matches!(err, ThoughtError::ThoughtExists(ref n) if *n == name("3")));

        let second = index.get(&name("2")).unwrap().unwrap();
        assert_eq!(second.title, "second");
        assert_eq!(index.get(&name("3")).unwrap().unwrap().title, "third");
        assert_eq!(index.list_names().unwrap(), names(&["1", "2", "3", "4"]));
    }

    #[test]
    fn test_rename_reports_self_links() {
        let mut index = ThoughtIndex::open_in_memory().unwrap();
        add(&mut index, "1", "loop", &[], &["1"]);
        add(&mut index, "2", "other", &[], &["1"]);
        let needs_updating = index.rename(&name("1"), &name("1a")).unwrap();
        assert_eq!(needs_updating, names(&["1a", "2"]));
    }

    #[test]
    fn test_rename_missing_only_reports_backlinks() {
        let mut index = create_test_index();
        let needs_updating = index.rename(&name("7"), &name("8")).unwrap();
        assert!(needs_updating.is_empty());
        assert_eq!(index.list_names().unwrap(), names(&["1", "2", "3", "4"]));
    }

    #[test]
    fn test_backlinks() {
        let index = create_test_index();
        assert_eq!(index.backlinks(&name("3")).unwrap(), names(&["1", "4"]));
        assert!(index.backlinks(&name("9")).unwrap().is_empty());
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("thoughts.db");

        {
            let mut index = ThoughtIndex::open(&path).unwrap();
            populate(&mut index);
        }

        let index = ThoughtIndex::open(&path).unwrap();
        let thoughts = index.list_thoughts(&ThoughtFilter::new()).unwrap();
        assert_eq!(
            summary(&thoughts),
            pairs(&[("1", "first"), ("2", "second"), ("3", "third"), ("4", "forth")])
        );
        assert_eq!(tag_titles(&index).len(), 5);
    }
}
