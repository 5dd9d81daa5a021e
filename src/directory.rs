//! File storage for thoughts.
//!
//! Every thought lives in its own `<name>.tb` file inside one directory. The
//! plain file operations only move files around. [`ThoughtDir::rename_synced`]
//! and [`ThoughtDir::delete_synced`] keep a [`ThoughtIndex`] in step as well,
//! writing the index first and the file second.

use crate::index::ThoughtIndex;
use crate::name::Name;
use crate::parser;
use crate::thought::Thought;
use crate::visualization::generate_graph_data;
use crate::{Result, ThoughtError};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Extension of thought files.
pub const FILE_EXTENSION: &str = "tb";

/// Skeleton written into newly created thought files.
pub const NEW_THOUGHT_TEMPLATE: &str = "# \n\n\n# sources\n\n# tags\n";

/// A directory of thought files.
#[derive(Clone, Debug)]
pub struct ThoughtDir {
    root: PathBuf,
}

impl ThoughtDir {
    /// Uses `root` as the thought directory, creating it if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `name`.
    ///
    /// Fails with [`ThoughtError::InvalidName`] for names that are empty or
    /// contain a path separator, since their file would not sit directly in
    /// the directory.
    pub fn path_for(&self, name: &Name) -> Result<PathBuf> {
        let stem = name.to_string();
        if stem.is_empty() || stem.contains(['/', '\\', '\0']) {
            return Err(ThoughtError::InvalidName(name.clone()));
        }
        Ok(self.root.join(format!("{}.{}", stem, FILE_EXTENSION)))
    }

    /// Name of the thought stored at `path`.
    pub fn name_for(&self, path: &Path) -> Result<Name> {
        let is_thought = path
            .extension()
            .is_some_and(|ext| ext == FILE_EXTENSION);
        match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) if is_thought => Ok(Name::parse(stem)),
            _ => Err(ThoughtError::InvalidPath(path.to_path_buf())),
        }
    }

    /// True if `name` is a valid file name and its file exists.
    pub fn exists(&self, name: &Name) -> bool {
        self.path_for(name).is_ok_and(|path| path.is_file())
    }

    /// Names of all thought files in the directory, in outline order.
    pub fn list_names(&self) -> Result<Vec<Name>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Ok(name) = self.name_for(&path) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Creates a new thought file from the template.
    ///
    /// If `name` is taken, the following names (`name.next()`, ...) are
    /// tried until a free one is found, unless `force_override` is set, in
    /// which case the existing file is replaced. Returns the name used.
    pub fn create_new(&self, name: &Name, force_override: bool) -> Result<Name> {
        let mut name = name.clone();
        self.path_for(&name)?;
        if !force_override {
            while self.exists(&name) {
                name = name.next();
            }
        }

        let lines: Vec<&str> = NEW_THOUGHT_TEMPLATE.lines().collect();
        if force_override {
            self.write_lines(&name, &lines)?;
        } else {
            self.write_new(&name, &lines)?;
        }

        log::debug!("Created thought file {}", self.path_for(&name)?.display());
        Ok(name)
    }

    /// Raw lines of the file holding `name`.
    pub fn read_lines(&self, name: &Name) -> Result<Vec<String>> {
        let text = fs::read_to_string(self.path_for(name)?)
            .map_err(|e| self.missing_as_not_found(e, name))?;
        Ok(text.lines().map(str::to_string).collect())
    }

    /// Reads and parses the thought called `name`.
    pub fn read(&self, name: &Name) -> Result<Thought> {
        let lines = self.read_lines(name)?;
        Ok(parser::parse(&lines, name.clone()))
    }

    /// Replaces the content of `name`'s file, creating it if needed.
    pub fn write_lines<S: AsRef<str>>(&self, name: &Name, lines: &[S]) -> Result<()> {
        let path = self.path_for(name)?;
        let file = self.staged(lines)?;
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Writes a file for `name`, failing if one appeared in the meantime.
    fn write_new<S: AsRef<str>>(&self, name: &Name, lines: &[S]) -> Result<()> {
        let path = self.path_for(name)?;
        let file = self.staged(lines)?;
        file.persist_noclobber(path).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                ThoughtError::ThoughtExists(name.clone())
            } else {
                e.error.into()
            }
        })?;
        Ok(())
    }

    /// Writes `lines` to a temporary file in the thought directory.
    fn staged<S: AsRef<str>>(&self, lines: &[S]) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new_in(&self.root)?;
        for line in lines {
            writeln!(file, "{}", line.as_ref())?;
        }
        file.flush()?;
        Ok(file)
    }

    /// Moves the file of `src` to `to`.
    ///
    /// Fails with [`ThoughtError::ThoughtNotFound`] if `src` has no file and
    /// with [`ThoughtError::ThoughtExists`] if `to` already has one.
    pub fn rename(&self, src: &Name, to: &Name) -> Result<()> {
        self.check_rename(src, to)?;
        fs::rename(self.path_for(src)?, self.path_for(to)?)?;
        log::debug!("Renamed thought file {} to {}", src, to);
        Ok(())
    }

    fn check_rename(&self, src: &Name, to: &Name) -> Result<()> {
        self.path_for(src)?;
        self.path_for(to)?;
        if !self.exists(src) {
            return Err(ThoughtError::ThoughtNotFound(src.clone()));
        }
        if self.exists(to) {
            return Err(ThoughtError::ThoughtExists(to.clone()));
        }
        Ok(())
    }

    /// Removes the file of `name`.
    pub fn delete(&self, name: &Name) -> Result<()> {
        fs::remove_file(self.path_for(name)?).map_err(|e| self.missing_as_not_found(e, name))?;
        log::debug!("Deleted thought file {}", name);
        Ok(())
    }

    /// Renames a thought in `index` and then its file.
    ///
    /// The file side is checked up front, so a missing source file or an
    /// occupied target fails before the index is touched. A name taken in the
    /// index fails inside the index transaction, which also changes nothing.
    /// Only a file error after the index has committed comes back as
    /// [`ThoughtError::FileOutOfSync`].
    ///
    /// Returns the thoughts that still link to `src`.
    pub fn rename_synced(&self, index: &mut ThoughtIndex, src: &Name, to: &Name) -> Result<Vec<Name>> {
        self.check_rename(src, to)?;
        let stale = index.rename(src, to)?;
        self.rename(src, to).map_err(|e| ThoughtError::FileOutOfSync {
            name: src.clone(),
            source: Box::new(e),
        })?;
        Ok(stale)
    }

    /// Deletes a thought from `index` and then its file.
    ///
    /// Fails with [`ThoughtError::ThoughtNotFound`] when neither side knows
    /// `name`. A thought that is indexed but has no file is still removed
    /// from the index. A file error after the index has committed comes back
    /// as [`ThoughtError::FileOutOfSync`].
    pub fn delete_synced(&self, index: &mut ThoughtIndex, name: &Name) -> Result<()> {
        self.path_for(name)?;
        let has_file = self.exists(name);
        if !has_file && index.get(name)?.is_none() {
            return Err(ThoughtError::ThoughtNotFound(name.clone()));
        }

        index.delete(name)?;
        if !has_file {
            log::warn!("Thought {} had no file on disk", name);
            return Ok(());
        }
        self.delete(name).map_err(|e| ThoughtError::FileOutOfSync {
            name: name.clone(),
            source: Box::new(e),
        })
    }

    /// Rewrites `[[old]]` links in the file of `name` to `[[new]]`.
    ///
    /// Returns the re-parsed thought when anything changed.
    pub fn rewrite_links(&self, name: &Name, old: &Name, new: &Name) -> Result<Option<Thought>> {
        let mut lines = self.read_lines(name)?;
        let count = parser::rewrite_links(&mut lines, &old.to_string(), &new.to_string());
        if count == 0 {
            return Ok(None);
        }
        self.write_lines(name, &lines)?;
        log::debug!("Rewrote {} links in thought {}", count, name);
        Ok(Some(parser::parse(&lines, name.clone())))
    }

    /// Writes the link graph of `index` to `path` in Graphviz dot format.
    pub fn write_dot_graph<P: AsRef<Path>>(&self, index: &ThoughtIndex, path: P) -> Result<()> {
        let graph = generate_graph_data(index)?;
        fs::write(path, graph.to_dot())?;
        Ok(())
    }

    fn missing_as_not_found(&self, error: io::Error, name: &Name) -> ThoughtError {
        if error.kind() == io::ErrorKind::NotFound {
            ThoughtError::ThoughtNotFound(name.clone())
        } else {
            error.into()
        }
    }
}
