//! Hierarchical, sortable thought names.
//!
//! A [`Name`] is a sequence of alternating alphabetic and non-alphabetic
//! segments, so `"2a1"` reads as `["2", "a", "1"]`. Names sort the way an
//! outline reads: `1 < 1a < 1b < 2 < 2a < 2a1 < 10`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The name of a thought.
///
/// Parsing is total: every string splits into maximal runs of letters and
/// non-letters, and the empty string is the empty name (the root of the
/// outline).
///
/// # Examples
///
/// ```
/// use thoughtindex::Name;
///
/// let name = Name::parse("2a1");
/// assert_eq!(name.parts(), ["2", "a", "1"]);
/// assert_eq!(name.to_string(), "2a1");
/// assert!(Name::parse("9") < Name::parse("10"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Name {
    parts: Vec<String>,
}

impl Name {
    /// Splits `name` into alphabetic and non-alphabetic segments.
    pub fn parse(name: &str) -> Self {
        let mut parts: Vec<String> = Vec::new();
        let mut letters = None;

        for c in name.chars() {
            let is_letter = c.is_alphabetic();
            if letters == Some(is_letter) {
                if let Some(part) = parts.last_mut() {
                    part.push(c);
                    continue;
                }
            }
            parts.push(c.to_string());
            letters = Some(is_letter);
        }

        Self { parts }
    }

    /// The segments of this name, in order.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// True for the empty name, which has no segments.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// True if `other` starts with every segment of `self` and is longer.
    pub fn is_ancestor_of(&self, other: &Name) -> bool {
        other.parts.len() > self.parts.len() && other.parts[..self.parts.len()] == self.parts[..]
    }

    /// Returns the immediate successor of this name.
    ///
    /// Only the last segment changes. Letters count like spreadsheet columns
    /// (`z -> aa`, `az -> ba`), digits count in base ten (`9 -> 10`). The
    /// empty name is followed by `1`.
    ///
    /// ```
    /// use thoughtindex::Name;
    ///
    /// assert_eq!(Name::parse("1z").next().to_string(), "1aa");
    /// assert_eq!(Name::parse("a19").next().to_string(), "a20");
    /// assert_eq!(Name::parse("").next().to_string(), "1");
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> Name {
        let mut parts = self.parts.clone();
        match parts.last_mut() {
            Some(last) => *last = increment_segment(last),
            None => parts.push("1".to_string()),
        }
        Name { parts }
    }

    /// Finds the lowest child of `base` that is not taken by any of `used`.
    ///
    /// A child of a name ending in letters (or of the empty name) gets a
    /// numeric segment, a child of a name ending in digits gets a letter
    /// segment. Only the segment directly below `base` is compared, so
    /// `2a1` occupies the child `2a` of `2`. The order of `used` does not
    /// matter.
    ///
    /// ```
    /// use thoughtindex::Name;
    ///
    /// let used: Vec<Name> = ["1", "2", "2a", "2b"].iter().map(|n| Name::parse(n)).collect();
    /// assert_eq!(Name::find_next(&used, &Name::parse("")).to_string(), "3");
    /// assert_eq!(Name::find_next(&used, &Name::parse("2")).to_string(), "2c");
    /// ```
    pub fn find_next(used: &[Name], base: &Name) -> Name {
        let depth = base.parts.len();
        let taken: HashSet<&str> = used
            .iter()
            .filter(|name| base.is_ancestor_of(name))
            .map(|name| name.parts[depth].as_str())
            .collect();

        let mut child = match base.parts.last() {
            Some(last) if !is_alphabetic_segment(last) => "a".to_string(),
            _ => "1".to_string(),
        };
        while taken.contains(child.as_str()) {
            child = increment_segment(&child);
        }

        let mut parts = base.parts.clone();
        parts.push(child);
        Name { parts }
    }
}

fn is_alphabetic_segment(segment: &str) -> bool {
    segment.chars().next().is_some_and(char::is_alphabetic)
}

fn increment_segment(segment: &str) -> String {
    if is_alphabetic_segment(segment) {
        increment_letters(segment)
    } else {
        increment_digits(segment)
    }
}

/// Base-26 odometer. Lowercase ASCII is the alphabet, uppercase ASCII keeps
/// its case, and any other letter rolls over like `z`.
fn increment_letters(segment: &str) -> String {
    let mut chars: Vec<char> = segment.chars().collect();

    for i in (0..chars.len()).rev() {
        match chars[i] {
            c @ 'a'..='y' | c @ 'A'..='Y' => {
                chars[i] = (c as u8 + 1) as char;
                return chars.into_iter().collect();
            }
            'Z' => chars[i] = 'A',
            _ => chars[i] = 'a',
        }
    }

    let first = if segment.starts_with(|c: char| c.is_ascii_uppercase()) {
        'A'
    } else {
        'a'
    };
    std::iter::once(first).chain(chars).collect()
}

/// Base-10 odometer over the last run of ASCII digits. A segment without
/// digits gets a `1` appended.
fn increment_digits(segment: &str) -> String {
    let mut chars: Vec<char> = segment.chars().collect();
    let Some(end) = chars.iter().rposition(char::is_ascii_digit) else {
        chars.push('1');
        return chars.into_iter().collect();
    };

    let mut i = end;
    loop {
        if chars[i] == '9' {
            chars[i] = '0';
            if i > 0 && chars[i - 1].is_ascii_digit() {
                i -= 1;
                continue;
            }
            chars.insert(i, '1');
        } else {
            chars[i] = (chars[i] as u8 + 1) as char;
        }
        return chars.into_iter().collect();
    }
}

/// Shorter segments sort first; equal lengths compare by content.
fn compare_segments(a: &str, b: &str) -> Ordering {
    a.chars()
        .count()
        .cmp(&b.chars().count())
        .then_with(|| a.cmp(b))
}

/// Segment-by-segment comparison. A name that runs out of segments first is
/// the smaller one, so a parent sorts before its children. Digits sort before
/// letters of the same length only because of their code points.
impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.parts.iter().zip(&other.parts) {
            match compare_segments(a, b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.parts.len().cmp(&other.parts.len())
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            f.write_str(part)?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Name::parse(s))
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::parse(s)
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Name::parse(&s)
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.to_string()
    }
}
