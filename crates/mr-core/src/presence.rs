//! The presence list: declared names whose working copy is on disk

use crate::Declarations;

/// Ordered, duplicate-free list of repository names.
///
/// Persisted as one name per line with a single trailing newline when
/// non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presence(Vec<String>);

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the persisted text form.
    ///
    /// Blank lines and repeated names are skipped; trailing whitespace on a
    /// line is ignored.
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Render the persisted text form.
    pub fn render(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }
        let mut text = self.0.join("\n");
        text.push('\n');
        text
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Append `name` unless already listed. Returns `true` when added.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.0.push(name.to_string());
        true
    }

    /// Remove `name`. Returns `true` when it was listed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|n| n != name);
        self.0.len() != before
    }

    /// Drop names that are not declared, returning them.
    pub fn retain_declared(&mut self, declarations: &Declarations) -> Vec<String> {
        let (kept, dropped): (Vec<String>, Vec<String>) = std::mem::take(&mut self.0)
            .into_iter()
            .partition(|name| declarations.contains_key(name));
        self.0 = kept;
        dropped
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl FromIterator<String> for Presence {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut presence = Presence::new();
        for name in iter {
            presence.insert(&name);
        }
        presence
    }
}

impl<'a> FromIterator<&'a str> for Presence {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}
