//! Ordered file-name lists for heavy sensors.

use tapedeck_core::Stamp;

/// The record files of one heavy sensor, in lexicographic order.
///
/// File names embed their timestamp (`<stamp>.<ext>`), so lexicographic
/// order is recording order whenever the stamps have equal digit counts,
/// which holds for any real recording session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileList {
    names: Vec<String>,
}

impl FileList {
    /// Build from names in any order.
    pub fn new(mut names: Vec<String>) -> Self {
        names.sort();
        Self { names }
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether there are no files.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// The name at `index`.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// All names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Find `name`, starting `window` entries behind `hint`.
    ///
    /// Sequential playback asks for the file right after the previous
    /// one, so the search starts just behind the last known index and
    /// normally succeeds within a step or two. Files before the window
    /// are searched last, so a seek backwards still finds its target.
    pub fn locate(&self, name: &str, hint: Option<usize>, window: usize) -> Option<usize> {
        let start = hint.map_or(0, |h| h.saturating_sub(window)).min(self.names.len());
        self.names[start..]
            .iter()
            .position(|n| n == name)
            .map(|i| i + start)
            .or_else(|| self.names[..start].iter().position(|n| n == name))
    }

    /// The stamp embedded in the name at `index` (the digits before the
    /// first `.`).
    pub fn stamp_of(&self, index: usize) -> Option<Stamp> {
        let name = self.names.get(index)?;
        let stem = name.split_once('.').map_or(name.as_str(), |(s, _)| s);
        stem.parse().ok()
    }
}

impl FromIterator<String> for FileList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
