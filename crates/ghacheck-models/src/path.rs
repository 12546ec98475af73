//! Dotted, JSON-pointer-like paths used to localize schema errors.

use std::fmt;

/// A single step in a [`Path`]: either a map traversal or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// A path from the document root to a node, rendered as `a.b[0].c`.
///
/// `Path` is an immutable builder: [`Path::key`] and [`Path::index`] return
/// a new, extended path rather than mutating in place, mirroring the way
/// call sites thread a growing location through recursive descent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The empty (document root) path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a new path with a map key appended.
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.into()));
        Self { segments }
    }

    /// Returns a new path with a sequence index appended.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    /// Returns the path's immediate parent, or the root if already at the root.
    #[must_use]
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(k) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{k}")?;
                }
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_dotted_and_bracketed_paths() {
        let path = Path::root().key("jobs").key("build").key("steps").index(0);
        assert_eq!(path.to_string(), "jobs.build.steps[0]");
    }

    #[test]
    fn root_is_empty() {
        assert_eq!(Path::root().to_string(), "");
    }

    #[test]
    fn parent_drops_last_segment() {
        let path = Path::root().key("on").key("push");
        assert_eq!(path.parent().to_string(), "on");
    }
}
