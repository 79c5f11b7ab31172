use std::iter::FusedIterator;
use std::sync::Arc;

use crate::line::StoryLine;

/// The ordered lines of one chapter. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Script {
    lines: Arc<[Arc<StoryLine>]>,
}

impl Script {
    pub fn new(lines: Vec<StoryLine>) -> Self {
        Self {
            lines: lines.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StoryLine> {
        self.lines.get(index).map(Arc::as_ref)
    }

    /// A fresh read position at the first line.
    pub fn cursor(&self) -> ScriptCursor {
        ScriptCursor {
            lines: self.lines.clone(),
            pos: 0,
        }
    }
}

/// Forward-only reader over a [`Script`].
///
/// Once the end is reached every further call yields `None`.
#[derive(Debug, Clone)]
pub struct ScriptCursor {
    lines: Arc<[Arc<StoryLine>]>,
    pos: usize,
}

impl ScriptCursor {
    /// Number of lines handed out so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.lines.len()
    }
}

impl Iterator for ScriptCursor {
    type Item = Arc<StoryLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.get(self.pos)?.clone();
        self.pos += 1;
        Some(line)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.lines.len().saturating_sub(self.pos);
        (left, Some(left))
    }
}

impl ExactSizeIterator for ScriptCursor {}
impl FusedIterator for ScriptCursor {}
