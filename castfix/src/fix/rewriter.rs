//! Byte-range edit log.
//!
//! Edits are recorded against byte offsets of the *original* source and applied
//! in one pass at the end, so no edit ever sees coordinates shifted by another.
//!
//! # Usage
//!
//! ```
//! use castfix::fix::EditLog;
//!
//! let mut log = EditLog::new("(int)x;");
//! log.replace(0..5, "static_cast<int>(");
//! log.insert_after(6, ")");
//! let fixed = log.apply().expect("should apply");
//! assert_eq!(fixed, "static_cast<int>(x);");
//! ```

use std::ops::Range;

/// A single edit operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start byte offset (inclusive)
    pub start_byte: usize,
    /// End byte offset (exclusive)
    pub end_byte: usize,
    /// Replacement content
    pub replacement: String,
}

impl Edit {
    /// Create a new edit
    #[must_use]
    pub fn new(start_byte: usize, end_byte: usize, replacement: impl Into<String>) -> Self {
        Self {
            start_byte,
            end_byte,
            replacement: replacement.into(),
        }
    }

    /// Create an insertion edit (insert at position, nothing removed)
    #[must_use]
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self::new(position, position, content)
    }

    /// Whether this edit only inserts text
    #[must_use]
    pub const fn is_insertion(&self) -> bool {
        self.start_byte == self.end_byte
    }

    /// Check if this edit overlaps with another.
    ///
    /// Insertions only conflict with a replacement that strictly contains
    /// their position.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start_byte < other.end_byte && other.start_byte < self.end_byte
    }
}

/// Error while applying an edit log
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// Two or more edits have overlapping ranges
    #[error("Overlapping edits at indices {edit_a} and {edit_b}")]
    OverlappingEdits {
        /// Index of first overlapping edit
        edit_a: usize,
        /// Index of second overlapping edit
        edit_b: usize,
    },
    /// Edit range is out of bounds
    #[error("Edit {edit_index} out of bounds: end_byte {end_byte} > source length {source_len}")]
    OutOfBounds {
        /// Index of the bad edit
        edit_index: usize,
        /// End byte of the edit
        end_byte: usize,
        /// Length of the source
        source_len: usize,
    },
    /// Edit starts after it ends
    #[error("Edit {edit_index} has inverted range {start_byte}..{end_byte}")]
    InvertedRange {
        /// Index of the bad edit
        edit_index: usize,
        /// Start byte of the edit
        start_byte: usize,
        /// End byte of the edit
        end_byte: usize,
    },
    /// Edit boundary splits a UTF-8 character
    #[error("Edit {edit_index} does not fall on a character boundary")]
    NotCharBoundary {
        /// Index of the bad edit
        edit_index: usize,
    },
}

/// Pending edits for one source buffer.
#[derive(Debug, Clone)]
pub struct EditLog {
    /// Original source code
    source: String,
    /// Pending edits, in the order they were recorded
    edits: Vec<Edit>,
}

impl EditLog {
    /// Create an empty log for the given source
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edits: Vec::new(),
        }
    }

    /// Record a replacement of `range` with `text`
    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.push(Edit::new(range.start, range.end, text));
    }

    /// Record an insertion of `text` right after byte `position`
    pub fn insert_after(&mut self, position: usize, text: impl Into<String>) {
        self.push(Edit::insert(position, text));
    }

    /// Add an edit to the pending list
    pub fn push(&mut self, edit: Edit) {
        self.edits.push(edit);
    }

    /// Add multiple edits
    pub fn extend(&mut self, edits: impl IntoIterator<Item = Edit>) {
        self.edits.extend(edits);
    }

    /// Pending edits in recording order
    #[must_use]
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Get the number of pending edits
    #[must_use]
    pub fn edit_count(&self) -> usize {
        self.edits.len()
    }

    /// Check if there are any pending edits
    #[must_use]
    pub fn has_edits(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Validate edits without applying them
    ///
    /// # Errors
    /// Returns error if an edit is out of bounds, inverted, splits a
    /// character, or overlaps another edit
    pub fn validate(&self) -> Result<(), RewriteError> {
        for (i, edit) in self.edits.iter().enumerate() {
            if edit.start_byte > edit.end_byte {
                return Err(RewriteError::InvertedRange {
                    edit_index: i,
                    start_byte: edit.start_byte,
                    end_byte: edit.end_byte,
                });
            }
            if edit.end_byte > self.source.len() {
                return Err(RewriteError::OutOfBounds {
                    edit_index: i,
                    end_byte: edit.end_byte,
                    source_len: self.source.len(),
                });
            }
            if !self.source.is_char_boundary(edit.start_byte)
                || !self.source.is_char_boundary(edit.end_byte)
            {
                return Err(RewriteError::NotCharBoundary { edit_index: i });
            }
        }

        for i in 0..self.edits.len() {
            for j in (i + 1)..self.edits.len() {
                if self.edits[i].overlaps(&self.edits[j]) {
                    return Err(RewriteError::OverlappingEdits {
                        edit_a: i,
                        edit_b: j,
                    });
                }
            }
        }

        Ok(())
    }

    /// Apply all edits and return the modified source
    ///
    /// Edits are applied from the end of the buffer towards the start so that
    /// earlier offsets stay valid. At equal start positions the replacement
    /// goes first, which leaves an insertion at that position in front of the
    /// replaced text.
    ///
    /// # Errors
    /// Returns error if validation fails
    pub fn apply(self) -> Result<String, RewriteError> {
        self.validate()?;

        let mut result = self.source;
        let mut sorted_edits = self.edits;

        sorted_edits.sort_by(|a, b| {
            b.start_byte
                .cmp(&a.start_byte)
                .then(b.end_byte.cmp(&a.end_byte))
        });

        for edit in sorted_edits {
            result.replace_range(edit.start_byte..edit.end_byte, &edit.replacement);
        }

        Ok(result)
    }
}
