//! Edit script adapter.
//!
//! Turns a flat alignment into maximal insertion and deletion runs expressed
//! as word indices, with enough adjacency information to tell a pure
//! insertion from one half of a substitution.

use crate::align::AlignOp;

/// What happened right before or after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditKind {
    /// Start or end of the document
    #[default]
    None,
    Match,
    Insertion,
    Deletion,
}

/// Words `b_start..=b_end` of the revised document, to be inserted into the
/// original after word `anchor` (`None`: before the first word).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertionRun {
    pub b_start: usize,
    pub b_end: usize,
    pub anchor: Option<usize>,
    pub prev: EditKind,
    pub next: EditKind,
}

/// Words `a_start..=a_end` of the original document that were removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionRun {
    pub a_start: usize,
    pub a_end: usize,
    pub prev: EditKind,
    pub next: EditKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditRun {
    Insertion(InsertionRun),
    Deletion(DeletionRun),
}

impl EditRun {
    pub fn kind(&self) -> EditKind {
        match self {
            EditRun::Insertion(_) => EditKind::Insertion,
            EditRun::Deletion(_) => EditKind::Deletion,
        }
    }

    fn set_next(&mut self, next: EditKind) {
        match self {
            EditRun::Insertion(run) => run.next = next,
            EditRun::Deletion(run) => run.next = next,
        }
    }
}

/// All runs of one build, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    pub runs: Vec<EditRun>,
}

impl EditScript {
    /// Remap an alignment of `a_len` original and `b_len` revised words onto runs.
    ///
    /// The alignment must have been validated against both lengths, so the
    /// cursors never run past the end of either list and `a_cursor - 1` is
    /// always a real word (or "before the first word").
    pub fn from_alignment(ops: &[AlignOp], a_len: usize, b_len: usize) -> Self {
        let mut runs: Vec<EditRun> = Vec::new();
        let mut a_cursor = 0usize;
        let mut b_cursor = 0usize;
        let mut prev = EditKind::None;

        for &op in ops {
            match op {
                AlignOp::Insert => {
                    debug_assert!(b_cursor < b_len, "insertion past the end of the revised words");
                    if prev == EditKind::Insertion {
                        if let Some(EditRun::Insertion(run)) = runs.last_mut() {
                            run.b_end = b_cursor;
                        }
                    } else {
                        if prev == EditKind::Deletion
                            && let Some(last) = runs.last_mut()
                        {
                            last.set_next(EditKind::Insertion);
                        }
                        runs.push(EditRun::Insertion(InsertionRun {
                            b_start: b_cursor,
                            b_end: b_cursor,
                            anchor: a_cursor.checked_sub(1),
                            prev,
                            next: EditKind::None,
                        }));
                        prev = EditKind::Insertion;
                    }
                    b_cursor += 1;
                }
                AlignOp::Delete => {
                    debug_assert!(a_cursor < a_len, "deletion past the end of the original words");
                    if prev == EditKind::Deletion {
                        if let Some(EditRun::Deletion(run)) = runs.last_mut() {
                            run.a_end = a_cursor;
                        }
                    } else {
                        if prev == EditKind::Insertion
                            && let Some(last) = runs.last_mut()
                        {
                            last.set_next(EditKind::Deletion);
                        }
                        runs.push(EditRun::Deletion(DeletionRun {
                            a_start: a_cursor,
                            a_end: a_cursor,
                            prev,
                            next: EditKind::None,
                        }));
                        prev = EditKind::Deletion;
                    }
                    a_cursor += 1;
                }
                AlignOp::Match => {
                    if matches!(prev, EditKind::Insertion | EditKind::Deletion)
                        && let Some(last) = runs.last_mut()
                    {
                        last.set_next(EditKind::Match);
                    }
                    prev = EditKind::Match;
                    a_cursor += 1;
                    b_cursor += 1;
                }
            }
        }

        debug!(
            runs = runs.len(),
            original_words = a_len,
            revised_words = b_len,
            "remapped alignment onto runs"
        );
        Self { runs }
    }

    pub fn insertions(&self) -> impl Iterator<Item = &InsertionRun> {
        self.runs.iter().filter_map(|run| match run {
            EditRun::Insertion(run) => Some(run),
            EditRun::Deletion(_) => None,
        })
    }

    pub fn deletions(&self) -> impl Iterator<Item = &DeletionRun> {
        self.runs.iter().filter_map(|run| match run {
            EditRun::Deletion(run) => Some(run),
            EditRun::Insertion(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AlignOp::*;

    #[test]
    fn test_no_changes_no_runs() {
        let script = EditScript::from_alignment(&[Match, Match], 2, 2);
        assert!(script.is_empty());
    }

    #[test]
    fn test_pure_insertion_anchors_after_previous_word() {
        let script = EditScript::from_alignment(&[Match, Insert, Insert, Match], 2, 4);
        assert_eq!(
            script.runs,
            [EditRun::Insertion(InsertionRun {
                b_start: 1,
                b_end: 2,
                anchor: Some(0),
                prev: EditKind::Match,
                next: EditKind::Match,
            })]
        );
    }

    #[test]
    fn test_insertion_before_first_word() {
        let script = EditScript::from_alignment(&[Insert, Match], 1, 2);
        let run = script.insertions().next().unwrap();
        assert_eq!(run.anchor, None);
        assert_eq!(run.prev, EditKind::None);
    }

    #[test]
    fn test_trailing_insertion_anchors_to_last_word() {
        let script = EditScript::from_alignment(&[Match, Match, Insert], 2, 3);
        let run = script.insertions().next().unwrap();
        assert_eq!(run.anchor, Some(1));
        assert_eq!(run.next, EditKind::None);
    }

    #[test]
    fn test_substitution_cross_references_runs() {
        // red apple -> green apple
        let script = EditScript::from_alignment(&[Delete, Insert, Match], 2, 2);
        assert_eq!(
            script.runs,
            [
                EditRun::Deletion(DeletionRun {
                    a_start: 0,
                    a_end: 0,
                    prev: EditKind::None,
                    next: EditKind::Insertion,
                }),
                EditRun::Insertion(InsertionRun {
                    b_start: 0,
                    b_end: 0,
                    anchor: Some(0),
                    prev: EditKind::Deletion,
                    next: EditKind::Match,
                }),
            ]
        );
    }

    #[test]
    fn test_insertion_then_deletion() {
        let script = EditScript::from_alignment(&[Match, Insert, Delete, Delete], 3, 2);
        assert_eq!(script.runs[0].kind(), EditKind::Insertion);
        let EditRun::Insertion(insertion) = &script.runs[0] else {
            unreachable!()
        };
        assert_eq!(insertion.next, EditKind::Deletion);
        let deletion = script.deletions().next().unwrap();
        assert_eq!((deletion.a_start, deletion.a_end), (1, 2));
        assert_eq!(deletion.prev, EditKind::Insertion);
        assert_eq!(deletion.next, EditKind::None);
    }

    #[test]
    fn test_everything_deleted_and_replaced() {
        let script = EditScript::from_alignment(&[Delete, Delete, Insert], 2, 1);
        assert_eq!(script.deletions().count(), 1);
        let insertion = script.insertions().next().unwrap();
        assert_eq!(insertion.anchor, Some(1));
    }
}
