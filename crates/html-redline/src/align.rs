//! Sequence alignment of word lists.
//!
//! The rest of the pipeline only needs an ordered list of [`AlignOp`]s, one per
//! token of either side. [`MyersAligner`] computes it in-process with `similar`;
//! [`DiffCommand`] shells out to a `diff` compatible tool and parses its unified
//! output.

use std::io::Write;
use std::iter::repeat_n;
use std::path::PathBuf;
use std::process::Command;
use std::time::{Duration, Instant};

use similar::{Algorithm, DiffTag};

use crate::error::{Error, Result};

/// One step of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignOp {
    /// Token present in both sequences
    Match,
    /// Token only in the first (original) sequence
    Delete,
    /// Token only in the second (revised) sequence
    Insert,
}

/// Computes an alignment between two token sequences.
pub trait Aligner {
    fn align(&self, a: &[&str], b: &[&str]) -> Result<Vec<AlignOp>>;
}

/// Check that `ops` consumes exactly `a_len` and `b_len` tokens.
pub fn validate(ops: &[AlignOp], a_len: usize, b_len: usize) -> Result<()> {
    let consumed_a = ops.iter().filter(|&&op| op != AlignOp::Insert).count();
    let consumed_b = ops.iter().filter(|&&op| op != AlignOp::Delete).count();
    if consumed_a != a_len || consumed_b != b_len {
        return Err(Error::DiffEngineOutput(format!(
            "alignment covers {consumed_a}/{a_len} original and {consumed_b}/{b_len} revised tokens"
        )));
    }
    Ok(())
}

/// Reorder every block of consecutive changes so deletions come before
/// insertions, the way unified diffs present a change.
pub fn deletions_first(ops: &mut [AlignOp]) {
    let mut start = 0;
    while start < ops.len() {
        if ops[start] == AlignOp::Match {
            start += 1;
            continue;
        }
        let end = ops[start..]
            .iter()
            .position(|&op| op == AlignOp::Match)
            .map_or(ops.len(), |offset| start + offset);
        ops[start..end].sort_by_key(|&op| op != AlignOp::Delete);
        start = end;
    }
}

// ============================================================================
// In-process Myers diff
// ============================================================================

/// Myers diff computed in-process by `similar`.
///
/// Without a deadline the alignment is minimal. With one, `similar` falls
/// back to a cheaper, possibly longer alignment once the deadline passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MyersAligner {
    deadline: Option<Duration>,
}

impl MyersAligner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up on a minimal alignment after `deadline`.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }
}

impl Aligner for MyersAligner {
    fn align(&self, a: &[&str], b: &[&str]) -> Result<Vec<AlignOp>> {
        let deadline = self.deadline.map(|budget| Instant::now() + budget);
        let diff = similar::capture_diff_slices_deadline(Algorithm::Myers, a, b, deadline);

        let mut ops = Vec::with_capacity(a.len().max(b.len()));
        for op in &diff {
            let (tag, old, new) = op.as_tag_tuple();
            match tag {
                DiffTag::Equal => ops.extend(repeat_n(AlignOp::Match, old.len())),
                DiffTag::Delete => ops.extend(repeat_n(AlignOp::Delete, old.len())),
                DiffTag::Insert => ops.extend(repeat_n(AlignOp::Insert, new.len())),
                DiffTag::Replace => {
                    ops.extend(repeat_n(AlignOp::Delete, old.len()));
                    ops.extend(repeat_n(AlignOp::Insert, new.len()));
                }
            }
        }
        trace!(ops = ops.len(), hunks = diff.len(), "aligned with myers");

        deletions_first(&mut ops);
        Ok(ops)
    }
}

// ============================================================================
// External diff command
// ============================================================================

/// Runs an external `diff` (GNU diffutils compatible) over the two token
/// streams and parses its unified, full-context output.
#[derive(Debug, Clone)]
pub struct DiffCommand {
    command: PathBuf,
    minimal: bool,
}

impl DiffCommand {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            minimal: false,
        }
    }

    /// Ask for a minimal alignment (`diff -d`), which is slower.
    pub fn minimal(mut self, minimal: bool) -> Self {
        self.minimal = minimal;
        self
    }
}

impl Aligner for DiffCommand {
    fn align(&self, a: &[&str], b: &[&str]) -> Result<Vec<AlignOp>> {
        // Both files are removed when these handles drop, on every path out
        let file_a = write_tokens(a)?;
        let file_b = write_tokens(b)?;

        // Enough context lines that no matching region is ever collapsed
        let context = a.len().max(b.len()).max(1);
        let mut command = Command::new(&self.command);
        command.arg(format!("-U{context}"));
        if self.minimal {
            command.arg("-d");
        }
        command.arg(file_a.path()).arg(file_b.path());

        debug!(command = ?command, "running diff command");
        let output = command.output().map_err(|source| Error::DiffEngineSpawn {
            command: self.command.clone(),
            source,
        })?;

        // diff exits 0 for identical inputs, 1 for differences, 2 for trouble
        match output.status.code() {
            Some(0) | Some(1) => {}
            _ => {
                return Err(Error::DiffEngineFailed {
                    command: self.command.clone(),
                    status: output.status,
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
        }

        if !output.stderr.is_empty() {
            warn!(
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "diff command wrote to stderr"
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let ops = parse_unified(&stdout, a.len(), b.len())?;
        validate(&ops, a.len(), b.len())?;
        Ok(ops)
    }
}

fn write_tokens(tokens: &[&str]) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::Builder::new().prefix("html-redline-").tempfile()?;
    {
        let mut writer = std::io::BufWriter::new(file.as_file_mut());
        for token in tokens {
            writer.write_all(escape_token(token).as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }
    Ok(file)
}

/// Keep every token on exactly one line.
fn escape_token(token: &str) -> String {
    token
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Parse unified diff output into alignment ops.
///
/// Everything before the first hunk header is file header. Inside hunks each
/// line is prefixed with ` `, `-` or `+`; `\ No newline at end of file`
/// markers are ignored. Identical inputs produce no output at all, which maps
/// to all matches.
pub fn parse_unified(output: &str, a_len: usize, b_len: usize) -> Result<Vec<AlignOp>> {
    if output.is_empty() {
        if a_len != b_len {
            return Err(Error::DiffEngineOutput(
                "no output for inputs of different lengths".to_string(),
            ));
        }
        return Ok(vec![AlignOp::Match; a_len]);
    }

    let mut ops = Vec::with_capacity(a_len.max(b_len));
    let mut in_hunk = false;
    for line in output.lines() {
        if line.starts_with("@@") {
            in_hunk = true;
            continue;
        }
        if !in_hunk {
            continue;
        }
        match line.as_bytes().first() {
            Some(b' ') => ops.push(AlignOp::Match),
            Some(b'-') => ops.push(AlignOp::Delete),
            Some(b'+') => ops.push(AlignOp::Insert),
            Some(b'\\') => {}
            _ => {
                return Err(Error::DiffEngineOutput(format!(
                    "unexpected line in diff output: {line:?}"
                )));
            }
        }
    }
    Ok(ops)
}
