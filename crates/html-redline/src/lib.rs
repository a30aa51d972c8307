//! Word-level visual diffs of HTML documents.
//!
//! Given an original and a revised document, html-redline returns the
//! original with inserted text wrapped in `<ins>` and removed text wrapped in
//! `<del>`, keeping lists, emphasis and paragraphs intact instead of diffing
//! flattened text.
//!
//! ```
//! let html = html_redline::diff_html("<p>the cat sat</p>", "<p>the dog sat</p>").unwrap();
//! assert!(html.contains("the <del>cat</del><ins>dog</ins> sat"));
//! ```
//!
//! The pipeline: both documents are parsed into a [`Dom`], every text node is
//! cut into [`WordRecord`]s, an [`Aligner`] compares the word sequences, and
//! the resulting [`EditScript`] is replayed onto the original. Insertions are
//! copied out of the revised tree with as much of their markup as they own;
//! deletions are wrapped where they stand.

#[macro_use]
mod macros;

pub mod align;
pub mod builder;
pub mod config;
pub mod deletion;
pub mod dom;
pub mod error;
pub mod insertion;
pub mod script;
pub mod simplify;
pub mod surgery;
pub mod words;

pub use align::{AlignOp, Aligner, DiffCommand, MyersAligner};
pub use builder::{DiffBuilder, Redline, RedlineStats, diff_html};
pub use config::{AlignEngine, Boundary, DEFAULT_SIMPLIFY_KEEP, DiffConfig, MYERS_DEADLINE};
pub use dom::{Dom, NodeData, NodeId};
pub use error::{Error, Result};
pub use script::{DeletionRun, EditKind, EditRun, EditScript, InsertionRun};
pub use words::{Tokenizer, WordList, WordRecord};
