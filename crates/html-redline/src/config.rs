//! Redline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Tags kept by the simplification pass unless overridden.
pub const DEFAULT_SIMPLIFY_KEEP: &[&str] = &["html", "body", "p", "strong", "em", "ul", "ol", "li"];

/// How long the builtin engine looks for a minimal alignment unless `try_hard` is set.
pub const MYERS_DEADLINE: Duration = Duration::from_millis(500);

/// How text is cut into words and separators.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Boundary {
    /// Runs of characters that are not alphanumeric separate words, so
    /// punctuation never takes part in comparisons.
    #[default]
    Alphanumeric,
    /// Only runs of whitespace separate words; punctuation sticks to words.
    Whitespace,
    /// Every match of this regular expression is a separator.
    Pattern(String),
}

/// Which sequence aligner computes the word-level edit script.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AlignEngine {
    /// In-process Myers diff.
    #[default]
    Builtin,
    /// An external `diff` compatible command producing unified output.
    Command(PathBuf),
}

/// Configuration for a [`DiffBuilder`](crate::DiffBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    /// Word/separator boundary rule
    pub boundary: Boundary,
    /// Compare words case-insensitively
    pub case_insensitive: bool,
    /// Strip every element not listed in `simplify_keep` before diffing
    pub simplify: bool,
    /// Elements that survive simplification
    pub simplify_keep: Vec<String>,
    /// Sequence aligner
    pub engine: AlignEngine,
    /// Ask the aligner for a slower, more thorough alignment.
    ///
    /// The builtin engine otherwise stops searching for a minimal alignment
    /// after [`MYERS_DEADLINE`]; a command engine gets `-d`.
    pub try_hard: bool,
    /// Element wrapped around inserted text
    pub insert_tag: String,
    /// Element wrapped around deleted text
    pub delete_tag: String,
    /// Element grouping inline insertions that carry markup
    pub inline_tag: String,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            boundary: Boundary::default(),
            case_insensitive: true,
            simplify: false,
            simplify_keep: DEFAULT_SIMPLIFY_KEEP.iter().map(|tag| tag.to_string()).collect(),
            engine: AlignEngine::default(),
            try_hard: false,
            insert_tag: "ins".to_string(),
            delete_tag: "del".to_string(),
            inline_tag: "span".to_string(),
        }
    }
}

impl DiffConfig {
    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }

    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Enable simplification, keeping only the given tags.
    pub fn with_simplify<I, S>(mut self, keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.simplify = true;
        self.simplify_keep = keep.into_iter().map(Into::into).collect();
        self
    }

    /// Enable simplification with the default allow-list.
    pub fn with_default_simplify(mut self) -> Self {
        self.simplify = true;
        self
    }

    pub fn with_engine(mut self, engine: AlignEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_try_hard(mut self, try_hard: bool) -> Self {
        self.try_hard = try_hard;
        self
    }

    pub fn with_marker_tags(mut self, insert: impl Into<String>, delete: impl Into<String>) -> Self {
        self.insert_tag = insert.into();
        self.delete_tag = delete.into();
        self
    }

    pub fn with_inline_tag(mut self, tag: impl Into<String>) -> Self {
        self.inline_tag = tag.into();
        self
    }
}
