//! Redline orchestration: parse, index, align, then operate on the original.

use crate::align::{Aligner, DiffCommand, MyersAligner, validate};
use crate::config::{AlignEngine, DiffConfig, MYERS_DEADLINE};
use crate::deletion;
use crate::dom::Dom;
use crate::error::Result;
use crate::insertion::{Materializer, PreparedInsertion};
use crate::script::EditScript;
use crate::simplify::simplify;
use crate::surgery::FragmentMap;
use crate::words::{Tokenizer, index_document};

/// Counts describing one build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedlineStats {
    /// Words indexed in the original document
    pub original_words: usize,
    /// Words indexed in the revised document
    pub revised_words: usize,
    pub insertion_runs: usize,
    pub deletion_runs: usize,
    /// Words covered by insertion runs
    pub inserted_words: usize,
    /// Words covered by deletion runs
    pub deleted_words: usize,
}

impl RedlineStats {
    pub fn is_unchanged(&self) -> bool {
        self.insertion_runs == 0 && self.deletion_runs == 0
    }
}

/// The marked-up document together with its statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redline {
    pub html: String,
    pub stats: RedlineStats,
}

/// Builds redline documents from pairs of HTML documents.
///
/// A builder holds only validated configuration; every build works on its own
/// copies of both documents, so one builder can serve any number of builds.
#[derive(Debug, Clone)]
pub struct DiffBuilder {
    config: DiffConfig,
    tokenizer: Tokenizer,
}

impl DiffBuilder {
    /// Validate `config` and create a builder.
    pub fn new(config: DiffConfig) -> Result<Self> {
        let tokenizer = Tokenizer::new(&config.boundary)?;
        Ok(Self { config, tokenizer })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Mark up `original` with the changes that turn it into `revised`.
    pub fn build(&self, original: &str, revised: &str) -> Result<String> {
        Ok(self.build_report(original, revised)?.html)
    }

    /// Like [`build`](Self::build), also reporting what changed.
    pub fn build_report(&self, original: &str, revised: &str) -> Result<Redline> {
        let mut original = Dom::parse(original)?;
        let mut revised = Dom::parse(revised)?;

        if self.config.simplify {
            simplify(&mut original, &self.config.simplify_keep);
            simplify(&mut revised, &self.config.simplify_keep);
        }

        let case_insensitive = self.config.case_insensitive;
        let original_words = index_document(&original, &self.tokenizer, case_insensitive);
        let revised_words = index_document(&revised, &self.tokenizer, case_insensitive);
        debug!(
            original = original_words.len(),
            revised = revised_words.len(),
            "indexed documents"
        );

        let ops = self
            .aligner()
            .align(&original_words.index_texts(), &revised_words.index_texts())?;
        validate(&ops, original_words.len(), revised_words.len())?;
        let script = EditScript::from_alignment(&ops, original_words.len(), revised_words.len());

        // Everything is cut out of the revised document before the original changes
        let materializer = Materializer {
            original_words: &original_words,
            revised: &revised,
            revised_words: &revised_words,
            config: &self.config,
        };
        let prepared: Vec<PreparedInsertion> = script
            .insertions()
            .map(|run| materializer.prepare(&mut original, run))
            .collect();

        let mut fragments = FragmentMap::new();
        for insertion in &prepared {
            insertion.apply(&mut original, &mut fragments);
        }
        for run in script.deletions() {
            deletion::apply(
                &mut original,
                &mut fragments,
                &original_words,
                run,
                &self.config.delete_tag,
            );
        }

        let stats = RedlineStats {
            original_words: original_words.len(),
            revised_words: revised_words.len(),
            insertion_runs: script.insertions().count(),
            deletion_runs: script.deletions().count(),
            inserted_words: script.insertions().map(|run| run.b_end - run.b_start + 1).sum(),
            deleted_words: script.deletions().map(|run| run.a_end - run.a_start + 1).sum(),
        };
        debug!(?stats, "built redline");

        Ok(Redline {
            html: original.to_html(),
            stats,
        })
    }

    fn aligner(&self) -> Box<dyn Aligner> {
        match &self.config.engine {
            AlignEngine::Builtin => {
                let deadline = (!self.config.try_hard).then_some(MYERS_DEADLINE);
                Box::new(MyersAligner::new().with_deadline(deadline))
            }
            AlignEngine::Command(command) => {
                Box::new(DiffCommand::new(command).minimal(self.config.try_hard))
            }
        }
    }
}

/// Redline two documents with the default configuration.
pub fn diff_html(original: &str, revised: &str) -> Result<String> {
    DiffBuilder::new(DiffConfig::default())?.build(original, revised)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Boundary;
    use crate::error::Error;

    #[test]
    fn test_invalid_boundary_rejected_at_construction() {
        let config = DiffConfig::default().with_boundary(Boundary::Pattern("[".to_string()));
        assert!(matches!(
            DiffBuilder::new(config),
            Err(Error::InvalidBoundary { .. })
        ));
    }

    #[test]
    fn test_stats_count_runs_and_words() {
        let builder = DiffBuilder::new(DiffConfig::default()).unwrap();
        let report = builder
            .build_report("<p>the cat sat</p>", "<p>the dog sat down</p>")
            .unwrap();
        assert_eq!(
            report.stats,
            RedlineStats {
                original_words: 3,
                revised_words: 4,
                insertion_runs: 2,
                deletion_runs: 1,
                inserted_words: 2,
                deleted_words: 1,
            }
        );
        assert!(!report.stats.is_unchanged());
    }

    #[test]
    fn test_builder_is_reusable() {
        let builder = DiffBuilder::new(DiffConfig::default()).unwrap();
        let first = builder.build("<p>a</p>", "<p>b</p>").unwrap();
        let second = builder.build("<p>a</p>", "<p>b</p>").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_try_hard_builtin_matches_default() {
        let original = "<p>the quick brown fox jumps over the lazy dog</p>";
        let revised = "<p>the slow brown fox leaps over a lazy dog today</p>";
        let relaxed = DiffBuilder::new(DiffConfig::default()).unwrap();
        let thorough = DiffBuilder::new(DiffConfig::default().with_try_hard(true)).unwrap();
        assert_eq!(
            relaxed.build(original, revised).unwrap(),
            thorough.build(original, revised).unwrap()
        );
    }

    #[test]
    fn test_missing_diff_command_is_reported() {
        let config = DiffConfig::default()
            .with_engine(AlignEngine::Command("/nonexistent/diff-binary".into()));
        let builder = DiffBuilder::new(config).unwrap();
        assert!(matches!(
            builder.build("<p>a</p>", "<p>b</p>"),
            Err(Error::DiffEngineSpawn { .. })
        ));
    }
}
