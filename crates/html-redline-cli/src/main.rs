//! redline - mark up the differences between two HTML documents

use std::env;
use std::io::Write;
use std::process::ExitCode;

use eyre::{Result, WrapErr, bail};
use facet::Facet;
use facet_args as args;
use html_redline::{AlignEngine, Boundary, DiffBuilder, DiffConfig, RedlineStats};
use owo_colors::OwoColorize;

/// Word-level visual diff of two HTML documents
#[derive(Facet, Debug)]
struct Args {
    /// Original document
    #[facet(args::positional)]
    old: String,

    /// Revised document
    #[facet(args::positional)]
    new: String,

    /// Write the marked-up document here instead of stdout
    #[facet(args::named, args::short = 'o', default)]
    output: Option<String>,

    /// Split words on whitespace only, so punctuation takes part in comparisons
    #[facet(args::named, args::short = 'w')]
    whitespace: bool,

    /// Regular expression matching the separators between words
    #[facet(args::named, default)]
    pattern: Option<String>,

    /// Compare words case-sensitively
    #[facet(args::named, args::short = 'c')]
    case_sensitive: bool,

    /// Strip markup outside the allow-list before diffing
    #[facet(args::named, args::short = 's')]
    simplify: bool,

    /// Comma-separated tags kept by --simplify
    #[facet(args::named, default)]
    keep: Option<String>,

    /// Align words with an external diff command instead of the builtin one
    #[facet(args::named, default)]
    diff_cmd: Option<String>,

    /// Ask the aligner for a minimal alignment
    #[facet(args::named)]
    try_hard: bool,

    /// Print change counts to stderr
    #[facet(args::named)]
    stats: bool,
}

impl Args {
    fn config(&self) -> Result<DiffConfig> {
        let boundary = match (&self.pattern, self.whitespace) {
            (Some(_), true) => bail!("--pattern and --whitespace are mutually exclusive"),
            (Some(pattern), false) => Boundary::Pattern(pattern.clone()),
            (None, true) => Boundary::Whitespace,
            (None, false) => Boundary::Alphanumeric,
        };

        let mut config = DiffConfig::default()
            .with_boundary(boundary)
            .with_case_insensitive(!self.case_sensitive)
            .with_try_hard(self.try_hard);

        match (&self.keep, self.simplify) {
            (Some(keep), _) => {
                config = config.with_simplify(
                    keep.split(',')
                        .map(str::trim)
                        .filter(|tag| !tag.is_empty()),
                );
            }
            (None, true) => config = config.with_default_simplify(),
            (None, false) => {}
        }

        if let Some(command) = &self.diff_cmd {
            config = config.with_engine(AlignEngine::Command(command.into()));
        }

        Ok(config)
    }
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    let args_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    facet_args::from_slice(&args_refs).map_err(|e| {
        eprintln!("{:?}", miette::Report::new(e));
        "Failed to parse arguments".to_string()
    })
}

fn print_stats(stats: &RedlineStats) {
    if stats.is_unchanged() {
        eprintln!("{}", "No changes".green());
        return;
    }
    eprintln!(
        "{} {} word(s) in {} run(s), {} {} word(s) in {} run(s)",
        "inserted".green().bold(),
        stats.inserted_words,
        stats.insertion_runs,
        "deleted".red().bold(),
        stats.deleted_words,
        stats.deletion_runs,
    );
    eprintln!(
        "{}",
        format!(
            "original: {} word(s), revised: {} word(s)",
            stats.original_words, stats.revised_words
        )
        .dimmed()
    );
}

fn run(args: Args) -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("html_redline=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let builder = DiffBuilder::new(args.config()?)?;

    let old = fs_err::read_to_string(&args.old)?;
    let new = fs_err::read_to_string(&args.new)?;

    tracing::debug!(old = %args.old, new = %args.new, "building redline");
    let redline = builder
        .build_report(&old, &new)
        .wrap_err_with(|| format!("failed to diff {} against {}", args.old, args.new))?;

    match &args.output {
        Some(path) => {
            fs_err::write(path, &redline.html)?;
            tracing::info!("wrote {path}");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(redline.html.as_bytes())?;
            stdout.flush()?;
        }
    }

    if args.stats {
        print_stats(&redline.stats);
    }

    Ok(())
}

fn main() -> ExitCode {
    // Set up miette for nice error formatting
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .build(),
        )
    }))
    .ok();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["old.html", "new.html"];
        argv.extend_from_slice(extra);
        facet_args::from_slice(&argv).unwrap()
    }

    #[test]
    fn test_defaults_match_library_defaults() {
        let args = args(&[]);
        assert_eq!(args.old, "old.html");
        assert_eq!(args.new, "new.html");
        assert!(args.output.is_none());
        assert_eq!(args.config().unwrap(), DiffConfig::default());
    }

    #[test]
    fn test_flags_map_onto_config() {
        let config = args(&["--whitespace", "--case-sensitive", "--try-hard"])
            .config()
            .unwrap();
        assert_eq!(config.boundary, Boundary::Whitespace);
        assert!(!config.case_insensitive);
        assert!(config.try_hard);
    }

    #[test]
    fn test_keep_implies_simplify() {
        let config = args(&["--keep", "p, li,,em"]).config().unwrap();
        assert!(config.simplify);
        assert_eq!(config.simplify_keep, ["p", "li", "em"]);
    }

    #[test]
    fn test_diff_cmd_selects_external_engine() {
        let config = args(&["--diff-cmd", "/usr/bin/diff"]).config().unwrap();
        assert_eq!(config.engine, AlignEngine::Command("/usr/bin/diff".into()));
    }

    #[test]
    fn test_pattern_and_whitespace_conflict() {
        assert!(args(&["--pattern", "\\s+", "--whitespace"]).config().is_err());
    }
}
