//! Discovery orchestration: routing, option listings, subcommand listings
//! and the one-level look-ahead.

use std::cmp::Ordering;
use std::collections::HashMap;

use climb_core::{CommandPath, DiscoveryEntry, HelpParseResult, ParsedCommand, ParsedOption};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::capture::capture_help;
use crate::config::DiscoverConfig;
use crate::error::DiscoverError;
use crate::executor::ProcessRunner;
use crate::parser::HelpParser;
use crate::registry::RegistryClient;
use crate::render::Report;

/// First tokens that belong to the registry fast-path.
pub const RESERVED_TOKENS: &[&str] = &["servers", "tools", "groups", "prompts", "tool"];

/// Trailing path segment that requests an option listing.
pub const OPTIONS_MARKER: &str = "--";

/// Upper bound on concurrent look-ahead probes.
pub const MAX_PROBE_JOBS: usize = 8;

const NO_OPTIONS: &str = "(no options detected)";
const NO_SUBCOMMANDS: &str = "(no further subcommands detected)";

/// What a generic discovery lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    Subcommands,
    Options,
}

/// Where an invocation is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The registry CLI, handled through its structured listings.
    Registry { path: Vec<String> },
    /// Any other program, handled by help-text inference.
    Generic {
        target: String,
        path: CommandPath,
        listing: Listing,
    },
}

/// Resolves the target program, path and listing mode for `args`.
///
/// A first token that is not reserved names the target; otherwise the
/// configured default target is used and every token is path.
pub fn route(args: &[String], config: &DiscoverConfig) -> Result<Route, DiscoverError> {
    let (target, rest) = match args.split_first() {
        Some((first, rest)) if !RESERVED_TOKENS.contains(&first.as_str()) => {
            (first.clone(), rest)
        }
        _ => {
            let target = config.default_target().ok_or(DiscoverError::MissingTarget)?;
            (target.to_string(), args)
        }
    };

    if target == config.registry_program {
        return Ok(Route::Registry {
            path: rest.to_vec(),
        });
    }

    let (listing, segments) = match rest.split_last() {
        Some((last, base)) if last == OPTIONS_MARKER => (Listing::Options, base),
        _ => (Listing::Subcommands, rest),
    };
    Ok(Route::Generic {
        target,
        path: CommandPath::from_segments(segments.iter().cloned()),
        listing,
    })
}

/// Formats an option as `<names joined by ','> <argument>`.
///
/// ```
/// use climb_core::ParsedOption;
/// use climb_discovery::discover::format_option;
///
/// let option = ParsedOption::long("--output").with_short("-o").with_argument("<file>");
/// assert_eq!(format_option(&option), "-o,--output <file>");
/// ```
pub fn format_option(option: &ParsedOption) -> String {
    let names = option.names().join(",");
    match &option.argument {
        Some(argument) => format!("{names} {argument}"),
        None => names,
    }
}

/// Case-insensitive ASCII name order, ties broken by the raw name.
fn by_name(left: &str, right: &str) -> Ordering {
    left.to_ascii_lowercase()
        .cmp(&right.to_ascii_lowercase())
        .then_with(|| left.cmp(right))
}

/// Filters, deduplicates, sorts and caps parsed candidates for `path`.
///
/// Candidates below `min_confidence` or naming a segment already in `path`
/// are dropped, duplicate names keep their highest confidence, and at most
/// `cap` survive.
pub fn select_candidates(
    commands: &[ParsedCommand],
    path: &CommandPath,
    min_confidence: f64,
    cap: usize,
) -> Vec<ParsedCommand> {
    let mut best: HashMap<&str, &ParsedCommand> = HashMap::new();
    for command in commands {
        if command.confidence < min_confidence || path.contains(&command.name) {
            continue;
        }
        best.entry(command.name.as_str())
            .and_modify(|kept| {
                if command.confidence > kept.confidence {
                    *kept = command;
                }
            })
            .or_insert(command);
    }

    let mut selected: Vec<ParsedCommand> = best.into_values().cloned().collect();
    selected.sort_by(|left, right| by_name(&left.name, &right.name));
    selected.truncate(cap);
    selected
}

/// Runs discoveries against one [`ProcessRunner`].
pub struct Discoverer<'a> {
    runner: &'a dyn ProcessRunner,
    config: &'a DiscoverConfig,
    parser: HelpParser,
}

impl<'a> Discoverer<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, config: &'a DiscoverConfig) -> Self {
        Self {
            runner,
            config,
            parser: HelpParser::new(),
        }
    }

    /// Routes `args` and renders the resulting report.
    ///
    /// Only an unresolvable target fails; every probe or listing failure
    /// degrades to empty data inside the report.
    pub fn run(&self, args: &[String]) -> Result<Report, DiscoverError> {
        let route = route(args, self.config)?;
        info!(?route, "Routing discovery");
        let report = match route {
            Route::Registry { path } => RegistryClient::new(self.runner, self.config).discover(&path),
            Route::Generic {
                target,
                path,
                listing: Listing::Options,
            } => self.list_options(&target, &path),
            Route::Generic {
                target,
                path,
                listing: Listing::Subcommands,
            } => self.list_subcommands(&target, &path),
        };
        Ok(report)
    }

    fn capture(&self, target: &str, path: &CommandPath) -> String {
        capture_help(self.runner, target, path, self.config.help_timeout())
    }

    /// Formatted options of `path`, sorted and capped.
    pub fn options(&self, target: &str, path: &CommandPath) -> Vec<String> {
        let help = self.capture(target, path);
        option_lines(&self.parser.parse(&help).options, self.config.max_options)
    }

    pub fn list_options(&self, target: &str, path: &CommandPath) -> Report {
        let options = self.options(target, path);
        options_report(&title(target, path), &options)
    }

    /// Subcommands of `path` with their look-ahead flags, in display order.
    pub fn entries(&self, target: &str, path: &CommandPath) -> Vec<DiscoveryEntry> {
        let help = self.capture(target, path);
        let parsed = self.parser.parse(&help);
        let candidates = select_candidates(
            &parsed.commands,
            path,
            self.config.min_confidence,
            self.config.max_subcommands,
        );
        debug!(
            target,
            path = %path,
            parsed = parsed.commands.len(),
            selected = candidates.len(),
            "Selected subcommand candidates"
        );
        self.look_ahead(target, path, &candidates)
    }

    pub fn list_subcommands(&self, target: &str, path: &CommandPath) -> Report {
        let entries = self.entries(target, path);
        subcommands_report(&title(target, path), &entries)
    }

    /// Probes each candidate once. Output order follows `candidates`
    /// regardless of how the probes are scheduled.
    fn look_ahead(
        &self,
        target: &str,
        path: &CommandPath,
        candidates: &[ParsedCommand],
    ) -> Vec<DiscoveryEntry> {
        let probe = |candidate: &ParsedCommand| DiscoveryEntry {
            name: candidate.name.clone(),
            confidence: candidate.confidence,
            has_subcommands: self.has_subcommands(target, path, &candidate.name),
        };

        let jobs = self.config.probe_jobs.min(MAX_PROBE_JOBS);
        if jobs <= 1 || candidates.len() <= 1 {
            return candidates.iter().map(probe).collect();
        }
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(|| candidates.par_iter().map(probe).collect()),
            Err(err) => {
                warn!(error = %err, "Falling back to sequential look-ahead");
                candidates.iter().map(probe).collect()
            }
        }
    }

    /// `true` when the candidate's own help lists a command other than itself.
    fn has_subcommands(&self, target: &str, path: &CommandPath, name: &str) -> bool {
        let child = path.child(name);
        let help = self.capture(target, &child);
        if help.trim().is_empty() {
            return false;
        }
        self.parser
            .parse(&help)
            .commands
            .iter()
            .any(|command| command.name != name)
    }
}

/// Sorted (byte order), deduplicated option lines, at most `cap`.
pub fn option_lines(options: &[ParsedOption], cap: usize) -> Vec<String> {
    let mut lines: Vec<String> = options.iter().map(format_option).collect();
    lines.sort();
    lines.dedup();
    lines.truncate(cap);
    lines
}

fn options_report(title: &str, lines: &[String]) -> Report {
    let mut report = Report::titled(format!("{title} options"));
    if lines.is_empty() {
        report.tree(&[NO_OPTIONS], 1);
    } else {
        report.tree(lines, 1);
    }
    report
}

fn subcommands_report(title: &str, entries: &[DiscoveryEntry]) -> Report {
    let mut report = Report::titled(title);
    if entries.is_empty() {
        report.tree(&[NO_SUBCOMMANDS], 1);
    } else {
        let labels: Vec<String> = entries.iter().map(DiscoveryEntry::label).collect();
        report.tree(&labels, 1);
    }
    report
}

/// Renders already-parsed help without running anything.
///
/// Subcommands go through the same selection as a live listing but are
/// never probed, so no entry is marked `sub`.
pub fn parsed_report(
    title: &str,
    parsed: &HelpParseResult,
    listing: Listing,
    config: &DiscoverConfig,
) -> Report {
    match listing {
        Listing::Options => options_report(title, &option_lines(&parsed.options, config.max_options)),
        Listing::Subcommands => {
            let entries: Vec<DiscoveryEntry> = select_candidates(
                &parsed.commands,
                &CommandPath::root(),
                config.min_confidence,
                config.max_subcommands,
            )
            .into_iter()
            .map(|command| DiscoveryEntry {
                name: command.name,
                confidence: command.confidence,
                has_subcommands: false,
            })
            .collect();
            subcommands_report(title, &entries)
        }
    }
}

fn title(target: &str, path: &CommandPath) -> String {
    if path.is_root() {
        target.to_string()
    } else {
        format!("{target} {path}")
    }
}

/// Routes and renders one discovery.
pub fn discover(
    runner: &dyn ProcessRunner,
    config: &DiscoverConfig,
    args: &[String],
) -> Result<Report, DiscoverError> {
    Discoverer::new(runner, config).run(args)
}
