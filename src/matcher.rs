/*!
Types shared by the three matching engines: the [`Matcher`] trait, match
results and spans, runtime failures, and the input cursor.
*/

use std::fmt;
use std::time::{Duration, Instant};

/// A half-open range of code point offsets into the input.
///
/// Offsets count code points, not bytes: in `"aαb"` the `b` is at offset 2.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub(crate) fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A single match: where it is and what it matched.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Match {
    span: Span,
    text: String,
}

impl Match {
    pub(crate) fn new(span: Span, text: String) -> Match {
        Match { span, text }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The outcome of a match operation.
///
/// "No match" is a successful outcome, not an error; only resource-budget
/// violations surface as [`MatchError`]. For find-all, [`matches`] holds
/// every match in increasing start order and the top-level span mirrors the
/// first one.
///
/// [`matches`]: MatchResult::matches
#[derive(Clone, Debug)]
pub struct MatchResult {
    span: Option<Span>,
    text: Option<String>,
    matches: Vec<Match>,
    work: u64,
    elapsed: Duration,
}

impl MatchResult {
    pub(crate) fn found(
        span: Span,
        text: String,
        work: u64,
        elapsed: Duration,
    ) -> MatchResult {
        MatchResult {
            span: Some(span),
            text: Some(text),
            matches: Vec::new(),
            work,
            elapsed,
        }
    }

    pub(crate) fn none(work: u64, elapsed: Duration) -> MatchResult {
        MatchResult {
            span: None,
            text: None,
            matches: Vec::new(),
            work,
            elapsed,
        }
    }

    pub(crate) fn all(
        matches: Vec<Match>,
        work: u64,
        elapsed: Duration,
    ) -> MatchResult {
        let (span, text) = match matches.first() {
            None => (None, None),
            Some(m) => (Some(m.span()), Some(m.text().to_string())),
        };
        MatchResult { span, text, matches, work, elapsed }
    }

    pub fn is_match(&self) -> bool {
        self.span.is_some()
    }

    /// The span of the match (for find-all, of the first match), or `None`
    /// when nothing matched.
    pub fn span(&self) -> Option<Span> {
        self.span
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Every match found by a find-all operation, in increasing start
    /// order. Empty for other operations.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// How much work the engine did: backtracks for the backtracker, state
    /// visits for the NFA simulation, transitions for the DFA.
    pub fn work_units(&self) -> u64 {
        self.work
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// A runtime failure: a matcher exceeded one of its resource budgets.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchError {
    kind: MatchErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchErrorKind {
    /// The backtracker exhausted its backtrack budget.
    BacktrackLimit { limit: u64, actual: u64 },
    /// An engine exceeded its wall-clock budget.
    Timeout { timeout: Duration, elapsed: Duration },
}

impl MatchError {
    pub fn kind(&self) -> &MatchErrorKind {
        &self.kind
    }

    pub(crate) fn backtrack_limit(limit: u64, actual: u64) -> MatchError {
        MatchError { kind: MatchErrorKind::BacktrackLimit { limit, actual } }
    }

    pub(crate) fn timeout(timeout: Duration, elapsed: Duration) -> MatchError {
        MatchError { kind: MatchErrorKind::Timeout { timeout, elapsed } }
    }
}

impl std::error::Error for MatchError {}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            MatchErrorKind::BacktrackLimit { limit, actual } => write!(
                f,
                "backtrack limit exceeded: {} backtracks over a limit of {}",
                actual, limit,
            ),
            MatchErrorKind::Timeout { timeout, elapsed } => write!(
                f,
                "match timed out after {:?} (limit {:?})",
                elapsed, timeout,
            ),
        }
    }
}

/// A matching engine bound to one compiled pattern.
///
/// Matchers take `&mut self`: each carries per-run mutable state (counters,
/// the lazy DFA's transition cache) and is therefore single-owner. The
/// compiled pattern behind it is immutable and freely shared.
pub trait Matcher {
    /// Does the pattern match the entire input?
    fn match_full(&mut self, input: &str) -> Result<MatchResult, MatchError>;

    /// The first match in the input, trying each start position from the
    /// left.
    fn find(&mut self, input: &str) -> Result<MatchResult, MatchError>;

    /// Every non-overlapping match, left to right. A zero-width match
    /// advances the search by one position so iteration always progresses.
    fn find_all(&mut self, input: &str) -> Result<MatchResult, MatchError>;
}

/// The input to a single run, as code points, with a movable cursor.
pub(crate) struct Input {
    chars: Vec<char>,
    pos: usize,
}

impl Input {
    pub fn new(text: &str) -> Input {
        Input { chars: text.chars().collect(), pos: 0 }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    /// The code point under the cursor. Callers check `at_end` first.
    pub fn current(&self) -> char {
        self.chars[self.pos]
    }

    pub fn advance(&mut self) {
        self.pos += 1;
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn slice(&self, span: Span) -> String {
        self.chars[span.start..span.end].iter().collect()
    }
}

/// Tracks an operation's wall-clock budget from its entry.
pub(crate) struct Deadline {
    started: Instant,
    timeout: Duration,
}

impl Deadline {
    pub fn new(timeout: Duration) -> Deadline {
        Deadline { started: Instant::now(), timeout }
    }

    pub fn check(&self) -> Result<(), MatchError> {
        let elapsed = self.started.elapsed();
        if elapsed > self.timeout {
            return Err(MatchError::timeout(self.timeout, elapsed));
        }
        Ok(())
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
