/*!
The operations surface: validates arguments, compiles (or fetches cached)
patterns and dispatches to the selected engine.

Every operation follows the same sequence: check the pattern and input
against the configured length limits, obtain the compiled pattern, build the
chosen matcher bound to it, run, and hand back the result.
*/

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::backtrack::Backtracker;
use crate::cache::PatternCache;
use crate::config::Config;
use crate::error::Error;
use crate::hybrid::HybridMatcher;
use crate::matcher::{MatchError, MatchResult, Matcher};
use crate::pikevm::PikeVM;
use crate::syntax::{self, Ast};

/// Which matching engine to run.
///
/// The engines agree on `match_full`. For `find`, the backtracker is
/// leftmost-first while `Nfa` and `Dfa` are leftmost-longest, so they can
/// report different end positions for patterns like `a|ab`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Strategy {
    /// Continuation-passing backtracking with a backtrack budget.
    #[default]
    Backtracking,
    /// NFA simulation; linear time, immune to catastrophic backtracking.
    Nfa,
    /// Lazy DFA; linear time with cached transitions.
    Dfa,
}

/// A parsed pattern plus compile-time diagnostics.
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    pattern: String,
    ast: Arc<Ast>,
    compile_time: Duration,
    description: String,
}

impl CompiledPattern {
    /// The verbatim pattern string this was compiled from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn compile_time(&self) -> Duration {
        self.compile_time
    }

    /// An indented pretty-print of the AST, for diagnostics only.
    pub fn description(&self) -> &str {
        &self.description
    }

    #[cfg(test)]
    pub(crate) fn for_tests(pattern: &str) -> CompiledPattern {
        let ast = syntax::parse(pattern).unwrap();
        CompiledPattern {
            pattern: pattern.to_string(),
            description: ast.to_string(),
            ast: Arc::new(ast),
            compile_time: Duration::ZERO,
        }
    }
}

/// The result of a replace operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Replacement {
    text: String,
    count: usize,
}

impl Replacement {
    /// The input with every match replaced.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// How many replacements were made.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// The façade over compilation, caching and the three engines.
///
/// An `Engine` owns a configuration and (unless disabled) a shared cache of
/// compiled patterns. Operations take the pattern each call, so one engine
/// serves arbitrarily many patterns.
///
/// ```
/// use regex_engines::{Engine, Strategy};
///
/// let engine = Engine::new();
/// let replaced =
///     engine.replace("[0-9]+", "Order 123 and 456", "XXX", Strategy::Dfa)?;
/// assert_eq!("Order XXX and XXX", replaced.text());
/// assert_eq!(2, replaced.count());
/// # Ok::<(), regex_engines::Error>(())
/// ```
pub struct Engine {
    config: Config,
    cache: Option<PatternCache>,
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

impl Engine {
    /// An engine with the default configuration.
    pub fn new() -> Engine {
        Engine::with_config(Config::new())
    }

    pub fn with_config(config: Config) -> Engine {
        let cache = if config.get_cache_enabled() {
            Some(PatternCache::new(config.get_cache_max_size()))
        } else {
            None
        };
        Engine { config, cache }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Compile a pattern, or fetch it from the cache.
    ///
    /// Compiling is also how a pattern is validated: a successful return
    /// means the pattern is well formed.
    pub fn compile(&self, pattern: &str) -> Result<Arc<CompiledPattern>, Error> {
        self.validate_pattern(pattern)?;
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(pattern) {
                debug!("pattern cache hit for {:?}", pattern);
                return Ok(hit);
            }
        }
        let started = Instant::now();
        let ast = syntax::parse(pattern)?;
        let compiled = Arc::new(CompiledPattern {
            pattern: pattern.to_string(),
            description: ast.to_string(),
            ast: Arc::new(ast),
            compile_time: started.elapsed(),
        });
        if let Some(cache) = &self.cache {
            cache.insert(pattern.to_string(), Arc::clone(&compiled));
        }
        debug!(
            "compiled pattern {:?} in {:?}",
            pattern,
            compiled.compile_time(),
        );
        Ok(compiled)
    }

    /// Does the pattern match the input in its entirety?
    pub fn match_full(
        &self,
        pattern: &str,
        input: &str,
        strategy: Strategy,
    ) -> Result<MatchResult, Error> {
        self.run(pattern, input, strategy, |m, input| m.match_full(input))
    }

    /// The first match in the input.
    pub fn find(
        &self,
        pattern: &str,
        input: &str,
        strategy: Strategy,
    ) -> Result<MatchResult, Error> {
        self.run(pattern, input, strategy, |m, input| m.find(input))
    }

    /// Every non-overlapping match in the input, left to right.
    pub fn find_all(
        &self,
        pattern: &str,
        input: &str,
        strategy: Strategy,
    ) -> Result<MatchResult, Error> {
        self.run(pattern, input, strategy, |m, input| m.find_all(input))
    }

    /// Replaces every match with `replacement`, taken literally; there is
    /// no back-substitution syntax.
    pub fn replace(
        &self,
        pattern: &str,
        input: &str,
        replacement: &str,
        strategy: Strategy,
    ) -> Result<Replacement, Error> {
        let result = self.find_all(pattern, input, strategy)?;
        if result.matches().is_empty() {
            return Ok(Replacement { text: input.to_string(), count: 0 });
        }
        let chars: Vec<char> = input.chars().collect();
        let mut text = String::with_capacity(input.len());
        let mut last = 0;
        for m in result.matches() {
            text.extend(&chars[last..m.start()]);
            text.push_str(replacement);
            last = m.end();
        }
        text.extend(&chars[last..]);
        Ok(Replacement { text, count: result.matches().len() })
    }

    /// Splits the input around every match. Matches abutting the input's
    /// edges produce empty leading/trailing parts; an input with no match
    /// comes back as a single part.
    pub fn split(
        &self,
        pattern: &str,
        input: &str,
        strategy: Strategy,
    ) -> Result<Vec<String>, Error> {
        let result = self.find_all(pattern, input, strategy)?;
        if result.matches().is_empty() {
            return Ok(vec![input.to_string()]);
        }
        let chars: Vec<char> = input.chars().collect();
        let mut parts = Vec::with_capacity(result.matches().len() + 1);
        let mut last = 0;
        for m in result.matches() {
            parts.push(chars[last..m.start()].iter().collect());
            last = m.end();
        }
        parts.push(chars[last..].iter().collect());
        Ok(parts)
    }

    /// The number of patterns currently cached. Zero when caching is
    /// disabled.
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, PatternCache::len)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    fn run(
        &self,
        pattern: &str,
        input: &str,
        strategy: Strategy,
        op: impl FnOnce(&mut dyn Matcher, &str) -> Result<MatchResult, MatchError>,
    ) -> Result<MatchResult, Error> {
        self.validate_input(input)?;
        let compiled = self.compile(pattern)?;
        let timeout = self.config.get_timeout();
        let result = match strategy {
            Strategy::Backtracking => {
                let mut matcher = Backtracker::new(
                    compiled.ast(),
                    self.config.get_max_backtracks(),
                    timeout,
                );
                op(&mut matcher, input)
            }
            Strategy::Nfa => {
                let mut matcher = PikeVM::new(compiled.ast(), timeout);
                op(&mut matcher, input)
            }
            Strategy::Dfa => {
                let mut matcher = HybridMatcher::new(compiled.ast(), timeout);
                op(&mut matcher, input)
            }
        };
        result.map_err(Error::from)
    }

    fn validate_pattern(&self, pattern: &str) -> Result<(), Error> {
        let len = pattern.chars().count();
        let limit = self.config.get_max_pattern_length();
        if len > limit {
            return Err(Error::pattern_too_long(len, limit));
        }
        Ok(())
    }

    fn validate_input(&self, input: &str) -> Result<(), Error> {
        let len = input.chars().count();
        let limit = self.config.get_max_input_length();
        if len > limit {
            return Err(Error::input_too_long(len, limit));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::matcher::{MatchErrorKind, Span};

    const ENGINES: &[Strategy] =
        &[Strategy::Backtracking, Strategy::Nfa, Strategy::Dfa];

    #[test]
    fn default_strategy_is_backtracking() {
        assert_eq!(Strategy::Backtracking, Strategy::default());
    }

    #[test]
    fn match_full_across_engines() {
        let engine = Engine::new();
        for &strategy in ENGINES {
            let result =
                engine.match_full("[a-z]+", "hello", strategy).unwrap();
            assert!(result.is_match(), "{:?}", strategy);
            assert_eq!(Some(Span::new(0, 5)), result.span());
            assert_eq!(Some("hello"), result.text());
        }
    }

    #[test]
    fn compile_produces_diagnostics() {
        let engine = Engine::new();
        let compiled = engine.compile("a|b").unwrap();
        assert_eq!("a|b", compiled.pattern());
        assert!(compiled.description().starts_with("Alternation"));
    }

    #[test]
    fn compile_reports_offset_on_parse_error() {
        let engine = Engine::new();
        let err = engine.compile("ab[").unwrap_err();
        match err.kind() {
            ErrorKind::Syntax(parse_err) => {
                assert_eq!(2, parse_err.offset())
            }
            kind => panic!("expected syntax error, got {:?}", kind),
        }
    }

    #[test]
    fn over_length_pattern_is_invalid_argument() {
        let engine =
            Engine::with_config(Config::new().max_pattern_length(4));
        let err = engine.compile("abcde").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));
        assert_eq!("pattern length 5 exceeds maximum 4", err.to_string());
    }

    #[test]
    fn over_length_input_is_invalid_argument() {
        let engine = Engine::with_config(Config::new().max_input_length(3));
        let err = engine
            .match_full("a", "aaaa", Strategy::Backtracking)
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidArgument(_)));
    }

    #[test]
    fn compilation_populates_the_cache() {
        let engine = Engine::new();
        engine.compile("a+").unwrap();
        engine.compile("b+").unwrap();
        engine.compile("a+").unwrap();
        assert_eq!(2, engine.cache_len());
        engine.clear_cache();
        assert_eq!(0, engine.cache_len());
    }

    #[test]
    fn cache_can_be_disabled() {
        let engine = Engine::with_config(Config::new().cache_enabled(false));
        engine.compile("a+").unwrap();
        assert_eq!(0, engine.cache_len());
        // Still compiles fine, just reparsing each time.
        assert!(engine.match_full("a+", "aa", Strategy::Nfa).unwrap().is_match());
    }

    #[test]
    fn cache_respects_its_bound() {
        let engine = Engine::with_config(Config::new().cache_max_size(2));
        for pattern in ["a", "b", "c", "d"] {
            engine.compile(pattern).unwrap();
            assert!(engine.cache_len() <= 2);
        }
    }

    #[test]
    fn replace_with_no_match_returns_input() {
        let engine = Engine::new();
        let replaced = engine
            .replace("[0-9]+", "no digits here", "X", Strategy::Backtracking)
            .unwrap();
        assert_eq!("no digits here", replaced.text());
        assert_eq!(0, replaced.count());
    }

    #[test]
    fn replace_is_literal() {
        let engine = Engine::new();
        // `$0`-style syntax means nothing; the replacement is verbatim.
        let replaced = engine
            .replace("[0-9]+", "a 1 b 2", "$0", Strategy::Backtracking)
            .unwrap();
        assert_eq!("a $0 b $0", replaced.text());
    }

    #[test]
    fn split_with_no_match_is_singleton() {
        let engine = Engine::new();
        let parts =
            engine.split(",", "no commas", Strategy::Backtracking).unwrap();
        assert_eq!(vec!["no commas".to_string()], parts);
    }

    #[test]
    fn split_keeps_empty_edge_parts() {
        let engine = Engine::new();
        let parts = engine.split(",", ",a,b,", Strategy::Nfa).unwrap();
        assert_eq!(vec!["", "a", "b", ""], parts);
    }

    #[test]
    fn replace_handles_unicode_offsets() {
        let engine = Engine::new();
        let replaced = engine
            .replace("[0-9]+", "α 12 β 34", "#", Strategy::Dfa)
            .unwrap();
        assert_eq!("α # β #", replaced.text());
        assert_eq!(2, replaced.count());
    }

    #[test]
    fn backtrack_limit_surfaces_through_the_facade() {
        let engine =
            Engine::with_config(Config::new().max_backtracks(100));
        let input = "a".repeat(30) + "c";
        let err = engine
            .match_full("a*a*a*a*a*b", &input, Strategy::Backtracking)
            .unwrap_err();
        match err.kind() {
            ErrorKind::Match(match_err) => assert!(matches!(
                match_err.kind(),
                MatchErrorKind::BacktrackLimit { limit: 100, .. },
            )),
            kind => panic!("expected match error, got {:?}", kind),
        }
    }

    #[test]
    fn pathological_pattern_succeeds_on_automata_engines() {
        let engine =
            Engine::with_config(Config::new().max_backtracks(100));
        let input = "a".repeat(30) + "c";
        for strategy in [Strategy::Nfa, Strategy::Dfa] {
            let result = engine
                .match_full("a*a*a*a*a*b", &input, strategy)
                .unwrap();
            assert!(!result.is_match(), "{:?}", strategy);
        }
    }
}
