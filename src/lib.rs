/*!
A small regular expression core with three interchangeable matching
strategies.

A pattern is compiled once (lexer, recursive descent parser, AST) and can
then be evaluated by any of three engines:

* [`Backtracker`]: a continuation-passing backtracker with a configurable
  backtrack budget. Leftmost-first `find` semantics, like most backtracking
  engines.
* [`PikeVM`]: a simulation of the Thompson NFA that tracks all live states
  at once. Linear time in the input, leftmost-longest `find` semantics.
* [`HybridMatcher`]: a lazy DFA built on top of the NFA by subset
  construction, determinizing one transition at a time as the input demands.

All three implement the [`Matcher`] trait and agree on `match_full`. The
[`Engine`] façade adds pattern/input validation, a bounded compiled-pattern
cache and the find-all/replace/split operations on top.

# Example

```
use regex_engines::{Engine, Strategy};

let engine = Engine::new();
let result = engine.find("[0-9]+", "abc 123 def 456", Strategy::Backtracking)?;
let span = result.span().unwrap();
assert_eq!((4, 7), (span.start, span.end));
assert_eq!(Some("123"), result.text());
# Ok::<(), regex_engines::Error>(())
```

# Supported syntax

Literals, `.` (any character except `\n` and `\r`), `*`, `+`, `?` (greedy),
`|`, `( )` grouping, `[ ]` character classes with ranges and `^` negation,
and the escapes `\t`, `\s`, `\n`, `\r`, `\\` plus escaped metacharacters.
Nothing else; in particular no anchors, capture groups, bounded repetition
or lazy quantifiers.
*/

pub use crate::{
    backtrack::Backtracker,
    cache::PatternCache,
    config::Config,
    engine::{CompiledPattern, Engine, Replacement, Strategy},
    error::{Error, ErrorKind},
    hybrid::HybridMatcher,
    matcher::{Match, MatchError, MatchErrorKind, MatchResult, Matcher, Span},
    pikevm::PikeVM,
};

mod backtrack;
mod cache;
mod config;
mod engine;
mod error;
mod hybrid;
mod matcher;
pub mod nfa;
mod pikevm;
mod sparse_set;
pub mod syntax;
