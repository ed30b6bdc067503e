/*!
A lazy DFA built over the NFA by subset construction, one transition at a
time.

At construction only the start state exists: the ε-closure of the NFA start.
Each time the matcher needs a transition that has not been computed yet, the
subset construction runs for exactly that `(state, code point)` pair and the
result is cached in the state's transition map. Item sets are canonicalized
and deduplicated, so two walks that arrive at the same set of NFA states
share one DFA state.

The state count is capped: on adversarial inputs the cache could otherwise
grow with every distinct code point seen. When the cap is hit, the matcher
transparently re-runs the operation on the NFA simulation, which needs no
per-input memory.
*/

use std::time::Duration;

use log::debug;
use rustc_hash::FxHashMap;

use crate::matcher::{
    Deadline, Match, MatchError, MatchResult, Matcher, Span,
};
use crate::nfa::{self, NFA};
use crate::pikevm::PikeVM;
use crate::sparse_set::SparseSet;
use crate::syntax::ast::Ast;

/// The maximum number of DFA states a single matcher will materialize.
///
/// Subset construction can reach `2^n` states for an `n`-state NFA, and the
/// lazy transition cache grows with every distinct code point the input
/// presents. Past this many states the matcher abandons the DFA for the NFA
/// simulation rather than growing without bound.
const STATE_LIMIT: usize = 10_000;

/// An identifier for a lazily built DFA state.
pub type LazyStateID = usize;

/// The lazy cache ran out of room; the caller falls back to the NFA.
#[derive(Debug)]
pub(crate) struct CacheFull;

#[derive(Debug)]
struct CachedState {
    /// The canonical (sorted) set of NFA states this DFA state stands for.
    items: Box<[nfa::StateID]>,
    is_match: bool,
    /// Lazily filled transition table. Dead transitions are never stored.
    transitions: FxHashMap<char, LazyStateID>,
}

/// A DFA whose states and transitions materialize during matching.
#[derive(Debug)]
pub struct DFA {
    nfa: NFA,
    states: Vec<CachedState>,
    /// Canonical item set → existing state, the invariant that keeps the
    /// state set deduplicated.
    index: FxHashMap<Box<[nfa::StateID]>, LazyStateID>,
    start: LazyStateID,
    // Scratch for subset construction, reused across transitions.
    scratch: SparseSet,
    stack: Vec<nfa::StateID>,
}

impl DFA {
    pub fn new(nfa: NFA) -> DFA {
        let mut dfa = DFA {
            scratch: SparseSet::new(nfa.len()),
            stack: Vec::new(),
            nfa,
            states: Vec::new(),
            index: FxHashMap::default(),
            start: 0,
        };
        let mut set = SparseSet::new(dfa.nfa.len());
        let mut stack = Vec::new();
        dfa.nfa.epsilon_closure(dfa.nfa.start(), &mut set, &mut stack);
        let items = canonical(&set);
        dfa.start = dfa
            .add_state(items)
            .expect("start state is within any limit");
        dfa
    }

    pub fn start(&self) -> LazyStateID {
        self.start
    }

    /// The number of DFA states materialized so far.
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn is_match_state(&self, id: LazyStateID) -> bool {
        self.states[id].is_match
    }

    /// The transition out of `from` on `ch`, computing and caching it on
    /// first use. `None` is the dead state: no NFA state survives `ch`.
    pub(crate) fn next_state(
        &mut self,
        from: LazyStateID,
        ch: char,
    ) -> Result<Option<LazyStateID>, CacheFull> {
        if let Some(&target) = self.states[from].transitions.get(&ch) {
            return Ok(Some(target));
        }
        // move(items, ch) followed by ε-closure.
        let mut scratch = std::mem::take(&mut self.scratch);
        let mut stack = std::mem::take(&mut self.stack);
        scratch.clear();
        for i in 0..self.states[from].items.len() {
            let id = self.states[from].items[i];
            if let Some(target) = self.nfa.step(id, ch) {
                self.nfa.epsilon_closure(target, &mut scratch, &mut stack);
            }
        }
        let result = if scratch.is_empty() {
            // Dead. Deliberately not cached: storing a negative entry per
            // unseen code point would grow the table without bound.
            Ok(None)
        } else {
            let items = canonical(&scratch);
            match self.intern(items) {
                Err(CacheFull) => Err(CacheFull),
                Ok(target) => {
                    self.states[from].transitions.insert(ch, target);
                    Ok(Some(target))
                }
            }
        };
        self.scratch = scratch;
        self.stack = stack;
        result
    }

    /// Returns the state for `items`, reusing an existing state with the
    /// same item set.
    fn intern(
        &mut self,
        items: Box<[nfa::StateID]>,
    ) -> Result<LazyStateID, CacheFull> {
        if let Some(&existing) = self.index.get(&items) {
            return Ok(existing);
        }
        self.add_state(items)
    }

    fn add_state(
        &mut self,
        items: Box<[nfa::StateID]>,
    ) -> Result<LazyStateID, CacheFull> {
        if self.states.len() >= STATE_LIMIT {
            return Err(CacheFull);
        }
        let is_match = items.iter().any(|&id| self.nfa.is_match(id));
        let id = self.states.len();
        self.index.insert(items.clone(), id);
        self.states.push(CachedState {
            items,
            is_match,
            transitions: FxHashMap::default(),
        });
        Ok(id)
    }

    fn clone_nfa(&self) -> NFA {
        self.nfa.clone()
    }
}

fn canonical(set: &SparseSet) -> Box<[nfa::StateID]> {
    let mut items: Vec<nfa::StateID> = set.iter().collect();
    items.sort_unstable();
    items.into_boxed_slice()
}

/// The lazy DFA engine, bound to one compiled pattern.
///
/// Semantics match the NFA simulation exactly (leftmost-longest `find`);
/// only the mechanics differ: a table walk over cached transitions instead
/// of a live state set.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use regex_engines::{syntax, HybridMatcher, Matcher};
///
/// let ast = syntax::parse("[a-z]+")?;
/// let mut matcher = HybridMatcher::new(&ast, Duration::from_secs(30));
/// assert!(matcher.match_full("hello")?.is_match());
/// assert!(!matcher.match_full("hello123")?.is_match());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct HybridMatcher {
    dfa: DFA,
    timeout: Duration,
}

impl HybridMatcher {
    pub fn new(ast: &Ast, timeout: Duration) -> HybridMatcher {
        HybridMatcher { dfa: DFA::new(NFA::new(ast)), timeout }
    }

    /// The lazy DFA's state cache filled up; rerun on the NFA simulation.
    fn fallback(&self) -> PikeVM {
        debug!(
            "lazy DFA hit its state limit ({} states); \
             falling back to the NFA simulation",
            self.dfa.state_count(),
        );
        PikeVM::from_nfa(self.dfa.clone_nfa(), self.timeout)
    }

    fn find_from(
        &mut self,
        chars: &[char],
        from: usize,
        deadline: &Deadline,
        work: &mut u64,
    ) -> Result<Result<Option<Span>, CacheFull>, MatchError> {
        for start in from..=chars.len() {
            deadline.check()?;
            let mut current = self.dfa.start();
            let mut last_accept = if self.dfa.is_match_state(current) {
                Some(start)
            } else {
                None
            };
            for (offset, &ch) in chars[start..].iter().enumerate() {
                deadline.check()?;
                *work += 1;
                match self.dfa.next_state(current, ch) {
                    Err(CacheFull) => return Ok(Err(CacheFull)),
                    Ok(None) => break,
                    Ok(Some(next)) => current = next,
                }
                if self.dfa.is_match_state(current) {
                    last_accept = Some(start + offset + 1);
                }
            }
            if let Some(end) = last_accept {
                return Ok(Ok(Some(Span::new(start, end))));
            }
        }
        Ok(Ok(None))
    }
}

impl Matcher for HybridMatcher {
    fn match_full(&mut self, input: &str) -> Result<MatchResult, MatchError> {
        let deadline = Deadline::new(self.timeout);
        let chars: Vec<char> = input.chars().collect();
        let mut work = 0;
        let mut current = self.dfa.start();
        for &ch in &chars {
            deadline.check()?;
            work += 1;
            match self.dfa.next_state(current, ch) {
                Err(CacheFull) => return self.fallback().match_full(input),
                Ok(None) => {
                    return Ok(MatchResult::none(work, deadline.elapsed()))
                }
                Ok(Some(next)) => current = next,
            }
        }
        Ok(if self.dfa.is_match_state(current) {
            let span = Span::new(0, chars.len());
            MatchResult::found(span, input.to_string(), work, deadline.elapsed())
        } else {
            MatchResult::none(work, deadline.elapsed())
        })
    }

    fn find(&mut self, input: &str) -> Result<MatchResult, MatchError> {
        let deadline = Deadline::new(self.timeout);
        let chars: Vec<char> = input.chars().collect();
        let mut work = 0;
        let span = match self.find_from(&chars, 0, &deadline, &mut work)? {
            Err(CacheFull) => return self.fallback().find(input),
            Ok(span) => span,
        };
        Ok(match span {
            Some(span) => {
                let text: String =
                    chars[span.start..span.end].iter().collect();
                MatchResult::found(span, text, work, deadline.elapsed())
            }
            None => MatchResult::none(work, deadline.elapsed()),
        })
    }

    fn find_all(&mut self, input: &str) -> Result<MatchResult, MatchError> {
        let deadline = Deadline::new(self.timeout);
        let chars: Vec<char> = input.chars().collect();
        let mut work = 0;
        let mut matches = Vec::new();
        let mut search_start = 0;
        while search_start <= chars.len() {
            deadline.check()?;
            let span = match self
                .find_from(&chars, search_start, &deadline, &mut work)?
            {
                Err(CacheFull) => return self.fallback().find_all(input),
                Ok(None) => break,
                Ok(Some(span)) => span,
            };
            let text: String = chars[span.start..span.end].iter().collect();
            matches.push(Match::new(span, text));
            search_start = span.end.max(span.start + 1);
        }
        Ok(MatchResult::all(matches, work, deadline.elapsed()))
    }
}
