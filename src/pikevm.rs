/*!
An NFA simulation in the style of Pike's VM: the set of every live NFA
state is advanced across the input in lockstep, one code point at a time.

No backtracking ever happens, so matching is linear in the input for a
fixed pattern: the pathological patterns that blow up the backtracker are
handled in the same time as any other. `find` is leftmost-longest: for the
first viable start position, the simulation keeps going and records the
last position at which an accept state was live.
*/

use std::mem;
use std::time::Duration;

use crate::matcher::{
    Deadline, Match, MatchError, MatchResult, Matcher, Span,
};
use crate::nfa::NFA;
use crate::sparse_set::SparseSet;
use crate::syntax::ast::Ast;

/// The NFA simulation engine, bound to one compiled pattern.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use regex_engines::{syntax, Matcher, PikeVM};
///
/// let ast = syntax::parse("a|ab")?;
/// let mut vm = PikeVM::new(&ast, Duration::from_secs(30));
/// // Leftmost-longest: the simulation extends past the shorter branch.
/// let result = vm.find("ab")?;
/// assert_eq!(Some("ab"), result.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PikeVM {
    nfa: NFA,
    timeout: Duration,
    // Simulation scratch, reused across runs.
    curr: SparseSet,
    next: SparseSet,
    stack: Vec<usize>,
}

impl PikeVM {
    pub fn new(ast: &Ast, timeout: Duration) -> PikeVM {
        PikeVM::from_nfa(NFA::new(ast), timeout)
    }

    pub(crate) fn from_nfa(nfa: NFA, timeout: Duration) -> PikeVM {
        let len = nfa.len();
        PikeVM {
            nfa,
            timeout,
            curr: SparseSet::new(len),
            next: SparseSet::new(len),
            stack: Vec::new(),
        }
    }

    /// Seeds `curr` with the ε-closure of the start state.
    fn start_set(&mut self, work: &mut u64) {
        self.curr.clear();
        *work +=
            self.nfa.epsilon_closure(self.nfa.start(), &mut self.curr, &mut self.stack);
    }

    /// Advances the live set over `ch`. Returns true while any state is
    /// live.
    fn step_set(&mut self, ch: char, work: &mut u64) -> bool {
        self.next.clear();
        for id in self.curr.iter() {
            *work += 1;
            if let Some(target) = self.nfa.step(id, ch) {
                *work += self.nfa.epsilon_closure(
                    target,
                    &mut self.next,
                    &mut self.stack,
                );
            }
        }
        mem::swap(&mut self.curr, &mut self.next);
        !self.curr.is_empty()
    }

    fn any_match(&self) -> bool {
        self.curr.iter().any(|id| self.nfa.is_match(id))
    }

    /// The first match at or after `from`: the smallest start position from
    /// which an accept state is ever reached, paired with the largest end
    /// recorded for that start.
    fn find_from(
        &mut self,
        chars: &[char],
        from: usize,
        deadline: &Deadline,
        work: &mut u64,
    ) -> Result<Option<Span>, MatchError> {
        for start in from..=chars.len() {
            deadline.check()?;
            self.start_set(work);
            let mut last_accept =
                if self.any_match() { Some(start) } else { None };
            for (offset, &ch) in chars[start..].iter().enumerate() {
                deadline.check()?;
                if !self.step_set(ch, work) {
                    break;
                }
                if self.any_match() {
                    last_accept = Some(start + offset + 1);
                }
            }
            if let Some(end) = last_accept {
                return Ok(Some(Span::new(start, end)));
            }
        }
        Ok(None)
    }
}

impl Matcher for PikeVM {
    fn match_full(&mut self, input: &str) -> Result<MatchResult, MatchError> {
        let deadline = Deadline::new(self.timeout);
        let chars: Vec<char> = input.chars().collect();
        let mut work = 0;
        self.start_set(&mut work);
        for &ch in &chars {
            deadline.check()?;
            if !self.step_set(ch, &mut work) {
                return Ok(MatchResult::none(work, deadline.elapsed()));
            }
        }
        Ok(if self.any_match() {
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
        Ok(match self.find_from(&chars, 0, &deadline, &mut work)? {
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
                None => break,
                Some(span) => span,
            };
            let text: String = chars[span.start..span.end].iter().collect();
            matches.push(Match::new(span, text));
            // Past the match, or one past a zero-width match.
            search_start = span.end.max(span.start + 1);
        }
        Ok(MatchResult::all(matches, work, deadline.elapsed()))
    }
}
