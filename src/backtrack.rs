/*!
A bounded backtracking matcher driven directly by the AST.

Matching is written in continuation-passing style: every node matches its
own piece of input and then invokes a continuation representing the rest of
the pattern. On the way back out each node restores the input cursor, which
is what lets an enclosing alternation or quantifier try its next
alternative. Greedy quantifiers collect their candidate positions in an
iterative loop first and only then feed the continuation, so recursion depth
is bounded by the pattern, never by the input.

Two budgets bound every run: a backtrack count and a wall-clock deadline.
*/

use std::time::Duration;

use crate::matcher::{
    Deadline, Input, Match, MatchError, MatchResult, Matcher, Span,
};
use crate::syntax::ast::{self, Ast};

/// A backtracking matcher bound to one parsed pattern.
///
/// `find` is leftmost-first: among matches at the same start position, the
/// one found by the first successful left-to-right exploration wins. This is
/// how backtracking engines usually behave and differs from the
/// leftmost-longest semantics of the NFA and DFA engines.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use regex_engines::{syntax, Backtracker, Matcher};
///
/// let ast = syntax::parse("[0-9]+")?;
/// let mut matcher = Backtracker::new(&ast, 100_000, Duration::from_secs(30));
/// let result = matcher.find("order 66")?;
/// assert_eq!(Some("66"), result.text());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Backtracker<'p> {
    ast: &'p Ast,
    max_backtracks: u64,
    timeout: Duration,
}

impl<'p> Backtracker<'p> {
    pub fn new(
        ast: &'p Ast,
        max_backtracks: u64,
        timeout: Duration,
    ) -> Backtracker<'p> {
        Backtracker { ast, max_backtracks, timeout }
    }

    fn run(&self) -> Run {
        Run {
            backtracks: 0,
            max_backtracks: self.max_backtracks,
            deadline: Deadline::new(self.timeout),
        }
    }
}

impl Matcher for Backtracker<'_> {
    fn match_full(&mut self, input: &str) -> Result<MatchResult, MatchError> {
        let mut run = self.run();
        let mut input = Input::new(input);
        let len = input.len();
        let matched = match_node(
            &mut run,
            &mut input,
            self.ast,
            // A full match must consume everything.
            &mut |_run: &mut Run, input: &mut Input| Ok(input.at_end()),
        )?;
        let elapsed = run.deadline.elapsed();
        Ok(if matched {
            let span = Span::new(0, len);
            let text = input.slice(span);
            MatchResult::found(span, text, run.backtracks, elapsed)
        } else {
            MatchResult::none(run.backtracks, elapsed)
        })
    }

    fn find(&mut self, input: &str) -> Result<MatchResult, MatchError> {
        let mut run = self.run();
        let mut input = Input::new(input);
        loop {
            let start = input.pos();
            let mut end = start;
            let matched = match_node(
                &mut run,
                &mut input,
                self.ast,
                &mut |_run: &mut Run, input: &mut Input| {
                    end = input.pos();
                    Ok(true)
                },
            )?;
            if matched {
                let span = Span::new(start, end);
                let text = input.slice(span);
                return Ok(MatchResult::found(
                    span,
                    text,
                    run.backtracks,
                    run.deadline.elapsed(),
                ));
            }
            if input.at_end() {
                return Ok(MatchResult::none(
                    run.backtracks,
                    run.deadline.elapsed(),
                ));
            }
            input.advance();
        }
    }

    fn find_all(&mut self, input: &str) -> Result<MatchResult, MatchError> {
        let mut run = self.run();
        let mut input = Input::new(input);
        let mut matches = Vec::new();
        while !input.at_end() {
            let start = input.pos();
            let mut end = start;
            let matched = match_node(
                &mut run,
                &mut input,
                self.ast,
                &mut |_run: &mut Run, input: &mut Input| {
                    end = input.pos();
                    Ok(true)
                },
            )?;
            if matched {
                let span = Span::new(start, end);
                matches.push(Match::new(span, input.slice(span)));
                // Step over the match, or by one position when it was
                // zero-width, so the scan always progresses.
                input.set_pos(if end > start { end } else { start + 1 });
            } else {
                input.advance();
            }
        }
        Ok(MatchResult::all(matches, run.backtracks, run.deadline.elapsed()))
    }
}

/// Mutable state of a single run.
struct Run {
    backtracks: u64,
    max_backtracks: u64,
    deadline: Deadline,
}

impl Run {
    fn check(&self) -> Result<(), MatchError> {
        if self.backtracks > self.max_backtracks {
            return Err(MatchError::backtrack_limit(
                self.max_backtracks,
                self.backtracks,
            ));
        }
        self.deadline.check()
    }
}

/// "What to match next". Invoked at the position reached by the current
/// node; its verdict propagates back out through the node's own result.
type Cont<'c> = dyn FnMut(&mut Run, &mut Input) -> Result<bool, MatchError> + 'c;

fn match_node(
    run: &mut Run,
    input: &mut Input,
    ast: &Ast,
    cont: &mut Cont<'_>,
) -> Result<bool, MatchError> {
    run.check()?;
    match ast {
        // The empty-pattern sentinel consumes nothing.
        Ast::Literal(ch) if *ch == ast::EMPTY => cont(run, input),
        Ast::Literal(ch) | Ast::Escaped(ch) => {
            let expect = *ch;
            match_one(run, input, |c| c == expect, cont)
        }
        Ast::Tab => match_one(run, input, |c| c == '\t', cont),
        Ast::Whitespace => match_one(run, input, ast::is_whitespace, cont),
        Ast::AnyChar => {
            match_one(run, input, |c| !ast::is_line_terminator(c), cont)
        }
        Ast::Class(set) => match_one(run, input, |c| set.contains(&c), cont),
        Ast::NegatedClass(set) => match_one(
            run,
            input,
            |c| !set.contains(&c) && !ast::is_line_terminator(c),
            cont,
        ),
        Ast::Concat(children) => match_concat(run, input, children, 0, cont),
        Ast::Alternation(children) => {
            match_alternation(run, input, children, cont)
        }
        Ast::Star(child) => match_repeat(run, input, child, 0, None, cont),
        Ast::Plus(child) => match_repeat(run, input, child, 1, None, cont),
        Ast::Question(child) => {
            match_repeat(run, input, child, 0, Some(1), cont)
        }
        // Grouping has no matching behavior of its own.
        Ast::Group(child) => match_node(run, input, child, cont),
    }
}

/// Matches a single code point satisfying `pred`, runs the continuation at
/// the advanced position, and restores the cursor before returning.
fn match_one(
    run: &mut Run,
    input: &mut Input,
    pred: impl Fn(char) -> bool,
    cont: &mut Cont<'_>,
) -> Result<bool, MatchError> {
    if input.at_end() || !pred(input.current()) {
        return Ok(false);
    }
    let saved = input.pos();
    input.advance();
    let result = cont(run, input);
    input.set_pos(saved);
    result
}

fn match_concat(
    run: &mut Run,
    input: &mut Input,
    children: &[Ast],
    at: usize,
    cont: &mut Cont<'_>,
) -> Result<bool, MatchError> {
    if at == children.len() {
        return cont(run, input);
    }
    match_node(run, input, &children[at], &mut |run, input| {
        match_concat(run, input, children, at + 1, &mut *cont)
    })
}

fn match_alternation(
    run: &mut Run,
    input: &mut Input,
    children: &[Ast],
    cont: &mut Cont<'_>,
) -> Result<bool, MatchError> {
    for (i, branch) in children.iter().enumerate() {
        if i > 0 {
            // Abandoning a branch is a backtrack.
            run.backtracks += 1;
            run.check()?;
        }
        if match_node(run, input, branch, &mut *cont)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Greedy bounded repetition: `min`..`max` iterations of `child`, `max` of
/// `None` meaning unbounded.
///
/// First the child is matched as many times as possible in a plain loop,
/// recording the input position after each iteration. Then the continuation
/// is tried from the most greedy position downward; every step down is a
/// backtrack. An iteration that succeeds without advancing the cursor stops
/// the loop (it could otherwise repeat forever) and counts toward the
/// minimum.
fn match_repeat(
    run: &mut Run,
    input: &mut Input,
    child: &Ast,
    min: usize,
    max: Option<usize>,
    cont: &mut Cont<'_>,
) -> Result<bool, MatchError> {
    let start = input.pos();
    // positions[i] is the cursor after i iterations.
    let mut positions = vec![start];
    let mut zero_width = false;
    loop {
        if let Some(max) = max {
            if positions.len() - 1 >= max {
                break;
            }
        }
        let before = input.pos();
        let mut end = before;
        let matched = match_node(
            run,
            input,
            child,
            &mut |_run: &mut Run, input: &mut Input| {
                end = input.pos();
                Ok(true)
            },
        )?;
        if !matched {
            break;
        }
        if end == before {
            zero_width = true;
            break;
        }
        input.set_pos(end);
        positions.push(end);
        run.check()?;
    }
    // A zero-width iteration satisfies any minimum without moving.
    let min = if zero_width { 0 } else { min };
    for i in (min..positions.len()).rev() {
        if i + 1 < positions.len() {
            run.backtracks += 1;
            run.check()?;
        }
        input.set_pos(positions[i]);
        if cont(run, input)? {
            input.set_pos(start);
            return Ok(true);
        }
    }
    input.set_pos(start);
    Ok(false)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::matcher::MatchErrorKind;
    use crate::syntax::parse;

    const LIMIT: u64 = 100_000;
    const TIMEOUT: Duration = Duration::from_secs(30);

    fn match_full(pattern: &str, input: &str) -> MatchResult {
        let ast = parse(pattern).unwrap();
        Backtracker::new(&ast, LIMIT, TIMEOUT).match_full(input).unwrap()
    }

    fn find(pattern: &str, input: &str) -> MatchResult {
        let ast = parse(pattern).unwrap();
        Backtracker::new(&ast, LIMIT, TIMEOUT).find(input).unwrap()
    }

    fn find_all(pattern: &str, input: &str) -> MatchResult {
        let ast = parse(pattern).unwrap();
        Backtracker::new(&ast, LIMIT, TIMEOUT).find_all(input).unwrap()
    }

    #[test]
    fn literals() {
        assert!(match_full("a", "a").is_match());
        assert!(!match_full("a", "b").is_match());
        assert!(match_full("hello", "hello").is_match());
        assert!(!match_full("hello", "hello world").is_match());
    }

    #[test]
    fn find_reports_position_and_text() {
        let result = find("hello", "say hello world");
        assert_eq!(Some(Span::new(4, 9)), result.span());
        assert_eq!(Some("hello"), result.text());
    }

    #[test]
    fn tab_escape() {
        assert!(match_full(r"\t", "\t").is_match());
        assert!(!match_full(r"\t", " ").is_match());
        assert!(match_full(r"a\tb", "a\tb").is_match());
        assert_eq!(Some(Span::new(5, 6)), find(r"\t", "hello\tworld").span());
    }

    #[test]
    fn whitespace_escape() {
        for ws in [" ", "\t", "\n", "\r", "\u{000C}", "\u{000B}"] {
            assert!(match_full(r"\s", ws).is_match(), "{:?}", ws);
        }
        assert!(!match_full(r"\s", "a").is_match());
        assert!(match_full(r"\s+", "   ").is_match());
    }

    #[test]
    fn escaped_metacharacters() {
        for (pattern, input) in [
            (r"\*", "*"),
            (r"\+", "+"),
            (r"\?", "?"),
            (r"\.", "."),
            (r"\|", "|"),
            (r"\(", "("),
            (r"\)", ")"),
            (r"\[", "["),
            (r"\]", "]"),
            (r"\\", "\\"),
        ] {
            assert!(match_full(pattern, input).is_match(), "{}", pattern);
        }
        assert!(!match_full(r"\.", "a").is_match());
    }

    #[test]
    fn any_char() {
        for input in ["a", "1", "!", " ", "\t", "α"] {
            assert!(match_full(".", input).is_match(), "{:?}", input);
        }
        assert!(!match_full(".", "\n").is_match());
        assert!(!match_full(".", "\r").is_match());
        assert_eq!(Some("hello"), match_full(".+", "hello").text());
    }

    #[test]
    fn character_classes() {
        for input in ["a", "b", "c"] {
            assert!(match_full("[abc]", input).is_match());
        }
        assert!(!match_full("[abc]", "d").is_match());
        assert!(match_full("[abc]+", "abcabc").is_match());
        assert!(match_full("[a-z]", "m").is_match());
        assert!(!match_full("[a-z]", "A").is_match());
        assert!(match_full("[a-zA-Z]", "Z").is_match());
        assert!(!match_full("[a-zA-Z]", "5").is_match());
    }

    #[test]
    fn negated_classes() {
        for input in ["d", "e", "x", "1"] {
            assert!(match_full("[^abc]", input).is_match());
        }
        for input in ["a", "b", "c"] {
            assert!(!match_full("[^abc]", input).is_match());
        }
        assert!(match_full("[^a-z]", "5").is_match());
        assert!(!match_full("[^a-z]", "m").is_match());
        // Negated classes never match line terminators.
        assert!(!match_full("[^a]", "\n").is_match());
    }

    #[test]
    fn star() {
        assert!(match_full("a*", "").is_match());
        assert!(match_full("a*", "a").is_match());
        assert_eq!(Some("aaaaa"), match_full("a*", "aaaaa").text());
        assert!(match_full("a*b", "aaab").is_match());
        // Greedy.
        assert_eq!(Some("aaa"), find("a*", "aaa").text());
    }

    #[test]
    fn plus() {
        assert!(!match_full("a+", "").is_match());
        assert!(match_full("a+", "a").is_match());
        assert_eq!(Some("aaaaa"), match_full("a+", "aaaaa").text());
        assert!(match_full("[a-z]+", "hello").is_match());
    }

    #[test]
    fn question() {
        assert!(match_full("a?", "").is_match());
        assert!(match_full("a?", "a").is_match());
        assert!(!match_full("a?", "aa").is_match());
        assert!(match_full("colou?r", "color").is_match());
        assert!(match_full("colou?r", "colour").is_match());
    }

    #[test]
    fn alternation() {
        assert!(match_full("a|b", "a").is_match());
        assert!(match_full("a|b", "b").is_match());
        assert!(!match_full("a|b", "c").is_match());
        assert!(match_full("cat|dog", "dog").is_match());
        assert!(!match_full("cat|dog", "bird").is_match());
        assert!(match_full("a|b|c", "c").is_match());
    }

    #[test]
    fn groups() {
        assert!(match_full("(ab)", "ab").is_match());
        assert!(match_full("(ab)+", "ababab").is_match());
        assert!(match_full("(cat|dog)s", "cats").is_match());
        assert!(match_full("(cat|dog)s", "dogs").is_match());
        assert!(match_full("((a)+)", "aaa").is_match());
    }

    #[test]
    fn find_all_words() {
        let result = find_all("[a-z]+", "hello world foo");
        let texts: Vec<&str> =
            result.matches().iter().map(|m| m.text()).collect();
        assert_eq!(vec!["hello", "world", "foo"], texts);
        let starts: Vec<usize> =
            result.matches().iter().map(|m| m.start()).collect();
        assert_eq!(vec![0, 6, 12], starts);
    }

    #[test]
    fn find_all_zero_width_progresses() {
        let result = find_all("a*", "bab");
        // One candidate per scan position; the zero-width ones advance by
        // one each time.
        assert!(result.matches().iter().all(|m| m.start() <= m.end()));
        let mut last_start = None;
        for m in result.matches() {
            if let Some(prev) = last_start {
                assert!(m.start() > prev);
            }
            last_start = Some(m.start());
        }
    }

    #[test]
    fn backtracking_is_counted() {
        let result = match_full("a*a", "aaa");
        assert!(result.is_match());
        assert!(result.work_units() > 0);
    }

    #[test]
    fn alternation_backtracks() {
        assert!(match_full("ab|ac", "ac").is_match());
    }

    #[test]
    fn backtrack_limit_is_enforced() {
        let ast = parse("a*a*a*a*a*b").unwrap();
        let mut matcher = Backtracker::new(&ast, 100, TIMEOUT);
        let input = "a".repeat(30) + "c";
        let err = matcher.match_full(&input).unwrap_err();
        match err.kind() {
            MatchErrorKind::BacktrackLimit { limit, actual } => {
                assert_eq!(100, *limit);
                assert!(*actual > 100);
            }
            kind => panic!("expected backtrack limit, got {:?}", kind),
        }
    }

    #[test]
    fn timeout_is_enforced() {
        let ast = parse("a*a*a*a*a*b").unwrap();
        let mut matcher =
            Backtracker::new(&ast, u64::MAX, Duration::ZERO);
        let input = "a".repeat(30) + "c";
        let err = matcher.match_full(&input).unwrap_err();
        assert!(matches!(err.kind(), MatchErrorKind::Timeout { .. }));
    }

    #[test]
    fn empty_pattern_matches_empty_input() {
        let result = match_full("", "");
        assert!(result.is_match());
        assert_eq!(Some(Span::new(0, 0)), result.span());
        assert!(!match_full("", "a").is_match());
        assert_eq!(Some(Span::new(0, 0)), find("", "abc").span());
    }

    #[test]
    fn zero_width_quantifier_iterations_terminate() {
        // `(a*)*` would loop forever without zero-width detection.
        assert!(match_full("(a*)*", "aaa").is_match());
        assert!(match_full("(a*)*", "").is_match());
        assert!(match_full("(a?)*", "aa").is_match());
        // A zero-width iteration satisfies a plus's minimum.
        assert!(match_full("(a?)+", "").is_match());
    }

    #[test]
    fn unicode_input() {
        assert!(match_full(".", "α").is_match());
        assert!(match_full("[α-γ]", "β").is_match());
        let result = find("[0-9]+", "αβ 42 γ");
        assert_eq!(Some(Span::new(3, 5)), result.span());
        assert_eq!(Some("42"), result.text());
    }

    #[test]
    fn complex_patterns() {
        let ident = "[a-zA-Z_][a-zA-Z0-9_]*";
        assert!(match_full(ident, "myVar").is_match());
        assert!(match_full(ident, "_private").is_match());
        assert!(!match_full(ident, "123var").is_match());

        let email = r"[a-z]+@[a-z]+\.[a-z]+";
        assert!(match_full(email, "user@example.com").is_match());
        assert!(!match_full(email, "invalid").is_match());

        let url = "(http|https)://[a-z]+";
        assert!(match_full(url, "https://example").is_match());
        assert!(!match_full(url, "ftp://example").is_match());

        let decimal = r"[0-9]+\.[0-9]+";
        assert!(match_full(decimal, "3.14").is_match());
        assert!(!match_full(decimal, "123").is_match());
    }

    #[test]
    fn long_greedy_match_does_not_recurse_per_character() {
        let input = "a".repeat(10_000);
        let result = match_full("a+", &input);
        assert!(result.is_match());
        assert_eq!(Some(Span::new(0, 10_000)), result.span());
    }

    #[test]
    fn leftmost_first_prefers_earlier_branch() {
        // Leftmost-first: `a` wins over the longer `ab`.
        let result = find("a|ab", "ab");
        assert_eq!(Some(Span::new(0, 1)), result.span());
    }
}
