use std::collections::BTreeSet;
use std::fmt;

/// The set of characters in a character class, fully enumerated at parse
/// time. A `BTreeSet` keeps iteration order deterministic, which the pretty
/// printer and the DFA's diagnostics rely on.
pub type ClassSet = BTreeSet<char>;

/// Sentinel literal representing the empty pattern. It consumes nothing and
/// matches the empty string.
pub(crate) const EMPTY: char = '\0';

/// The characters matched by `\s`.
pub(crate) const WHITESPACE: &[char] =
    &[' ', '\t', '\n', '\r', '\u{000C}', '\u{000B}'];

pub(crate) fn is_whitespace(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{000C}' | '\u{000B}')
}

/// Line terminators, which `.` and negated classes never match.
pub(crate) fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r')
}

/// The abstract syntax of a parsed pattern.
///
/// An `Ast` is a pure value: immutable after parsing, structurally
/// comparable, and freely shareable between matchers. It retains no
/// positions and no references into the pattern string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Ast {
    /// A single literal character. `Literal('\0')` is the empty-pattern
    /// sentinel.
    Literal(char),
    /// A character written with a backslash escape, matched literally.
    Escaped(char),
    /// `\t`.
    Tab,
    /// `\s`.
    Whitespace,
    /// `.`: any character except a line terminator.
    AnyChar,
    /// `[...]`.
    Class(ClassSet),
    /// `[^...]`. Never matches a line terminator, regardless of the set.
    NegatedClass(ClassSet),
    /// Two or more expressions in sequence.
    Concat(Vec<Ast>),
    /// Two or more alternative branches, tried left to right.
    Alternation(Vec<Ast>),
    /// Zero or more, greedy.
    Star(Box<Ast>),
    /// One or more, greedy.
    Plus(Box<Ast>),
    /// Zero or one, greedy.
    Question(Box<Ast>),
    /// `( ... )`. Grouping only; this crate has no captures.
    Group(Box<Ast>),
}

impl Ast {
    /// The AST of the empty pattern.
    pub fn empty() -> Ast {
        Ast::Literal(EMPTY)
    }
}

/// Renders the tree one node per line, children indented, e.g. for `a|b+`:
///
/// ```text
/// Alternation
///   Literal('a')
///   Plus
///     Literal('b')
/// ```
impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_node(self, f, 0)
    }
}

fn fmt_node(ast: &Ast, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    match ast {
        Ast::Literal(ch) if *ch == EMPTY => writeln!(f, "Literal(empty)"),
        Ast::Literal(ch) => writeln!(f, "Literal({})", Printable(*ch)),
        Ast::Escaped(ch) => writeln!(f, "Escaped({})", Printable(*ch)),
        Ast::Tab => writeln!(f, "Tab"),
        Ast::Whitespace => writeln!(f, "Whitespace"),
        Ast::AnyChar => writeln!(f, "AnyChar"),
        Ast::Class(set) => writeln!(f, "Class{}", PrintableSet(set)),
        Ast::NegatedClass(set) => {
            writeln!(f, "NegatedClass{}", PrintableSet(set))
        }
        Ast::Concat(children) => fmt_children(f, "Concat", children, depth),
        Ast::Alternation(children) => {
            fmt_children(f, "Alternation", children, depth)
        }
        Ast::Star(child) => fmt_child(f, "Star", child, depth),
        Ast::Plus(child) => fmt_child(f, "Plus", child, depth),
        Ast::Question(child) => fmt_child(f, "Question", child, depth),
        Ast::Group(child) => fmt_child(f, "Group", child, depth),
    }
}

fn fmt_children(
    f: &mut fmt::Formatter,
    name: &str,
    children: &[Ast],
    depth: usize,
) -> fmt::Result {
    writeln!(f, "{}", name)?;
    for child in children {
        fmt_node(child, f, depth + 1)?;
    }
    Ok(())
}

fn fmt_child(
    f: &mut fmt::Formatter,
    name: &str,
    child: &Ast,
    depth: usize,
) -> fmt::Result {
    writeln!(f, "{}", name)?;
    fmt_node(child, f, depth + 1)
}

struct Printable(char);

impl fmt::Display for Printable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            '\t' => f.write_str(r"'\t'"),
            '\n' => f.write_str(r"'\n'"),
            '\r' => f.write_str(r"'\r'"),
            '\u{000C}' => f.write_str(r"'\f'"),
            '\u{000B}' => f.write_str(r"'\v'"),
            ch => write!(f, "'{}'", ch),
        }
    }
}

struct PrintableSet<'a>(&'a ClassSet);

impl<'a> fmt::Display for PrintableSet<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("{")?;
        for (i, ch) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", Printable(*ch))?;
        }
        f.write_str("}")
    }
}
