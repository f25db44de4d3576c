use std::fmt::Write;

/// Name of the wrapper used to express an ordered sequence of types in the
/// generated code.
pub const LIST_WRAPPER: &str = "MakeTypeList";

/// Width of a single indentation level in the rendered output.
const INDENT_UNIT: &str = "    ";

/// Controls how an [`Expr`] is laid out when it is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indent {
    /// Everything on one line, arguments separated by `, `.
    Flat,

    /// One argument per line. The value is the indentation level of the line
    /// holding the opening bracket; arguments go one level deeper and the
    /// closing bracket goes back to this level.
    Level(usize),
}

impl Indent {
    fn deeper(self) -> Indent {
        match self {
            Indent::Flat => Indent::Flat,
            Indent::Level(n) => Indent::Level(n + 1),
        }
    }
}

/**
A node in the generic-instantiation tree which describes the generated
program.

Leaves are literal text, integers, booleans and character literals. An
[`Expr::Inst`] is a named template instantiation whose arguments are again
expressions, e.g. `AxisDriverService<Timer, Precision>`.

The layout chosen at render time never changes the token stream: rendering
with [`Indent::Flat`] and with [`Indent::Level`] yields the same text once
whitespace is removed.
 */
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Raw text which is copied into the output as is.
    Literal(String),
    Int(i64),
    Bool(bool),
    Char(char),
    Inst { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn inst<N: Into<String>>(name: N, args: Vec<Expr>) -> Expr {
        Expr::Inst {
            name: name.into(),
            args,
        }
    }

    /// Creates a type list whose elements are `elems` in order.
    pub fn list(elems: Vec<Expr>) -> Expr {
        Expr::inst(LIST_WRAPPER, elems)
    }

    pub fn ch(c: char) -> Expr {
        Expr::Char(c)
    }

    /// Returns true if this is an instantiation of the list wrapper.
    pub fn is_list(&self) -> bool {
        matches!(self, Expr::Inst { name, .. } if name == LIST_WRAPPER)
    }

    /// Renders this expression into its textual form using the given layout.
    pub fn render(&self, indent: Indent) -> String {
        let mut out = String::new();
        self.write_to(&mut out, indent);
        out
    }

    fn write_to(&self, out: &mut String, indent: Indent) {
        match self {
            Expr::Literal(text) => out.push_str(text),
            Expr::Int(i) => {
                // Writing into a String cannot fail
                let _ = write!(out, "{}", i);
            }
            Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Expr::Char(c) => {
                out.push('\'');
                match c {
                    '\'' | '\\' => {
                        out.push('\\');
                        out.push(*c);
                    }
                    c => out.push(*c),
                }
                out.push('\'');
            }
            Expr::Inst { name, args } => {
                out.push_str(name);
                out.push('<');
                if !args.is_empty() {
                    match indent {
                        Indent::Flat => {
                            for (idx, arg) in args.iter().enumerate() {
                                if idx > 0 {
                                    out.push_str(", ");
                                }
                                arg.write_to(out, Indent::Flat);
                            }
                        }
                        Indent::Level(level) => {
                            for (idx, arg) in args.iter().enumerate() {
                                if idx > 0 {
                                    out.push(',');
                                }
                                newline(out, level + 1);
                                arg.write_to(out, indent.deeper());
                            }
                            newline(out, level);
                        }
                    }
                }
                out.push('>');
            }
        }
    }
}

fn newline(out: &mut String, level: usize) {
    out.push('\n');
    for _ in 0..level {
        out.push_str(INDENT_UNIT);
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render(Indent::Flat))
    }
}

impl From<&str> for Expr {
    fn from(text: &str) -> Self {
        Expr::Literal(text.into())
    }
}

impl From<String> for Expr {
    fn from(text: String) -> Self {
        Expr::Literal(text)
    }
}

impl From<i64> for Expr {
    fn from(i: i64) -> Self {
        Expr::Int(i)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        Expr::Bool(b)
    }
}
