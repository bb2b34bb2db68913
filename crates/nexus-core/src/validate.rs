//! Advisory syntax checks
//!
//! These checks gate local edits only. They are shallow: JSON
//! must parse, JavaScript and TypeScript must have balanced delimiters,
//! everything else passes. Nothing here executes the content.
//!
//! Whether a `/` opens a regex literal depends on the token before it,
//! the same ambiguity every JS tokenizer faces. The scan guesses from the
//! previous token and, when no closing `/` follows on the line, reads it as
//! division; a wrong guess can only hide brackets, never invent them.

use thiserror::Error;

use crate::language::Language;

/// Why a buffer was rejected, with a 1-based location
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Syntax Error: {message} (line {line}, column {column})")]
pub struct ValidationError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ValidationError {
    fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// Check `content` according to `language`
pub fn validate(language: Language, content: &str) -> Result<(), ValidationError> {
    match language {
        Language::Json => validate_json(content),
        Language::Javascript | Language::Typescript => check_delimiters(content),
        _ => Ok(()),
    }
}

fn validate_json(content: &str) -> Result<(), ValidationError> {
    if content.trim().is_empty() {
        return Ok(());
    }
    serde_json::from_str::<serde_json::Value>(content)
        .map(|_| ())
        .map_err(|e| {
            let message = e.to_string();
            // serde_json appends its own location; keep just the reason
            let message = match message.find(" at line ") {
                Some(idx) => message[..idx].to_string(),
                None => message,
            };
            ValidationError::new(e.line(), e.column(), message)
        })
}

#[derive(Debug, Clone, Copy)]
enum Frame {
    /// An open bracket in code
    Open { ch: char, line: usize, column: usize },
    /// Inside a template literal body
    Template { line: usize, column: usize },
    /// Inside a `${ ... }` substitution
    Substitution { line: usize, column: usize },
}

/// Scan JS-like source for unbalanced brackets, skipping strings,
/// template literal text, regex literals and comments.
fn check_delimiters(content: &str) -> Result<(), ValidationError> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut chars = content.chars().peekable();
    let mut line = 1;
    let mut column = 0;
    // Identifier or keyword being read, and whether a `/` here starts a regex
    let mut word = String::new();
    let mut regex_allowed = true;

    macro_rules! advance {
        () => {{
            let next = chars.next();
            if let Some(c) = next {
                if c == '\n' {
                    line += 1;
                    column = 0;
                } else {
                    column += 1;
                }
            }
            next
        }};
    }

    while let Some(c) = advance!() {
        if let Some(Frame::Template { .. }) = stack.last() {
            match c {
                '\\' => {
                    advance!();
                }
                '`' => {
                    stack.pop();
                    regex_allowed = false;
                }
                '$' if chars.peek() == Some(&'{') => {
                    advance!();
                    stack.push(Frame::Substitution { line, column });
                    regex_allowed = true;
                }
                _ => {}
            }
            continue;
        }

        if is_word_char(c) {
            word.push(c);
            regex_allowed = precedes_expression(&word);
            continue;
        }
        word.clear();

        match c {
            c if c.is_whitespace() => {}
            '/' if chars.peek() == Some(&'/') => {
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    advance!();
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                let (start_line, start_column) = (line, column);
                advance!();
                let mut closed = false;
                while let Some(next) = advance!() {
                    if next == '*' && chars.peek() == Some(&'/') {
                        advance!();
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(ValidationError::new(
                        start_line,
                        start_column,
                        "unterminated comment",
                    ));
                }
            }
            // Without a closing slash on the line this is division
            '/' if regex_allowed => {
                if let Some(len) = regex_body_len(chars.clone()) {
                    for _ in 0..len {
                        advance!();
                    }
                    regex_allowed = false;
                }
            }
            '\'' | '"' => {
                regex_allowed = false;
                let (start_line, start_column) = (line, column);
                let mut closed = false;
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    advance!();
                    if next == '\\' {
                        advance!();
                    } else if next == c {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(ValidationError::new(
                        start_line,
                        start_column,
                        "unterminated string literal",
                    ));
                }
            }
            '`' => stack.push(Frame::Template { line, column }),
            '(' | '[' | '{' => {
                stack.push(Frame::Open { ch: c, line, column });
                regex_allowed = true;
            }
            ')' | ']' | '}' => {
                match stack.pop() {
                    Some(Frame::Open { ch, .. }) if ch == opening(c) => {}
                    Some(Frame::Substitution { .. }) if c == '}' => {}
                    Some(Frame::Open { ch, .. }) => {
                        return Err(ValidationError::new(
                            line,
                            column,
                            format!("expected '{}' but found '{}'", closing(ch), c),
                        ));
                    }
                    _ => {
                        return Err(ValidationError::new(
                            line,
                            column,
                            format!("unexpected '{}'", c),
                        ));
                    }
                }
                // `a[i] / 2` divides; a block end can be followed by a regex
                regex_allowed = c == '}';
            }
            // Operators and other punctuation
            _ => regex_allowed = true,
        }
    }

    match stack.pop() {
        None => Ok(()),
        Some(Frame::Open { ch, line, column }) => Err(ValidationError::new(
            line,
            column,
            format!("unclosed '{}'", ch),
        )),
        Some(Frame::Template { line, column }) => Err(ValidationError::new(
            line,
            column,
            "unterminated template literal",
        )),
        Some(Frame::Substitution { line, column }) => Err(ValidationError::new(
            line,
            column,
            "unclosed template substitution",
        )),
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Keywords after which a `/` begins a regex rather than dividing
fn precedes_expression(word: &str) -> bool {
    matches!(
        word,
        "return"
            | "typeof"
            | "instanceof"
            | "in"
            | "of"
            | "new"
            | "delete"
            | "void"
            | "throw"
            | "case"
            | "do"
            | "else"
            | "yield"
            | "await"
    )
}

/// Length of a regex literal after its opening `/`, through the closing
/// `/`. Flags are left for the caller. `None` when the line ends first.
fn regex_body_len(mut rest: impl Iterator<Item = char>) -> Option<usize> {
    let mut len = 0;
    let mut in_class = false;
    while let Some(c) = rest.next() {
        len += 1;
        match c {
            '\n' | '\r' => return None,
            '\\' => match rest.next() {
                Some('\n') | Some('\r') | None => return None,
                Some(_) => len += 1,
            },
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => return Some(len),
            _ => {}
        }
    }
    None
}

fn opening(close: char) -> char {
    match close {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn js(src: &str) -> Result<(), ValidationError> {
        validate(Language::Javascript, src)
    }

    #[test]
    fn test_balanced_javascript_passes() {
        assert!(js("function f(a) { return [a, {b: 1}]; }").is_ok());
        assert!(js("").is_ok());
        assert!(js("let x=2;").is_ok());
    }

    #[test]
    fn test_unclosed_brace_fails() {
        let err = js("function f() {\n  return 1;\n").unwrap_err();
        assert_eq!(err.message, "unclosed '{'");
        assert_eq!((err.line, err.column), (1, 14));
    }

    #[test]
    fn test_mismatched_bracket_fails() {
        let err = js("let a = [1, 2);").unwrap_err();
        assert_eq!(err.message, "expected ']' but found ')'");
        assert_eq!((err.line, err.column), (1, 14));
    }

    #[test]
    fn test_stray_closer_fails() {
        let err = js("}").unwrap_err();
        assert_eq!(err.message, "unexpected '}'");
    }

    #[test]
    fn test_brackets_in_strings_and_comments_ignored() {
        assert!(js("let s = \"(\"; let t = '}'; // {[(\n/* ) */ f();").is_ok());
        assert!(js(r#"let s = "a \" ( b";"#).is_ok());
    }

    #[test]
    fn test_template_literals() {
        assert!(js("let s = `{ ${a + (b)} }`;").is_ok());
        assert!(js("let s = `outer ${ `inner ${x}` }`;").is_ok());
        assert!(js("let s = `${ {a: 1}.a }`;").is_ok());
        assert_eq!(js("let s = `abc").unwrap_err().message, "unterminated template literal");
    }

    #[test]
    fn test_unterminated_string_and_comment() {
        assert_eq!(js("let s = 'abc\n;").unwrap_err().message, "unterminated string literal");
        assert_eq!(js("/* never closed").unwrap_err().message, "unterminated comment");
    }

    #[test]
    fn test_regex_literals_skipped() {
        assert!(js("const re = /[)]/;\nconst q = /\"/;").is_ok());
        assert!(js("if (/[(]/.test(s)) { f(); }").is_ok());
        assert!(js("function f() { return /}/; }").is_ok());
        assert!(js("let parts = s.split(/[/]{2}/g);").is_ok());
        assert!(js(r"let slash = /\/(/;").is_ok());
        assert!(js("let r = [/]/, /'/];").is_ok());
    }

    #[test]
    fn test_regex_does_not_hide_later_errors() {
        let err = js("const re = /[)]/;\nlet a = [1, 2);").unwrap_err();
        assert_eq!(err.message, "expected ']' but found ')'");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_division_is_not_a_regex() {
        assert!(js("let q = a / b / c;").is_ok());
        assert!(js("let r = (a + b) / 2 / n;").is_ok());
        assert!(js("let s = xs[i] / 2; let t = 10 / 5;").is_ok());
        // Read as a regex, `/ (b /` would swallow the open paren
        assert_eq!(js("x = a / (b / c;").unwrap_err().message, "unclosed '('");
    }

    #[test]
    fn test_typescript_uses_same_check() {
        assert!(validate(Language::Typescript, "const f = (x: number) => x;").is_ok());
        assert!(validate(Language::Typescript, "interface A {").is_err());
    }

    #[test]
    fn test_json() {
        assert!(validate(Language::Json, r#"{"a": [1, 2]}"#).is_ok());
        assert!(validate(Language::Json, "   ").is_ok());

        let err = validate(Language::Json, "{\n  \"a\": 1,\n}").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(!err.message.contains("at line"));
    }

    #[test]
    fn test_other_languages_always_pass() {
        assert!(validate(Language::Python, "def f(:").is_ok());
        assert!(validate(Language::Rust, "fn main() {").is_ok());
        assert!(validate(Language::Plaintext, "((((").is_ok());
    }

    #[test]
    fn test_display() {
        let err = js("(").unwrap_err();
        assert_eq!(err.to_string(), "Syntax Error: unclosed '(' (line 1, column 1)");
    }
}
