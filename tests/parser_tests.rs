//! Integration tests for the backtracking parser combinators.

use delimit::{parse, ParseError, Parser};

#[test]
fn attempt_failure_leaves_cursor_unchanged() {
    let result = parse("abcdef", |p| {
        p.literal("ab");
        let before = p.offset();
        let failed = p.attempt(|c| {
            c.literal("cd");
            c.literal("xx");
        });
        assert!(failed.is_err());
        assert_eq!(p.offset(), before);
        before
    });
    assert_eq!(result, Ok(2));
}

#[test]
fn attempt_success_commits_cursor() {
    let result = parse("abcdef", |p| {
        let parsed = p.attempt(|c| {
            c.literal("abcd");
            c.offset()
        });
        assert_eq!(parsed, Ok(4));
        p.offset()
    });
    assert_eq!(result, Ok(4));
}

#[test]
fn look_ahead_never_moves_the_cursor() {
    let result = parse("abc", |p| {
        let peeked: String = p.look_ahead(|c| c.take_while(|ch| ch.is_alphabetic()));
        assert_eq!(peeked, "abc");
        p.offset()
    });
    assert_eq!(result, Ok(0));
}

#[test]
fn keyword_backtracks_to_identifier() {
    let word = |c: &Parser| c.take_while1("identifier", |ch| ch.is_alphanumeric());
    let result = parse("letter", move |p| {
        p.alt(
            |c: &Parser| {
                c.literal("let");
                c.satisfy("whitespace", |ch| ch.is_whitespace());
                "keyword".to_string()
            },
            word,
        )
    });
    assert_eq!(result, Ok("letter".to_string()));
}

// ----------------------------------------------------------------------------
// A small arithmetic grammar exercising alt, optional, and recursion.
// ----------------------------------------------------------------------------

fn factor(p: &Parser) -> i64 {
    p.ws();
    p.alt(
        |c: &Parser| {
            c.ch('(');
            let value = expr(c);
            c.ws();
            c.ch(')');
            value
        },
        |c: &Parser| c.integer(),
    )
}

fn term(p: &Parser) -> i64 {
    let mut acc = factor(p);
    loop {
        p.ws();
        match p.optional(|c| c.satisfy("'*' or '/'", |ch| ch == '*' || ch == '/')) {
            Some('*') => acc *= factor(p),
            Some('/') => acc /= factor(p),
            _ => break,
        }
    }
    acc
}

fn expr(p: &Parser) -> i64 {
    let mut acc = term(p);
    loop {
        p.ws();
        match p.optional(|c| c.satisfy("'+' or '-'", |ch| ch == '+' || ch == '-')) {
            Some('+') => acc += term(p),
            Some('-') => acc -= term(p),
            _ => break,
        }
    }
    acc
}

fn eval(input: &str) -> Result<i64, ParseError> {
    parse(input.to_string(), |p| {
        let value = expr(p);
        p.ws();
        p.end();
        value
    })
}

#[test]
fn arithmetic_expressions_evaluate() {
    assert_eq!(eval("1 + 2 * 3"), Ok(7));
    assert_eq!(eval("2 * (3 + 4) - 5"), Ok(9));
    assert_eq!(eval("((42))"), Ok(42));
    assert_eq!(eval("100 / 5 / 2"), Ok(10));
}

#[test]
fn arithmetic_rejects_trailing_garbage() {
    let error = eval("1 + 2 ?").unwrap_err();
    assert_eq!(error.expected, "end of input");
    assert_eq!(error.found, "'?'");
}

#[test]
fn arithmetic_reports_missing_operand() {
    let error = eval("3 +").unwrap_err();
    assert!(error.offset >= 2, "offset {} too early", error.offset);
}

#[test]
fn csv_line_via_sep_by() {
    let result = parse("ab,cd,,ef", |p| {
        let fields = p.sep_by(
            |c| c.take_while(|ch| ch != ','),
            |c| c.literal(","),
        );
        p.end();
        fields
    });
    assert_eq!(
        result,
        Ok(vec![
            "ab".to_string(),
            "cd".to_string(),
            String::new(),
            "ef".to_string()
        ])
    );
}
