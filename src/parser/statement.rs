// Statement-level grammar for logical lines
//
// Checks that every logical line is a well-formed Python statement. Values
// are not built: expressions are recognised structurally (operands joined by
// operators, with calls, subscripts and attribute access), which is enough to
// reject Python 2 statements, missing colons and dangling operators.
//
// line       := "@" test | header ":" [simple] | simple
// header     := ("if" | "elif" | "while") test | ["async"] (def | for | with)
//             | "class" NAME ["(" args ")"] | "except" [test ["as" NAME]]
//             | "try" | "else" | "finally"
// simple     := import_stmt | "pass" | "return" [exprs] | ... | exprs assign*
// test       := lambda | chain ["if" chain "else" test]
// chain      := unary* atom trailer* (binop unary* atom trailer*)*

use super::ast::ImportStatement;
use super::imports::parse_import_statement;
use super::lexer::{identifier, keyword, starts_with_keyword, ws};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, map, not, opt, peek, recognize, value, verify},
    error::{Error, ErrorKind},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

/// Words that can never name a value
const RESERVED: [&str; 32] = [
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// What a logical line turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Import(ImportStatement),
    Other,
}

fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

fn sym<'a>(s: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(tag(s))
}

fn kw<'a>(s: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(keyword(s))
}

/// `=` that is not the start of `==`
fn assign_eq(input: &str) -> IResult<&str, ()> {
    value((), ws(terminated(char('='), not(char('=')))))(input)
}

// =============================================================================
// Atoms
// =============================================================================

/// String literal after the splitter emptied it, with an optional prefix
fn string_literal(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(take_while_m_n(1, 2, |c: char| "rRbBuUfF".contains(c))),
        alt((tag("''"), tag("\"\""))),
    ))(input)
}

fn number(input: &str) -> IResult<&str, ()> {
    let mut chars = input.chars();
    let starts_number = match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        _ => false,
    };
    if !starts_number {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Digit)));
    }

    let hex = input.starts_with("0x") || input.starts_with("0X");
    let mut end = 0;
    let mut prev = ' ';
    for (i, c) in input.char_indices() {
        let exponent_sign = (c == '+' || c == '-') && matches!(prev, 'e' | 'E') && !hex;
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign) {
            break;
        }
        end = i + c.len_utf8();
        prev = c;
    }
    Ok((&input[end..], ()))
}

fn name(input: &str) -> IResult<&str, ()> {
    value((), verify(identifier, |name: &str| !is_reserved(name)))(input)
}

fn atom(input: &str) -> IResult<&str, ()> {
    ws(alt((
        value((), many1(ws(string_literal))),
        value((), tag("...")),
        number,
        name,
        parens,
        square_brackets,
        braces,
    )))(input)
}

fn enclosed(input: &str, open: char, close: char) -> IResult<&str, ()> {
    value(
        (),
        delimited(ws(char(open)), opt(alt((yield_expr, bracket_body))), ws(char(close))),
    )(input)
}

fn parens(input: &str) -> IResult<&str, ()> {
    enclosed(input, '(', ')')
}

fn square_brackets(input: &str) -> IResult<&str, ()> {
    enclosed(input, '[', ']')
}

fn braces(input: &str) -> IResult<&str, ()> {
    enclosed(input, '{', '}')
}

/// `x`, `*x`, `**x`, `key=x`, `a: b` or a slice, inside any bracket pair
fn bracket_item(input: &str) -> IResult<&str, ()> {
    alt((
        value((), preceded(sym("**"), chain)),
        value((), preceded(sym("*"), chain)),
        value((), tuple((ws(identifier), assign_eq, test))),
        slice_or_pair,
    ))(input)
}

fn slice_or_pair(input: &str) -> IResult<&str, ()> {
    value(
        (),
        verify(
            recognize(pair(
                opt(test),
                opt(tuple((sym(":"), opt(test), opt(preceded(sym(":"), opt(test)))))),
            )),
            |s: &str| !s.trim().is_empty(),
        ),
    )(input)
}

/// `for targets in chain` or `if chain`, after a comprehension element
fn comprehension_clause(input: &str) -> IResult<&str, ()> {
    alt((
        value((), tuple((opt(kw("async")), kw("for"), target_list, kw("in"), chain))),
        value((), preceded(kw("if"), chain)),
    ))(input)
}

fn bracket_body(input: &str) -> IResult<&str, ()> {
    value(
        (),
        pair(
            separated_list1(sym(","), pair(bracket_item, many0(comprehension_clause))),
            opt(sym(",")),
        ),
    )(input)
}

fn trailer(input: &str) -> IResult<&str, ()> {
    alt((parens, square_brackets, value((), preceded(ws(char('.')), ws(identifier)))))(input)
}

fn atom_expr(input: &str) -> IResult<&str, ()> {
    value((), pair(atom, many0(trailer)))(input)
}

// =============================================================================
// Expressions
// =============================================================================

fn unary_operator(input: &str) -> IResult<&str, &str> {
    alt((sym("-"), sym("+"), sym("~"), kw("not"), kw("await")))(input)
}

fn binary_operator(input: &str) -> IResult<&str, ()> {
    alt((
        value(
            (),
            alt((
                sym("**"),
                sym("//"),
                sym("<<"),
                sym(">>"),
                sym("<="),
                sym(">="),
                sym("=="),
                sym("!="),
                sym(":="),
            )),
        ),
        value(
            (),
            alt((
                sym("+"),
                sym("-"),
                sym("*"),
                sym("/"),
                sym("%"),
                sym("@"),
                sym("&"),
                sym("|"),
                sym("^"),
                sym("<"),
                sym(">"),
            )),
        ),
        value((), pair(kw("not"), kw("in"))),
        value((), pair(kw("is"), opt(kw("not")))),
        value((), alt((kw("and"), kw("or"), kw("in")))),
    ))(input)
}

fn operand(input: &str) -> IResult<&str, ()> {
    preceded(many0(unary_operator), atom_expr)(input)
}

/// Operands joined by binary operators
fn chain(input: &str) -> IResult<&str, ()> {
    value((), pair(operand, many0(pair(binary_operator, operand))))(input)
}

fn test(input: &str) -> IResult<&str, ()> {
    alt((
        lambda,
        value((), pair(chain, opt(tuple((kw("if"), chain, kw("else"), test))))),
    ))(input)
}

fn lambda(input: &str) -> IResult<&str, ()> {
    value((), tuple((kw("lambda"), opt(lambda_parameters), sym(":"), test)))(input)
}

fn star_expr(input: &str) -> IResult<&str, ()> {
    alt((value((), preceded(sym("*"), chain)), test))(input)
}

/// Comma-separated expressions, as on either side of `=`
fn expr_list(input: &str) -> IResult<&str, ()> {
    value((), pair(separated_list1(sym(","), star_expr), opt(sym(","))))(input)
}

fn yield_expr(input: &str) -> IResult<&str, ()> {
    value(
        (),
        pair(kw("yield"), opt(alt((value((), preceded(kw("from"), test)), expr_list)))),
    )(input)
}

fn target(input: &str) -> IResult<&str, ()> {
    value((), pair(opt(sym("*")), atom_expr))(input)
}

fn target_list(input: &str) -> IResult<&str, ()> {
    value((), pair(separated_list1(sym(","), target), opt(sym(","))))(input)
}

// =============================================================================
// Parameters
// =============================================================================

fn parameter(input: &str, annotated: bool) -> IResult<&str, ()> {
    if let Ok((rest, _)) = sym("/")(input) {
        return Ok((rest, ()));
    }
    let (input, star) = opt(alt((sym("**"), sym("*"))))(input)?;
    let (input, parameter_name) = opt(ws(identifier))(input)?;
    if parameter_name.is_none() {
        // Bare `*` separates keyword-only parameters
        return match star {
            Some(_) => Ok((input, ())),
            None => Err(nom::Err::Error(Error::new(input, ErrorKind::Alpha))),
        };
    }
    let input = if annotated {
        opt(preceded(sym(":"), test))(input)?.0
    } else {
        input
    };
    let (input, _) = opt(preceded(assign_eq, test))(input)?;
    Ok((input, ()))
}

fn parameters(input: &str, annotated: bool) -> IResult<&str, ()> {
    let (mut input, _) = parameter(input, annotated)?;
    loop {
        let after_comma = match sym(",")(input) {
            Ok((rest, _)) => rest,
            Err(_) => break,
        };
        match parameter(after_comma, annotated) {
            Ok((rest, _)) => input = rest,
            Err(_) => break,
        }
    }
    let (input, _) = opt(sym(","))(input)?;
    Ok((input, ()))
}

fn typed_parameters(input: &str) -> IResult<&str, ()> {
    parameters(input, true)
}

fn lambda_parameters(input: &str) -> IResult<&str, ()> {
    parameters(input, false)
}

// =============================================================================
// Statements
// =============================================================================

fn function_header(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            kw("def"),
            ws(identifier),
            sym("("),
            opt(typed_parameters),
            sym(")"),
            opt(preceded(sym("->"), test)),
        )),
    )(input)
}

fn for_header(input: &str) -> IResult<&str, ()> {
    value((), tuple((kw("for"), target_list, kw("in"), expr_list)))(input)
}

fn with_items(input: &str) -> IResult<&str, ()> {
    let item = pair(test, opt(preceded(kw("as"), target)));
    value((), pair(separated_list1(sym(","), item), opt(sym(","))))(input)
}

fn with_header(input: &str) -> IResult<&str, ()> {
    preceded(
        kw("with"),
        alt((
            terminated(with_items, peek(sym(":"))),
            delimited(sym("("), with_items, sym(")")),
        )),
    )(input)
}

fn class_header(input: &str) -> IResult<&str, ()> {
    value((), tuple((kw("class"), ws(identifier), opt(parens))))(input)
}

fn except_header(input: &str) -> IResult<&str, ()> {
    value(
        (),
        tuple((
            kw("except"),
            opt(sym("*")),
            opt(pair(test, opt(preceded(kw("as"), ws(identifier))))),
        )),
    )(input)
}

fn clause_header(input: &str) -> IResult<&str, ()> {
    alt((
        value((), pair(alt((kw("if"), kw("elif"), kw("while"))), test)),
        preceded(opt(kw("async")), alt((function_header, for_header, with_header))),
        class_header,
        except_header,
        value((), alt((kw("try"), kw("else"), kw("finally")))),
    ))(input)
}

/// A block header, optionally followed by a simple statement on the same line
fn compound_statement(input: &str) -> IResult<&str, Statement> {
    let (input, _) = terminated(clause_header, sym(":"))(input)?;
    if input.trim().is_empty() {
        return Ok((input, Statement::Other));
    }
    simple_statement(input)
}

fn augmented_assign(input: &str) -> IResult<&str, &str> {
    ws(alt((
        tag("**="),
        tag("//="),
        tag(">>="),
        tag("<<="),
        tag("+="),
        tag("-="),
        tag("*="),
        tag("/="),
        tag("%="),
        tag("@="),
        tag("&="),
        tag("|="),
        tag("^="),
    )))(input)
}

fn assigned_value(input: &str) -> IResult<&str, ()> {
    alt((yield_expr, expr_list))(input)
}

/// Expression, assignment, augmented assignment or annotation
fn expression_statement(input: &str) -> IResult<&str, ()> {
    let (input, _) = assigned_value(input)?;
    alt((
        value((), tuple((sym(":"), test, opt(preceded(assign_eq, assigned_value))))),
        value((), pair(augmented_assign, assigned_value)),
        value((), many0(preceded(assign_eq, assigned_value))),
    ))(input)
}

fn simple_statement(input: &str) -> IResult<&str, Statement> {
    alt((
        map(parse_import_statement, Statement::Import),
        value(Statement::Other, alt((kw("pass"), kw("break"), kw("continue")))),
        value(Statement::Other, pair(kw("return"), opt(expr_list))),
        value(
            Statement::Other,
            pair(kw("raise"), opt(pair(test, opt(preceded(kw("from"), test))))),
        ),
        value(
            Statement::Other,
            pair(alt((kw("global"), kw("nonlocal"))), separated_list1(sym(","), ws(identifier))),
        ),
        value(Statement::Other, pair(kw("del"), target_list)),
        value(Statement::Other, tuple((kw("assert"), test, opt(preceded(sym(","), test))))),
        value(Statement::Other, expression_statement),
    ))(input)
}

fn decorator(input: &str) -> IResult<&str, Statement> {
    value(Statement::Other, preceded(sym("@"), test))(input)
}

/// Parse one logical line as a statement; `None` means invalid syntax
pub fn parse_logical_line(text: &str) -> Option<Statement> {
    if let Ok((_, statement)) =
        all_consuming(alt((decorator, compound_statement, simple_statement)))(text)
    {
        return Some(statement);
    }

    // `match`/`case` are soft keywords; their patterns are not checked
    let soft_block = (starts_with_keyword(text, "match") || starts_with_keyword(text, "case"))
        && text.ends_with(':');
    soft_block.then_some(Statement::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepts(text: &str) -> bool {
        parse_logical_line(text).is_some()
    }

    #[test]
    fn test_assignments_and_calls() {
        for line in [
            "pixels = neopixel.NeoPixel(board.NEOPIXEL, 10, brightness=0.2, auto_write=False)",
            "a, *rest = values",
            "x = y = 0",
            "count += 1",
            "mask <<= 2",
            "temperature: float = 21.5",
            "data[1:-1] = buffer[::2]",
            "print(f'', end='')",
            "print(*args, sep=rb'', **kwargs)",
            "value = 0x1F + 1_000 - 1.5e-3 * .5",
            "''",
            "...",
        ] {
            assert!(accepts(line), "rejected `{}`", line);
        }
    }

    #[test]
    fn test_expressions() {
        for line in [
            "x = a if b else c if d else e",
            "ok = not a and b is not None or c not in d",
            "sorted(items, key=lambda item: item[1])",
            "squares = {k: v ** 2 for k, v in pairs.items() if v}",
            "total = sum(x for x in range(10))",
            "merged = {**defaults, '': 1}",
            "empty = ((), [], {})",
            "await asyncio.sleep(1)",
            "value = (yield)",
            "while (line := stream.readline()):",
            "x = -a + ~b",
        ] {
            assert!(accepts(line), "rejected `{}`", line);
        }
    }

    #[test]
    fn test_block_headers() {
        for line in [
            "if x == 1:",
            "elif x:",
            "else:",
            "for i, (a, b) in enumerate(pairs):",
            "async for chunk in stream:",
            "with open(path, '') as f, lock:",
            "with (open(a) as f, open(b) as g):",
            "try:",
            "except (OSError, RuntimeError) as e:",
            "except:",
            "finally:",
            "def read(self, *, timeout: float = 1.0, **kwargs) -> bytes:",
            "async def main():",
            "def f(a, /, b=lambda x=1: x):",
            "class Sensor(Base, metaclass=Meta):",
            "class Empty:",
            "if ready: pixels.show()",
            "try: import wifi",
            "@property",
            "@app.route('', methods=[''])",
            "match command:",
        ] {
            assert!(accepts(line), "rejected `{}`", line);
        }
    }

    #[test]
    fn test_simple_statements() {
        for line in [
            "pass",
            "break",
            "return",
            "return a, b",
            "raise ValueError('') from err",
            "raise",
            "global counter, state",
            "del items[0], cache",
            "assert x > 0, ''",
            "yield from other()",
        ] {
            assert!(accepts(line), "rejected `{}`", line);
        }
    }

    #[test]
    fn test_invalid_statements() {
        for line in [
            "x = = 1",
            "print ''",
            "print '' % x",
            "exec ''",
            "if True",
            "while:",
            "except Exception, e:",
            "x = 1 +",
            "def f(:",
            "return return",
            "a b",
            "x = if",
            "`x`",
            "if x <> y:",
        ] {
            assert!(!accepts(line), "accepted `{}`", line);
        }
    }

    #[test]
    fn test_imports_are_returned() {
        match parse_logical_line("import board") {
            Some(Statement::Import(ImportStatement::Import { modules })) => {
                assert_eq!(modules, vec!["board".to_string()]);
            }
            other => panic!("Expected import, got {:?}", other),
        }
        assert!(matches!(
            parse_logical_line("try: from secrets import secrets"),
            Some(Statement::Import(_))
        ));
        assert_eq!(parse_logical_line("x = 1"), Some(Statement::Other));
    }
}
