// Import statement grammar
//
// import_stmt  := "import" dotted_as_name ("," dotted_as_name)*
//               | "from" "."* [dotted_name] "import" targets
// targets      := "*" | "(" names [","] ")" | names
// names        := identifier ["as" identifier] ("," ...)*

use super::ast::{ImportStatement, ImportTargets};
use super::lexer::{dotted_name, identifier, keyword, ws};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::{all_consuming, map, not, opt},
    error::{Error, ErrorKind},
    multi::{many0_count, separated_list1},
    sequence::{delimited, preceded, terminated},
    IResult,
};

/// `a.b [as c]`, alias discarded
fn dotted_as_name(input: &str) -> IResult<&str, String> {
    terminated(ws(dotted_name), opt(preceded(keyword("as"), ws(identifier))))(input)
}

/// `x [as y]`, alias discarded
fn import_as_name(input: &str) -> IResult<&str, String> {
    terminated(ws(identifier), opt(preceded(keyword("as"), ws(identifier))))(input)
}

fn import_targets(input: &str) -> IResult<&str, ImportTargets> {
    alt((
        map(ws(char('*')), |_| ImportTargets::Wildcard),
        map(
            delimited(
                ws(char('(')),
                terminated(
                    separated_list1(ws(char(',')), import_as_name),
                    opt(ws(char(','))),
                ),
                ws(char(')')),
            ),
            ImportTargets::Names,
        ),
        map(separated_list1(ws(char(',')), import_as_name), ImportTargets::Names),
    ))(input)
}

/// Parse `import a.b as c, d`
pub fn parse_import(input: &str) -> IResult<&str, ImportStatement> {
    let (input, _) = ws(keyword("import"))(input)?;
    let (input, modules) = separated_list1(ws(char(',')), dotted_as_name)(input)?;
    Ok((input, ImportStatement::Import { modules }))
}

/// Parse `from ..pkg.mod import x, y`
pub fn parse_from(input: &str) -> IResult<&str, ImportStatement> {
    let (input, _) = ws(keyword("from"))(input)?;
    let (input, level) = many0_count(ws(char('.')))(input)?;
    let (input, module) = opt(preceded(not(keyword("import")), ws(dotted_name)))(input)?;

    // `from import x` names nothing
    if level == 0 && module.is_none() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Verify)));
    }

    let (input, _) = ws(keyword("import"))(input)?;
    let (input, targets) = import_targets(input)?;

    Ok((
        input,
        ImportStatement::From {
            level,
            module,
            targets,
        },
    ))
}

pub fn parse_import_statement(input: &str) -> IResult<&str, ImportStatement> {
    alt((parse_import, parse_from))(input)
}

/// Parse one logical line that must be exactly one import statement
pub fn parse_statement_line(input: &str) -> Option<ImportStatement> {
    all_consuming(parse_import_statement)(input)
        .ok()
        .map(|(_, statement)| statement)
}
