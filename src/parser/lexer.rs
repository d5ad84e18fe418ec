// Token-level parsers shared by the import grammar

use nom::{
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, satisfy},
    combinator::{map, not, recognize},
    multi::separated_list1,
    sequence::{delimited, pair, terminated},
    IResult,
};

pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Python identifier
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            satisfy(|c| c.is_alphabetic() || c == '_'),
            take_while(is_identifier_char),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Dotted module path, e.g. `adafruit_display_text.label`
pub fn dotted_name(input: &str) -> IResult<&str, String> {
    map(separated_list1(ws(char('.')), identifier), |parts| parts.join("."))(input)
}

/// A keyword that is not the prefix of a longer identifier
pub fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(kw), not(satisfy(is_identifier_char)))
}

pub fn starts_with_keyword(input: &str, kw: &'static str) -> bool {
    keyword(kw)(input).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("board_pins rest"), Ok((" rest", "board_pins".to_string())));
        assert!(identifier("9lives").is_err());
    }

    #[test]
    fn test_dotted_name() {
        let (rest, name) = dotted_name("adafruit_bus_device.i2c_device import x").unwrap();
        assert_eq!(name, "adafruit_bus_device.i2c_device");
        assert_eq!(rest, " import x");
    }

    #[test]
    fn test_keyword_boundary() {
        assert!(starts_with_keyword("import board", "import"));
        assert!(starts_with_keyword("from\tboard import A0", "from"));
        assert!(!starts_with_keyword("imports = []", "import"));
        assert!(!starts_with_keyword("from_value = 3", "from"));
        assert!(starts_with_keyword("import", "import"));
    }
}
