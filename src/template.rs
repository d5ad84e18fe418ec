use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

/// Expand `{name}` placeholders, e.g. the release tag in a bundle asset URL
pub fn expand_placeholders(input: &str, variables: &HashMap<String, String>) -> Result<String> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                let var_name = consume_identifier(&mut chars);
                if var_name.is_empty() {
                    output.push('{');
                } else if chars.peek() == Some(&'}') {
                    chars.next();
                    let value = variables
                        .get(&var_name)
                        .ok_or_else(|| anyhow!("Placeholder '{{{}}}' not defined", var_name))?;
                    output.push_str(value);
                } else {
                    // Not a placeholder, keep it verbatim
                    output.push('{');
                    output.push_str(&var_name);
                }
            }
            _ => output.push(c),
        }
    }

    Ok(output)
}

fn consume_identifier(chars: &mut Peekable<Chars>) -> String {
    let mut name = String::new();
    // Identifiers start with alpha or _
    if let Some(&c) = chars.peek() {
        if !c.is_alphabetic() && c != '_' {
            return name;
        }
    }

    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '_' {
            name.push(c);
            chars.next();
        } else {
            break;
        }
    }
    name
}
