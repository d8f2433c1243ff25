use nom::{
    IResult,
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::rest,
    sequence::tuple,
};

#[derive(Debug, PartialEq)]
pub(crate) struct Setting<'a> {
    pub(crate) key: &'a str,
    pub(crate) value: &'a str,
}

fn key(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

// SSID = my network
pub(crate) fn setting(input: &str) -> IResult<&str, Setting<'_>> {
    let (input, (_, name, _, _, _, value)) =
        tuple((space0, key, space0, char('='), space0, rest))(input)?;
    Ok((input, Setting { key: name, value: value.trim_end() }))
}

fn is_blank_or_comment(line: &str) -> bool {
    let line = line.trim_start();
    line.is_empty() || line.starts_with('#') || line.starts_with(';')
}

/// Every `KEY=VALUE` line of an INI-style document; other lines are skipped.
pub(crate) fn settings<'a>(text: &'a str) -> impl Iterator<Item = Setting<'a>> + 'a {
    text.lines()
        .filter(|line| !is_blank_or_comment(line))
        .filter_map(|line| setting(line).ok().map(|(_, s)| s))
}
