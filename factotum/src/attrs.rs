//! Attribute-value lists and Plan 9 style quoting.
//!
//! Factotum quotes values containing white space or quotes with single
//! quotes, doubling any quote inside (`'it''s'`). [tokenize] undoes this,
//! [quote] applies it.

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

/// Splits `s` into white space separated tokens, removing quotes.
///
/// ```
/// use factotum::attrs::tokenize;
/// assert_eq!(tokenize("glenda 'pass word'"), ["glenda", "pass word"]);
/// assert_eq!(tokenize(" a''b 'it''s' "), ["ab", "it's"]);
/// ```
pub fn tokenize(s: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();
    loop {
        while chars.next_if(|&c| is_space(c)).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut token = String::new();
        let mut quoted = false;
        while let Some(c) = chars.next() {
            match (c, quoted) {
                (c, false) if is_space(c) => break,
                ('\'', false) => quoted = true,
                ('\'', true) => match chars.next_if_eq(&'\'') {
                    Some(q) => token.push(q),
                    None => quoted = false,
                },
                (c, _) => token.push(c),
            }
        }
        tokens.push(token);
    }
    tokens
}

/// Quotes `s` so that [tokenize] yields it back as a single token
pub fn quote(s: &str) -> String {
    let needs_quotes = s.is_empty() || s.chars().any(|c| is_space(c) || c == '\'');
    if !needs_quotes {
        return s.to_owned();
    }
    format!("'{}'", s.replace('\'', "''"))
}

/// Whether the attribute list contains `name`, either as `name=value` or as
/// a bare attribute
pub fn has_attr(attrs: &str, name: &str) -> bool {
    tokenize(attrs).iter().any(|tok| {
        let key = tok.split_once('=').map_or(tok.as_str(), |(k, _)| k);
        key.strip_suffix('?').unwrap_or(key) == name
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn splits_on_any_white_space() {
        assert_eq!(tokenize("a\tb\r\nc   d"), ["a", "b", "c", "d"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t\n").is_empty());
    }

    #[test]
    fn quotes_group_and_escape() {
        assert_eq!(tokenize("'a b' c"), ["a b", "c"]);
        assert_eq!(tokenize("pre'fix suf'fix"), ["prefix suffix"]);
        assert_eq!(tokenize("''"), [""]);
        assert_eq!(tokenize("''''"), ["'"]);
        // An unterminated quote runs to the end of the input
        assert_eq!(tokenize("'open end"), ["open end"]);
    }

    #[test]
    fn quote_round_trips() {
        for s in ["plain", "with space", "it's", "", "tab\there", "''"] {
            assert_eq!(tokenize(&quote(s)), [s]);
        }
        assert_eq!(quote("plain"), "plain");
        assert_eq!(quote("it's"), "'it''s'");
    }

    #[test]
    fn finds_attributes() {
        let params = "proto=p9sk1 role=client dom='plan 9' user?";
        assert!(has_attr(params, "proto"));
        assert!(has_attr(params, "role"));
        assert!(has_attr(params, "dom"));
        assert!(has_attr(params, "user"));
        assert!(!has_attr(params, "server"));
        assert!(!has_attr("protocol=x", "proto"));
    }
}
