//! Card label parsing
//!
//! External product labels mix the card name and catalog number into one
//! free-text string. Parsing is an ordered list of pure pattern rules; the
//! first rule that matches wins and the final rule always matches, so
//! parsing never fails.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Rule 1: "<name> #<number>" with the number trailing
    static ref TRAILING_NUMBER: Regex =
        Regex::new(r"^(?P<name>.+?)\s*#(?P<number>\S+)$").unwrap();
    /// Rule 2 remainder, after the leading set name is stripped:
    /// "#<number> <name>"
    static ref LEADING_NUMBER: Regex =
        Regex::new(r"^\s*#(?P<number>\S+)\s+(?P<name>.+)$").unwrap();
    /// Rule 3: "<name> [<variant>] #<number>"
    static ref BRACKET_VARIANT: Regex =
        Regex::new(r"^(?P<name>.+?)\s*\[(?P<variant>[^\]]+)\]\s*#(?P<number>\S+)$").unwrap();
}

/// Outcome of parsing one product label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLabel {
    /// A pattern rule extracted both a name and a catalog number
    Matched { name: String, number: String },
    /// No rule matched; the whole label is taken as the name.
    /// Downstream this is recorded as a ParseAmbiguous warning, but the
    /// card stays insertable with an empty number.
    Fallback { name: String },
}

impl ParsedLabel {
    pub fn name(&self) -> &str {
        match self {
            ParsedLabel::Matched { name, .. } => name,
            ParsedLabel::Fallback { name } => name,
        }
    }

    /// Catalog number, empty for fallback parses
    pub fn number(&self) -> &str {
        match self {
            ParsedLabel::Matched { number, .. } => number,
            ParsedLabel::Fallback { .. } => "",
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ParsedLabel::Fallback { .. })
    }
}

/// Parse a product label into card name and catalog number.
///
/// `set_name` is the target set the label was matched against; rule 2 uses
/// it to strip a leading set-name prefix ("<setName> #<number> <name>").
pub fn parse_label(label: &str, set_name: &str) -> ParsedLabel {
    let label = label.trim();

    let rules: [fn(&str, &str) -> Option<ParsedLabel>; 3] =
        [rule_trailing_number, rule_leading_set_name, rule_bracket_variant];

    for rule in rules {
        if let Some(parsed) = rule(label, set_name) {
            return parsed;
        }
    }

    ParsedLabel::Fallback {
        name: label.to_string(),
    }
}

fn rule_trailing_number(label: &str, _set_name: &str) -> Option<ParsedLabel> {
    let caps = TRAILING_NUMBER.captures(label)?;
    Some(ParsedLabel::Matched {
        name: caps["name"].trim().to_string(),
        number: caps["number"].to_string(),
    })
}

fn rule_leading_set_name(label: &str, set_name: &str) -> Option<ParsedLabel> {
    let set_name = set_name.trim();
    if set_name.is_empty() || label.len() < set_name.len() || !label.is_char_boundary(set_name.len())
    {
        return None;
    }
    // Case-insensitive prefix match on the set name
    if !label[..set_name.len()].eq_ignore_ascii_case(set_name) {
        return None;
    }
    let caps = LEADING_NUMBER.captures(&label[set_name.len()..])?;
    Some(ParsedLabel::Matched {
        name: caps["name"].trim().to_string(),
        number: caps["number"].to_string(),
    })
}

fn rule_bracket_variant(label: &str, _set_name: &str) -> Option<ParsedLabel> {
    let caps = BRACKET_VARIANT.captures(label)?;
    Some(ParsedLabel::Matched {
        name: format!("{} [{}]", caps["name"].trim(), &caps["variant"]),
        number: caps["number"].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SET: &str = "1992 Marvel Masterpieces";

    #[test]
    fn trailing_number_label() {
        let parsed = parse_label("Colossus #64", SET);
        assert_eq!(
            parsed,
            ParsedLabel::Matched {
                name: "Colossus".to_string(),
                number: "64".to_string(),
            }
        );
    }

    #[test]
    fn trailing_number_round_trip() {
        // For rule-1 labels the number is exactly the substring after '#'
        // and the name is the trimmed remainder.
        for (name, number) in [
            ("Wolverine", "12"),
            ("Mr. Sinister", "98"),
            ("Silver Surfer", "1a"),
        ] {
            let parsed = parse_label(&format!("{} #{}", name, number), SET);
            assert_eq!(parsed.name(), name);
            assert_eq!(parsed.number(), number);
        }
    }

    #[test]
    fn leading_set_name_label() {
        let parsed = parse_label("1992 Marvel Masterpieces #64 Colossus", SET);
        assert_eq!(
            parsed,
            ParsedLabel::Matched {
                name: "Colossus".to_string(),
                number: "64".to_string(),
            }
        );
    }

    #[test]
    fn leading_set_name_is_case_insensitive() {
        let parsed = parse_label("1992 MARVEL MASTERPIECES #12 Wolverine", SET);
        assert_eq!(parsed.name(), "Wolverine");
        assert_eq!(parsed.number(), "12");
    }

    #[test]
    fn bracket_variant_kept_in_name() {
        let parsed = parse_label("Colossus [Gold Foil] #64", SET);
        assert_eq!(parsed.name(), "Colossus [Gold Foil]");
        assert_eq!(parsed.number(), "64");
    }

    #[test]
    fn plain_label_falls_back() {
        let parsed = parse_label("Spider-Man 2099 Promo", SET);
        assert_eq!(
            parsed,
            ParsedLabel::Fallback {
                name: "Spider-Man 2099 Promo".to_string(),
            }
        );
        assert!(parsed.is_fallback());
        assert_eq!(parsed.number(), "");
    }

    #[test]
    fn fallback_trims_whitespace() {
        let parsed = parse_label("  Gambit  ", SET);
        assert_eq!(parsed.name(), "Gambit");
    }

    #[test]
    fn empty_label_never_panics() {
        let parsed = parse_label("", SET);
        assert!(parsed.is_fallback());
        assert_eq!(parsed.name(), "");
    }

    #[test]
    fn empty_set_name_skips_rule_two() {
        let parsed = parse_label("#64 Colossus", "");
        // No set-name prefix to strip, trailing-number rule does not apply
        // (the number is not trailing), so the whole label is the name.
        assert!(parsed.is_fallback());
    }
}
