//! Accepted textual date representations.

use regex::Regex;
use std::sync::LazyLock;

/// One accepted date representation: the pattern used to locate it inside a
/// string and the `chrono` layout used to parse the located text.
#[derive(Debug)]
pub struct DateFormatRule {
    /// Human readable name of the representation.
    pub name: &'static str,
    /// Pattern searched for (unanchored) in the input.
    pub pattern: Regex,
    /// `chrono` strftime layout matching exactly what `pattern` extracts.
    pub layout: &'static str,
}

/// A rule that matched, together with the extracted date text.
#[derive(Debug, Clone, Copy)]
pub struct RuleMatch<'a> {
    /// The rule that matched.
    pub rule: &'static DateFormatRule,
    /// The substring of the input located by the rule's pattern.
    pub text: &'a str,
}

// The separator between date and time is what keeps the two rules disjoint.
static RULES: LazyLock<[DateFormatRule; 2]> = LazyLock::new(|| {
    [
        DateFormatRule {
            name: "YYYY-MM-DDTHH:MM:SS",
            pattern: compile(r"\d{4}-[01]\d-[0-3]\dT[0-2]\d:[0-5]\d:[0-5]\d"),
            layout: "%Y-%m-%dT%H:%M:%S",
        },
        DateFormatRule {
            name: "YYYY-MM-DD HH:MM:SS",
            pattern: compile(r"\d{4}-[01]\d-[0-3]\d [0-2]\d:[0-5]\d:[0-5]\d"),
            layout: "%Y-%m-%d %H:%M:%S",
        },
    ]
});

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("date rule patterns are valid regular expressions")
}

/// Returns the fixed set of accepted date representations.
#[must_use]
pub fn rules() -> &'static [DateFormatRule] {
    RULES.as_slice()
}

/// Finds the first rule whose pattern occurs in `input`.
///
/// Returns `None` when the input contains none of the accepted
/// representations.
#[must_use]
pub fn match_rule(input: &str) -> Option<RuleMatch<'_>> {
    rules().iter().find_map(|rule| {
        rule.pattern
            .find(input)
            .map(|found| RuleMatch {
                rule,
                text: found.as_str(),
            })
    })
}
