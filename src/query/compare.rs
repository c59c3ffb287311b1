//! String comparison settings and helpers.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseSensitivity {
    Sensitive,
    #[default]
    Insensitive,
}

/// How `=` compares a field against a literal string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringMatching {
    /// Whole-string comparison
    #[default]
    Plain,
    /// `*` matches any run of characters, `?` any single character
    Wildcard,
    /// Regular expression, matched anywhere in the field value
    Regex,
}

impl FromStr for StringMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "plain" => Ok(StringMatching::Plain),
            "wildcard" => Ok(StringMatching::Wildcard),
            "regex" => Ok(StringMatching::Regex),
            other => Err(format!(
                "unknown matching mode '{}', expected plain, wildcard or regex",
                other
            )),
        }
    }
}

impl fmt::Display for StringMatching {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StringMatching::Plain => "plain",
            StringMatching::Wildcard => "wildcard",
            StringMatching::Regex => "regex",
        };
        f.write_str(name)
    }
}

/// Options that change how comparisons behave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    pub case: CaseSensitivity,
    pub matching: StringMatching,
}

impl QueryOptions {
    pub fn case_sensitive(mut self, sensitive: bool) -> Self {
        self.case = if sensitive {
            CaseSensitivity::Sensitive
        } else {
            CaseSensitivity::Insensitive
        };
        self
    }

    pub fn with_matching(mut self, matching: StringMatching) -> Self {
        self.matching = matching;
        self
    }
}

/// Ordinal string comparison. Insensitive mode folds ASCII letters only.
pub fn compare_strings(a: &str, b: &str, case: CaseSensitivity) -> Ordering {
    match case {
        CaseSensitivity::Sensitive => a.cmp(b),
        CaseSensitivity::Insensitive => a
            .bytes()
            .map(|c| c.to_ascii_lowercase())
            .cmp(b.bytes().map(|c| c.to_ascii_lowercase())),
    }
}

pub fn strings_equal(a: &str, b: &str, case: CaseSensitivity) -> bool {
    match case {
        CaseSensitivity::Sensitive => a == b,
        CaseSensitivity::Insensitive => a.eq_ignore_ascii_case(b),
    }
}

/// Match `text` against a mask where `*` is any run and `?` any one character
pub fn wildcard_match(text: &str, mask: &str, case: CaseSensitivity) -> bool {
    let fold = |s: &str| -> Vec<char> {
        match case {
            CaseSensitivity::Sensitive => s.chars().collect(),
            CaseSensitivity::Insensitive => s.chars().map(|c| c.to_ascii_lowercase()).collect(),
        }
    };
    let text = fold(text);
    let mask = fold(mask);

    let (mut t, mut m) = (0, 0);
    // Position of the last `*` in the mask and the text position it covers up to
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if m < mask.len() && (mask[m] == '?' || mask[m] == text[t]) {
            t += 1;
            m += 1;
        } else if m < mask.len() && mask[m] == '*' {
            star = Some((m, t));
            m += 1;
        } else if let Some((star_m, star_t)) = star {
            m = star_m + 1;
            t = star_t + 1;
            star = Some((star_m, star_t + 1));
        } else {
            return false;
        }
    }

    mask[m..].iter().all(|&c| c == '*')
}
