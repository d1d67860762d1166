use crate::name::map_base;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseFormat {
    #[default]
    None,
    Lower,
    Upper,
    TitleCase,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpaceReplacement {
    #[default]
    Keep,
    Underscore,
    Hyphen,
}

impl SpaceReplacement {
    pub fn substitute(self) -> Option<char> {
        match self {
            SpaceReplacement::Keep => None,
            SpaceReplacement::Underscore => Some('_'),
            SpaceReplacement::Hyphen => Some('-'),
        }
    }
}

/// Applies `format` to the base name. The extension is never case-folded.
pub fn apply_case_format(name: &str, format: CaseFormat) -> String {
    match format {
        CaseFormat::None => name.to_string(),
        CaseFormat::Lower => map_base(name, str::to_lowercase),
        CaseFormat::Upper => map_base(name, str::to_uppercase),
        CaseFormat::TitleCase => map_base(name, title_case),
    }
}

/// Rewrites every space in the whole name, extension included.
pub fn replace_spaces(name: &str, replacement: SpaceReplacement) -> String {
    match replacement.substitute() {
        Some(sub) if name.contains(' ') => name.replace(' ', &sub.to_string()),
        _ => name.to_string(),
    }
}

// A letter starts a word when it follows anything that is not a letter.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;

    for ch in value.chars() {
        if !ch.is_alphabetic() {
            out.push(ch);
            at_word_start = true;
            continue;
        }

        if at_word_start {
            let mut upper = ch.to_uppercase();
            if let Some(first) = upper.next() {
                out.push(first);
            }
            // "ß" uppercases to "SS"; keep only the head capital.
            out.extend(upper.flat_map(char::to_lowercase));
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = false;
    }

    out
}
