use crate::name::split_name;

pub const DEFAULT_FALLBACK_BASE: &str = "Renamed_File";

const DEVICE_PREFIXES: &[&str] = &["IMG_", "VID_", "DOC_", "Screenshot_"];

/// Proposes a cleaner name for an uploaded file: camera and screenshot
/// counters are dropped, the extension is kept as-is.
pub fn suggest_name(original: &str) -> String {
    suggest_name_with_fallback(original, DEFAULT_FALLBACK_BASE)
}

pub fn suggest_name_with_fallback(original: &str, fallback_base: &str) -> String {
    let parts = split_name(original);
    let stripped = strip_device_tokens(&parts.base);
    let mut base = cleanup_base(&stripped);
    if base.is_empty() {
        base = fallback_base.to_string();
    }
    format!("{}{}", base, parts.extension)
}

/// Removes every `PREFIX? (DDDDDDDD_DDDDDD | D+)` token, scanning left to
/// right. A prefix is only consumed together with the digits that follow it.
pub fn strip_device_tokens(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    let mut rest = base;

    while let Some(ch) = rest.chars().next() {
        if let Some(len) = device_token_len(rest) {
            rest = &rest[len..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

/// Turns each `__` into `_` in one left-to-right pass, then trims `_` and
/// after that surrounding whitespace. `a___b` keeps two underscores.
pub fn cleanup_base(value: &str) -> String {
    value.replace("__", "_").trim_matches('_').trim().to_string()
}

fn device_token_len(input: &str) -> Option<usize> {
    for prefix in DEVICE_PREFIXES {
        if let Some(after) = input.strip_prefix(prefix) {
            if let Some(len) = digit_shape_len(after) {
                return Some(prefix.len() + len);
            }
        }
    }
    digit_shape_len(input)
}

// Byte length of the digit token at the start of `input`.
fn digit_shape_len(input: &str) -> Option<usize> {
    let (count, len) = leading_digits(input);
    if count == 0 {
        return None;
    }

    // 8 digits, '_', 6 digits wins over the bare run.
    if count == 8 {
        if let Some(rest) = input[len..].strip_prefix('_') {
            if leading_digits(rest).0 >= 6 {
                let time_len: usize = rest.chars().take(6).map(char::len_utf8).sum();
                return Some(len + 1 + time_len);
            }
        }
    }

    Some(len)
}

// (chars, bytes) of the leading run of digits, any script.
fn leading_digits(input: &str) -> (usize, usize) {
    input
        .char_indices()
        .take_while(|(_, c)| c.is_numeric())
        .fold((0, 0), |(count, _), (i, c)| (count + 1, i + c.len_utf8()))
}
