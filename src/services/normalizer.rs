//! Cleanup of raw OCR output before it is chunked and sent to the model.

use regex::Regex;
use std::sync::OnceLock;

/// Lines shorter than this after cleaning carry no usable content.
pub const MIN_LINE_CHARS: usize = 5;

struct Patterns {
    skip: Vec<Regex>,
    whitespace: Regex,
    control: Regex,
    prompt_echo: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let skip = [
            // page numbers
            r"^\s*\d+\s*$",
            r"^\s*$",
            // bracketed matrix values
            r"\[\s*-?\d+\s+-?\d+\s+-?\d+\s*\]",
            // content-stream operators with numeric operands, e.g. "/F1 12 Tf"
            r"(?:^|\s)(?:-?\d+(?:\.\d+)?\s+)+(?:TJ|Tj|Tf|Tm|Td|TD|TL|Tc|Tw|Tz)(?:\s|$)",
            // transformation matrices
            r"-?\d+\.\d+\s+-?\d+\.\d+\s+-?\d+\.\d+\s+-?\d+\.\d+\s+-?\d+\.\d+\s+-?\d+\.\d+\s+cm",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static normalizer pattern"))
        .collect();

        Patterns {
            skip,
            whitespace: Regex::new(r"\s+").expect("static normalizer pattern"),
            control: Regex::new(r"[\x00-\x1F\x7F]").expect("static normalizer pattern"),
            prompt_echo: Regex::new(r"(?i)(?:guidelines?|flashcards?|cards?)\s+for\s+creating")
                .expect("static normalizer pattern"),
        }
    })
}

/// Remove layout artifacts and noise lines from extracted text.
///
/// Kept lines are trimmed, have internal whitespace collapsed to single
/// spaces and control characters removed, and are joined with `\n`.
pub fn normalize_text(raw: &str) -> String {
    let p = patterns();

    let kept: Vec<String> = raw
        .lines()
        .filter(|line| !p.skip.iter().any(|re| re.is_match(line)))
        .filter_map(|line| {
            let collapsed = p.whitespace.replace_all(line.trim(), " ");
            let cleaned = p.control.replace_all(&collapsed, "").trim().to_string();
            (cleaned.chars().count() >= MIN_LINE_CHARS).then_some(cleaned)
        })
        .collect();

    p.prompt_echo.replace_all(&kept.join("\n"), "").into_owned()
}
