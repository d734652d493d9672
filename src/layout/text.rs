use crate::config::SizeConfig;
use crate::text_metrics;

const ELLIPSIS: char = '…';

pub(super) fn char_width_factor(ch: char) -> f32 {
    // Calibrated per-character widths for a sans-serif UI stack at a 16px
    // baseline, as fractions of the font size.
    match ch {
        ' ' => 0.306,
        '\\' | '.' | ',' | ':' | ';' | '|' | '!' | '(' | ')' | '[' | ']' | '{' | '}' => 0.321,
        '/' | '-' | '_' => 0.402,
        '*' | '+' | '=' | '<' | '>' | '?' => 0.524,
        'A' | 'V' | 'X' | 'Y' => 0.652,
        'B' | 'K' | 'R' => 0.640,
        'C' | 'D' | 'U' | 'N' => 0.740,
        'E' | 'P' | 'S' | 'Z' => 0.610,
        'F' | 'L' | 'T' => 0.575,
        'G' | 'H' | 'O' | 'Q' => 0.750,
        'I' => 0.272,
        'J' => 0.557,
        'M' => 0.903,
        'W' => 0.958,
        'f' | 'r' | 't' => 0.340,
        'i' | 'j' | 'l' => 0.235,
        'm' => 0.867,
        'w' => 0.811,
        'a' | 'c' | 'e' | 's' | 'v' | 'x' | 'y' | 'z' | 'k' => 0.550,
        'b' | 'd' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 0.595,
        '1' => 0.396,
        '0'..='9' => 0.605,
        '@' | '#' | '%' | '&' => 0.946,
        _ if ch.is_ascii() => 0.568,
        // CJK and other wide glyphs.
        _ => 1.0,
    }
}

pub(super) fn text_width(text: &str, config: &SizeConfig) -> f32 {
    if config.fast_text_metrics && text.is_ascii() {
        return fallback_text_width(text, config.font_size);
    }
    text_metrics::measure_text_width(text, config.font_size, &config.font_family)
        .unwrap_or_else(|| fallback_text_width(text, config.font_size))
}

fn fallback_text_width(text: &str, font_size: f32) -> f32 {
    text.chars().map(char_width_factor).sum::<f32>() * font_size
}

/// Shortens `text` with a trailing ellipsis until it fits `max_width`.
pub(super) fn ellipsize(text: &str, max_width: f32, config: &SizeConfig) -> String {
    if text_width(text, config) <= max_width {
        return text.to_string();
    }
    let budget = max_width - char_width_factor(ELLIPSIS) * config.font_size;
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let prefix: String = chars.iter().collect();
        if text_width(&prefix, config) <= budget {
            return format!("{prefix}{ELLIPSIS}");
        }
    }
    ELLIPSIS.to_string()
}
