/// Parse a number written with Greek (`1.500.000`, `85,5`) or English
/// (`1,500,000`, `85.5`) separators.
///
/// Rules:
/// - both `.` and `,` present: the later one is the decimal separator
/// - one kind of separator, repeated or followed by exactly three digits:
///   thousands separator (`1.500` is fifteen hundred)
/// - otherwise the single separator is the decimal point
///
/// Leading/trailing separators and spaces are ignored. Anything else that
/// is not a digit makes the input invalid.
pub fn parse_localized_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    let s = cleaned.trim_matches(|c| c == '.' || c == ',');

    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return None;
    }

    let normalized = match (s.rfind('.'), s.rfind(',')) {
        (None, None) => s.to_string(),
        (Some(dot), Some(comma)) => {
            let decimal_at = dot.max(comma);
            let integer: String = s[..decimal_at]
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            format!("{}.{}", integer, &s[decimal_at + 1..])
        }
        (Some(_), None) => single_separator(s, '.')?,
        (None, Some(_)) => single_separator(s, ',')?,
    };

    normalized.parse::<f64>().ok()
}

fn single_separator(s: &str, sep: char) -> Option<String> {
    let groups: Vec<&str> = s.split(sep).collect();
    if groups.iter().any(|g| g.is_empty()) {
        return None;
    }

    let tail_is_thousands = groups[1..].iter().all(|g| g.len() == 3);
    if groups.len() > 2 {
        // 1.500.000 is only valid as grouped thousands
        return tail_is_thousands.then(|| groups.concat());
    }

    if tail_is_thousands && groups[0] != "0" {
        Some(groups.concat())
    } else {
        Some(format!("{}.{}", groups[0], groups[1]))
    }
}

/// First run of digits in `text`, as an integer.
pub fn first_integer(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
