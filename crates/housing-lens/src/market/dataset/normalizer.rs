//! Locale-tolerant numeric parsing for the price table.
//!
//! Source files mix `1.234,56` (European) and `1,234.56` (English) notation, and
//! sometimes carry currency or percent symbols. Rules, applied in order:
//!
//! 1. Whitespace (including non-breaking and thin spaces), `€` and `%` are removed.
//! 2. An empty remainder is missing.
//! 3. When both `,` and `.` occur, the right-most one is the decimal separator and the
//!    other is a thousands separator.
//! 4. When only one of them occurs exactly once, it is the decimal separator
//!    (`1.234` and `1,234` both read as one point two three four).
//! 5. When only one of them occurs several times it is thousands grouping, accepted only
//!    if every group after the first has exactly three digits.
//! 6. The canonical text must parse to a finite `f64`; anything else is missing.

pub(crate) fn normalize_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|&ch| !ch.is_whitespace() && !matches!(ch, '€' | '%'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let canonical = canonical_form(&cleaned)?;
    canonical
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn canonical_form(cleaned: &str) -> Option<String> {
    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');

    match (last_comma, last_dot) {
        (None, None) => Some(cleaned.to_string()),
        (Some(comma), Some(dot)) => {
            let (decimal, grouping) = if comma > dot { (',', '.') } else { ('.', ',') };
            let (integer, fraction) = cleaned.rsplit_once(decimal)?;
            if fraction.contains(grouping) {
                return None;
            }
            let integer = strip_grouping(integer, grouping)?;
            Some(format!("{integer}.{fraction}"))
        }
        (Some(_), None) => single_separator(cleaned, ','),
        (None, Some(_)) => single_separator(cleaned, '.'),
    }
}

fn single_separator(cleaned: &str, separator: char) -> Option<String> {
    if cleaned.matches(separator).count() == 1 {
        return Some(cleaned.replace(separator, "."));
    }
    strip_grouping(cleaned, separator)
}

fn strip_grouping(value: &str, separator: char) -> Option<String> {
    let mut groups = value.split(separator);
    let head = groups.next()?;
    let head_digits = head.trim_start_matches(['-', '+']);
    if head_digits.is_empty() || (head_digits.len() > 3 && value.contains(separator)) {
        return None;
    }

    let mut canonical = head.to_string();
    for group in groups {
        if group.len() != 3 || !group.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        canonical.push_str(group);
    }
    Some(canonical)
}

/// Integer years, tolerating spreadsheet exports such as `2014.0`.
pub(crate) fn parse_year(raw: &str) -> Option<i32> {
    let trimmed = raw.trim();
    if let Ok(year) = trimmed.parse::<i32>() {
        return Some(year);
    }

    let value = normalize_decimal(trimmed)?;
    if value.fract() == 0.0 && value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Some(value as i32)
    } else {
        None
    }
}

pub(crate) fn normalize_header(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}
