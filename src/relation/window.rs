//! Context windows around an identifier occurrence.

use regex::RegexBuilder;

use super::Identifier;

/// A bounded slice of the source text around an identifier's first occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    /// Window text.
    pub text: String,
    /// Byte offset of the identifier inside `text`.
    pub offset: usize,
    /// Radius (in characters) the window was built with.
    pub radius: usize,
}

impl ContextWindow {
    /// Character position of the identifier inside the window.
    pub fn char_offset(&self) -> usize {
        self.text[..self.offset].chars().count()
    }
}

/// Build a window of `radius` characters on each side of the first
/// case-insensitive occurrence of `id`.
///
/// Returns `None` when the identifier does not occur in `text`; callers treat
/// that as "this path cannot resolve" and move on.
pub fn locate_window(text: &str, id: &Identifier, radius: usize) -> Option<ContextWindow> {
    let (start, end) = find_ignore_case(text, id.as_str())?;

    let window_start = step_back(text, start, radius);
    let window_end = step_forward(text, end, radius);

    Some(ContextWindow {
        text: text[window_start..window_end].to_string(),
        offset: start - window_start,
        radius,
    })
}

/// Byte range of the first case-insensitive occurrence of `needle`.
pub(crate) fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }
    let re = RegexBuilder::new(&regex::escape(needle))
        .case_insensitive(true)
        .build()
        .ok()?;
    re.find(haystack).map(|m| (m.start(), m.end()))
}

/// Byte index `n` characters before `idx`, clamped to 0.
fn step_back(text: &str, idx: usize, n: usize) -> usize {
    if n == 0 {
        return idx;
    }
    text[..idx]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Byte index `n` characters after `idx`, clamped to the text length.
fn step_forward(text: &str, idx: usize, n: usize) -> usize {
    text[idx..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| idx + i)
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pan(s: &str) -> Identifier {
        Identifier::parse(s).unwrap()
    }

    #[test]
    fn test_window_clamped_to_text() {
        let text = "PAN: ABCDE1234F";
        let window = locate_window(text, &pan("ABCDE1234F"), 200).unwrap();
        assert_eq!(window.text, text);
        assert_eq!(window.offset, 5);
        assert_eq!(window.radius, 200);
    }

    #[test]
    fn test_window_radius_bounds() {
        let text = "0123456789ABCDE1234F0123456789";
        let window = locate_window(text, &pan("ABCDE1234F"), 3).unwrap();
        assert_eq!(window.text, "789ABCDE1234F012");
        assert_eq!(window.offset, 3);
    }

    #[test]
    fn test_window_zero_radius_is_identifier() {
        let text = "before abcde1234f after";
        let window = locate_window(text, &pan("ABCDE1234F"), 0).unwrap();
        assert_eq!(window.text, "abcde1234f");
        assert_eq!(window.offset, 0);
    }

    #[test]
    fn test_window_uses_first_occurrence() {
        let text = "ABCDE1234F first, then much later ABCDE1234F again";
        let window = locate_window(text, &pan("ABCDE1234F"), 5).unwrap();
        assert_eq!(window.offset, 0);
        assert_eq!(window.text, "ABCDE1234F firs");
    }

    #[test]
    fn test_window_respects_char_boundaries() {
        let text = "Société Générale ABCDE1234F — Zürich";
        let window = locate_window(text, &pan("ABCDE1234F"), 4).unwrap();
        assert_eq!(window.text, "ale ABCDE1234F — Z");
        assert_eq!(window.char_offset(), 4);
        assert!(window.text[window.offset..].starts_with("ABCDE1234F"));
    }

    #[test]
    fn test_window_absent_identifier() {
        assert!(locate_window("nothing here", &pan("ABCDE1234F"), 200).is_none());
    }

    #[test]
    fn test_find_ignore_case() {
        assert_eq!(find_ignore_case("Hello John SMITH", "john smith"), Some((6, 16)));
        assert_eq!(find_ignore_case("abc", ""), None);
        assert_eq!(find_ignore_case("a.b", "."), Some((1, 2)));
    }
}
