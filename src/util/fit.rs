//! Fixed-width column helpers for the sync report lines.

const ELLIPSIS: &str = "…";

/// Pad or cut `s` so it occupies exactly `width` columns.
///
/// A cut string keeps its first `width - 1` characters followed by an
/// ellipsis. Widths below 1 collapse to a lone ellipsis.
pub fn fit_string(s: &str, width: usize) -> String {
    if width < 1 {
        return ELLIPSIS.to_string();
    }

    let n = s.chars().count();
    if n < width {
        format!("{s}{}", " ".repeat(width - n))
    } else if n > width {
        let mut cut: String = s.chars().take(width - 1).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        s.to_string()
    }
}

/// Render `tags` as a bracketed, space-joined list within `width` columns.
///
/// Tags are taken in order while they fit. The first tag that does not fit
/// is replaced by an ellipsis (one column) and the rest are dropped. A tag
/// that exactly fills the remaining space is only kept when it is the last
/// one.
pub fn fit_tags<S: AsRef<str>>(tags: &[S], width: usize) -> String {
    if width < 2 {
        return "[]".to_string();
    }

    let mut remaining = width - 2;
    let mut parts: Vec<&str> = Vec::new();

    for (i, tag) in tags.iter().enumerate() {
        let tag = tag.as_ref();
        let mut cost = tag.chars().count();
        if !parts.is_empty() {
            cost += 1;
        }

        if cost < remaining || (cost == remaining && i == tags.len() - 1) {
            parts.push(tag);
            remaining -= cost;
        } else {
            parts.push(ELLIPSIS);
            remaining = remaining.saturating_sub(1);
            break;
        }
    }

    format!("[{}]{}", parts.join(" "), " ".repeat(remaining))
}
