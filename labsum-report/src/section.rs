//! Bounds a diagnostic block so same-named fields elsewhere are not picked up.

use std::sync::LazyLock;

use labsum_core::SectionWindow;
use regex::Regex;

use crate::patterns::{compile, SectionKind};

/// Start anchor plus every anchor that may close the block.
pub struct SectionAnchors {
    pub start: Regex,
    pub ends: Vec<Regex>,
}

static URINALYSIS: LazyLock<SectionAnchors> = LazyLock::new(|| SectionAnchors {
    start: compile(r"ORINA\s+COMPLETA"),
    ends: [
        r"HEMOGLOBINA\s+GLICADA",
        r"PERFIL\s+LIPIDICO",
        r"CREATININA\s+\d",
        r"Muestra\s*:\s*SANGRE",
        r"Nº\s+Orden",
    ]
    .iter()
    .map(|src| compile(src))
    .collect(),
});

pub fn anchors(kind: SectionKind) -> &'static SectionAnchors {
    match kind {
        SectionKind::Urinalysis => &URINALYSIS,
    }
}

/// Slice of `text` belonging to `kind`, or `None` when the block is absent.
pub fn section_text<'t>(text: &'t str, kind: SectionKind, window: SectionWindow) -> Option<&'t str> {
    locate(text, anchors(kind), window)
}

/// Find the first start anchor, then cut at the nearest end anchor found
/// between `header_skip` and `max_chars` characters past it.
pub fn locate<'t>(text: &'t str, anchors: &SectionAnchors, window: SectionWindow) -> Option<&'t str> {
    let start = anchors.start.find(text)?.start();
    let scan_to = char_offset(text, start, window.max_chars);
    let scan_from = char_offset(text, start, window.header_skip).min(scan_to);
    let haystack = &text[scan_from..scan_to];

    let end = anchors
        .ends
        .iter()
        .filter_map(|re| re.find(haystack).map(|m| m.start()))
        .min()
        .map_or(scan_to, |offset| scan_from + offset);

    Some(&text[start..end])
}

/// Byte index `chars` characters after `from`, clamped to the end of `text`.
fn char_offset(text: &str, from: usize, chars: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(idx, _)| from + idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn padding(len: usize) -> String {
        "x".repeat(len)
    }

    #[test]
    fn missing_start_anchor_yields_none() {
        let text = "HEMOGRAMA\nERITROCITOS 4.5\n";
        assert!(section_text(text, SectionKind::Urinalysis, SectionWindow::default()).is_none());
    }

    #[test]
    fn cuts_at_nearest_end_anchor() {
        let text = format!(
            "ORINA COMPLETA\n{}\nERITROCITOS 0-2\nNº Orden 55\nPERFIL LIPIDICO\nERITROCITOS 4.5",
            padding(120)
        );
        let section = section_text(&text, SectionKind::Urinalysis, SectionWindow::default()).unwrap();
        assert!(section.starts_with("ORINA COMPLETA"));
        assert!(section.ends_with("ERITROCITOS 0-2\n"));
    }

    #[test]
    fn end_anchor_inside_header_is_ignored() {
        let text = format!(
            "ORINA COMPLETA Muestra: SANGRE\n{}\nPERFIL LIPIDICO",
            padding(150)
        );
        let section = section_text(&text, SectionKind::Urinalysis, SectionWindow::default()).unwrap();
        assert!(section.contains("Muestra: SANGRE"));
        assert!(!section.contains("PERFIL"));
    }

    #[test]
    fn falls_back_to_max_window() {
        let window = SectionWindow {
            header_skip: 10,
            max_chars: 40,
        };
        let text = format!("ORINA COMPLETA {}", padding(200));
        let section = section_text(&text, SectionKind::Urinalysis, window).unwrap();
        assert_eq!(section.chars().count(), 40);
    }

    #[test]
    fn offsets_respect_multibyte_characters() {
        let window = SectionWindow {
            header_skip: 2,
            max_chars: 17,
        };
        let text = "ORINA COMPLETA ííííííííí";
        let section = section_text(text, SectionKind::Urinalysis, window).unwrap();
        assert_eq!(section, "ORINA COMPLETA íí");
    }
}
