//! Nearest-mention resolution inside a context window.

use super::{find_ignore_case, ContextWindow, EntityKind};

/// Pick the candidate name whose first occurrence in the window is closest to
/// the identifier.
///
/// Persons are evaluated before organizations and only a strictly smaller
/// distance replaces the current best, so a person wins a tie with an
/// organization. Names that never occur in the window text are skipped.
pub fn resolve_nearest(
    window: &ContextWindow,
    persons: &[String],
    organizations: &[String],
) -> Option<(String, EntityKind)> {
    let id_pos = window.char_offset();

    let candidates = persons
        .iter()
        .map(|name| (name, EntityKind::Person))
        .chain(organizations.iter().map(|name| (name, EntityKind::Organization)));

    let mut best: Option<(usize, &String, EntityKind)> = None;

    for (name, kind) in candidates {
        let Some((start, _)) = find_ignore_case(&window.text, name) else {
            log::debug!("Candidate '{}' not present in window, skipping", name);
            continue;
        };
        let name_pos = window.text[..start].chars().count();
        let distance = name_pos.abs_diff(id_pos);

        if best.map_or(true, |(closest, _, _)| distance < closest) {
            best = Some((distance, name, kind));
        }
    }

    best.map(|(_, name, kind)| (name.clone(), kind))
}
