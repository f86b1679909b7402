//! Descriptor renderer.
//!
//! Pure function from one entity's live attributes plus the current directory
//! snapshot to a fixed-budget list of display lines.  The host hides empty
//! lines; the renderer always emits exactly `line_budget` entries so slot
//! assignment stays positional.

use crate::rules::RuleTables;
use crate::types::{DirectorySnapshot, EntitySnapshot};

/// Marker the platform inference keys on: present in the cosmetics
/// descriptor of desktop-platform players.
const DESKTOP_MARKER: &str = "FIRST LOGIN";

/// Frame rate rendered with a severity color, `<color=red>42Hz</color>`
/// style.  Missing or zero samples render as empty.
fn colorize_fps(fps: Option<u32>) -> String {
    let fps = match fps {
        Some(v) if v > 0 => v,
        _ => return String::new(),
    };
    let color = match fps {
        0..=59 => "red",
        60..=89 => "yellow",
        90..=119 => "green",
        _ => "cyan",
    };
    format!("<color={}>{}Hz</color>", color, fps)
}

/// Render the display lines for one entity.
///
/// Line layout: identity, platform/frame-rate status, match-tag plus rarity
/// tags, session-property tag, then reserved empties up to `line_budget`.
/// Deterministic: identical inputs produce identical output.
pub fn render_lines(
    entity: &EntitySnapshot,
    snapshot: &DirectorySnapshot,
    tables: &RuleTables,
    line_budget: usize,
) -> Vec<String> {
    let mut lines = vec![String::new(); line_budget];
    if line_budget == 0 {
        return lines;
    }

    let owner = match &entity.owner {
        Some(owner) => owner,
        None => return lines,
    };

    let mut match_tag = String::new();
    match snapshot.get(&owner.id) {
        Some(record) => {
            lines[0] = format!("<color=yellow>{}</color>", record.display_name);
            match_tag = format!("<color=magenta>[ID MATCH - {}]</color>", record.role);
        }
        None => {
            lines[0] = owner.display_name.clone();
        }
    }

    if line_budget > 1 {
        let platform = if entity.cosmetics.contains(DESKTOP_MARKER) {
            "<color=blue>STEAM</color>"
        } else {
            "<color=gray>QUEST</color>"
        };
        lines[1] = format!("{} | {}", platform, colorize_fps(entity.frame_rate));
    }

    if line_budget > 2 {
        let mut tags: Vec<String> = Vec::new();
        if !match_tag.is_empty() {
            tags.push(match_tag);
        }
        for label in tables.rarity.token_matches(&entity.cosmetics) {
            tags.push(format!("<color=red>[{}]</color>", label));
        }
        lines[2] = tags.join(" ");
    }

    if line_budget > 3 {
        if let Some(label) = tables.properties.first_match(&entity.session_props) {
            lines[3] = label.to_string();
        }
    }

    lines
}
