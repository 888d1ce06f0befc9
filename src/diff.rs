//! Section-level comparison of two documents.

use crate::document::SaveDocument;
use std::fmt;

/// A top-level part of the save document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    WaveData,
    Kings,
    Areas,
    Policies,
    HandCards,
    PolicyVariables,
    Blessing,
    /// `Version`, `Message` and unknown top-level keys.
    Passthrough,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Section::WaveData => "WaveData",
            Section::Kings => "Kings",
            Section::Areas => "Areas",
            Section::Policies => "Policies",
            Section::HandCards => "HandCards",
            Section::PolicyVariables => "PolicyVariables",
            Section::Blessing => "Blessing",
            Section::Passthrough => "Passthrough",
        })
    }
}

/// Sections whose content differs between `old` and `new`, in document order.
pub fn changed_sections(old: &SaveDocument, new: &SaveDocument) -> Vec<Section> {
    let checks = [
        (Section::WaveData, old.wave_data != new.wave_data),
        (Section::Kings, old.kings != new.kings),
        (Section::Areas, old.areas != new.areas),
        (Section::Policies, old.policies != new.policies),
        (Section::HandCards, old.hand_cards != new.hand_cards),
        (
            Section::PolicyVariables,
            old.policy_variables != new.policy_variables,
        ),
        (Section::Blessing, old.blessing != new.blessing),
        (Section::Passthrough, old.passthrough != new.passthrough),
    ];
    checks
        .into_iter()
        .filter_map(|(section, changed)| changed.then_some(section))
        .collect()
}

/// Render a section list for log lines, e.g. `"Areas, Policies"`.
pub fn describe(sections: &[Section]) -> String {
    if sections.is_empty() {
        return "nothing".to_string();
    }
    sections
        .iter()
        .map(Section::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
