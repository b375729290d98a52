//! Onboarding preset resolution.
//!
//! The wizard asks each role three branching questions; the answer triple
//! maps to a preset id, and the preset decides which journey template a new
//! member is seeded from. Only presets with a finished template are allowed
//! to open a timeline.

use serde::{Deserialize, Serialize};

/// Presets that have a complete journey template behind them.
const COMPLETED_PRESETS: &[&str] = &["EDA3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    IntendedParent,
    EggDonor,
    Surrogate,
}

/// Maps a role's three questionnaire answers to a preset id.
///
/// Intended parents answer (donor eggs, donor sperm, need surrogate), egg
/// donors (prior experience, bank donation, agency managed), surrogates
/// (prior experience, willing to travel, agency managed). Unknown answer
/// combinations fall back to `"Exception"` for roles whose intake always
/// resolves, and to `None` for egg donors, matching the intake flow.
pub fn assign_preset(role: MemberRole, answers: [&str; 3]) -> Option<&'static str> {
    match role {
        MemberRole::IntendedParent => Some(intended_parent_preset(answers)),
        MemberRole::EggDonor => egg_donor_preset(answers),
        MemberRole::Surrogate => Some(surrogate_preset(answers)),
    }
}

/// Whether a full journey template exists for the preset.
pub fn template_ready(preset: &str) -> bool {
    COMPLETED_PRESETS.contains(&preset)
}

fn intended_parent_preset([eggs, sperm, surrogate]: [&str; 3]) -> &'static str {
    let surrogacy = match surrogate {
        "Yes" => true,
        "No" => false,
        _ => return "Exception",
    };

    let stem = match (eggs, sperm) {
        ("Yes, fresh eggs", "No - own frozen sperm") => 1,
        ("Yes, frozen eggs", "No - own frozen sperm") => 2,
        ("Yes, fresh eggs", "No - own fresh sperm") => 3,
        ("Yes, frozen eggs", "No - own fresh sperm") => 4,
        ("No, using my own fresh eggs", "Yes - fresh donor sperm") => 5,
        ("No, using my own frozen eggs", "Yes - frozen donor sperm") => 6,
        ("No, using my own fresh eggs", "No - own fresh sperm") => 7,
        ("No, using my own frozen eggs", "No - own fresh sperm") => 8,
        ("No, using my own fresh eggs", "No - own frozen sperm") => 9,
        ("No, using my own frozen eggs", "No - own frozen sperm") => 10,
        _ => return "Exception",
    };

    // IPS11/IPO11 exist in the intake design but are not enabled yet.
    const SURROGACY: [&str; 10] = [
        "IPS1", "IPS2", "IPS3", "IPS4", "IPS5", "IPS6", "IPS7", "IPS8", "IPS9", "IPS10",
    ];
    const OWN_PREGNANCY: [&str; 10] = [
        "IPO1", "IPO2", "IPO3", "IPO4", "IPO5", "IPO6", "IPO7", "IPO8", "IPO9", "IPO10",
    ];

    if surrogacy {
        SURROGACY[stem - 1]
    } else {
        OWN_PREGNANCY[stem - 1]
    }
}

fn egg_donor_preset([experience, bank, agency]: [&str; 3]) -> Option<&'static str> {
    match (experience, bank, agency) {
        ("Yes", "No", "Yes") => Some("EDA1"),
        ("Yes", "Yes", "Yes") => Some("EDA2"),
        ("No", "No", "Yes") => Some("EDA3"),
        ("No", "Yes", "Yes") => Some("EDA4"),
        ("Yes", "No", "No") => Some("EDI1"),
        ("Yes", "Yes", "No") => Some("EDI2"),
        ("No", "No", "No") => Some("EDI3"),
        ("No", "Yes", "No") => Some("EDI4"),
        _ => None,
    }
}

fn surrogate_preset([experience, travel, agency]: [&str; 3]) -> &'static str {
    match (experience, travel, agency) {
        ("Yes", "Yes", "Yes") => "SA1",
        ("Yes", "No", "Yes") => "SA2",
        ("No", "Yes", "Yes") => "SA3",
        ("No", "No", "Yes") => "SA4",
        ("Yes", "Yes", "No") => "SI1",
        ("Yes", "No", "No") => "SI2",
        ("No", "Yes", "No") => "SI3",
        ("No", "No", "No") => "SI4",
        _ => "Exception",
    }
}
