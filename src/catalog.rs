//! Fixed injury, illness and keyword catalogs used by case planning.

/// Generic combat trauma descriptors used when no MASCAL etiology applies.
pub const GENERIC_TRAUMA: &[&str] = &[
    "Gunshot wound to the thigh with arterial bleeding",
    "Blast injury with bilateral lower extremity amputation",
    "Penetrating chest trauma with tension pneumothorax",
    "Fragmentation wounds to the abdomen with evisceration",
    "Open tibia fracture",
    "Gunshot wound to the chest with hemothorax",
    "Partial thickness burns to 25% TBSA",
    "Blunt head trauma with loss of consciousness",
    "Crush injury to the pelvis",
    "Neck laceration with vascular injury",
];

/// Generic disease and non-battle injury descriptors valid in any environment.
pub const GENERIC_DNBI: &[&str] = &[
    "Acute appendicitis",
    "Ankle sprain during patrol",
    "Gastroenteritis with dehydration",
    "Fever of unknown origin",
    "Lower back strain from load carriage",
    "Dental abscess",
];

/// Environment-specific DNBI descriptors, keyed by environment tag.
const ENVIRONMENT_DNBI: &[(&str, &[&str])] = &[
    (
        "Desert",
        &["Heat stroke", "Heat exhaustion", "Scorpion envenomation", "Sand fly fever"],
    ),
    (
        "Jungle",
        &["Snake envenomation", "Malaria with fever", "Leptospirosis", "Immersion foot"],
    ),
    (
        "Arctic",
        &["Hypothermia", "Frostbite to the feet", "Cold weather injury", "Snow blindness"],
    ),
    (
        "Mountain",
        &["Acute altitude illness", "High altitude pulmonary edema", "Hypothermia"],
    ),
    (
        "Urban",
        &["Smoke inhalation", "Crush syndrome after structural collapse", "Dog bite"],
    ),
];

/// MASCAL etiology -> injury list drawn from on MASCAL days.
const MASCAL_ETIOLOGIES: &[(&str, &[&str])] = &[
    (
        "IED",
        &[
            "IED blast with traumatic amputation of the leg",
            "IED blast with fragmentation wounds and vascular injury",
            "Blast lung injury",
            "IED blast with mild TBI",
            "Tympanic membrane rupture with fragmentation wounds",
        ],
    ),
    (
        "Mortar",
        &[
            "Mortar fragmentation wounds to the torso",
            "Mortar blast with evisceration",
            "Fragmentation wound to the arm with arterial bleeding",
            "Concussion with TBI after mortar impact",
        ],
    ),
    (
        "Vehicle Rollover",
        &[
            "Crush syndrome from vehicle rollover",
            "Pelvic fracture from vehicle rollover",
            "Cervical spine injury from rollover",
            "Femur fracture",
        ],
    ),
    (
        "Building Collapse",
        &[
            "Crush syndrome after building collapse",
            "Open femur fracture",
            "Blunt chest trauma with hemothorax",
            "Dust inhalation injury",
        ],
    ),
    (
        "Chemical",
        &[
            "Nerve agent exposure",
            "Blister agent burns",
            "Chlorine inhalation injury",
        ],
    ),
];

/// Tactical settings treated as high-intensity assault patterns.
const HIGH_INTENSITY_SETTINGS: &[&str] = &[
    "amphibious assault",
    "frontal attack",
    "seizure",
    "raid",
    "assault",
];

/// Keywords that put a case on the surgical track.
pub const SURGICAL_KEYWORDS: &[&str] = &[
    "amputation",
    "evisceration",
    "vascular",
    "arterial",
    "hemothorax",
    "pneumothorax",
    "crush syndrome",
    "pelvic fracture",
    "open femur",
    "open tibia",
    "burns to",
    "tbsa",
];

/// Keywords for medically managed cases.
pub const MEDICAL_KEYWORDS: &[&str] = &[
    "fever",
    "hypothermia",
    "envenomation",
    "altitude",
    "appendicitis",
    "tbi",
    "heat stroke",
    "dehydration",
    "frostbite",
    "inhalation",
];

/// Looks up the DNBI list for an environment (case-insensitive); empty if unknown.
pub fn environment_dnbi(environment: &str) -> &'static [&'static str] {
    ENVIRONMENT_DNBI
        .iter()
        .find(|(env, _)| env.eq_ignore_ascii_case(environment.trim()))
        .map(|(_, list)| *list)
        .unwrap_or(&[])
}

/// Looks up the injury list for a MASCAL etiology (case-insensitive).
pub fn mascal_injuries(etiology: &str) -> Option<&'static [&'static str]> {
    MASCAL_ETIOLOGIES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(etiology.trim()))
        .map(|(_, list)| *list)
}

pub fn is_high_intensity(tactical_setting: &str) -> bool {
    let setting = tactical_setting.to_lowercase();
    HIGH_INTENSITY_SETTINGS.iter().any(|s| setting.contains(s))
}
