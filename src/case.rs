use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{MEDICAL_KEYWORDS, SURGICAL_KEYWORDS};

/// Casualty acuity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriageCategory {
    T1,
    T2,
    T3,
    T4,
}

impl TriageCategory {
    /// Immediate or delayed casualties get the emergency track.
    pub fn is_urgent(self) -> bool {
        matches!(self, TriageCategory::T1 | TriageCategory::T2)
    }
}

impl fmt::Display for TriageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TriageCategory::T1 => "T1",
            TriageCategory::T2 => "T2",
            TriageCategory::T3 => "T3",
            TriageCategory::T4 => "T4",
        };
        f.write_str(text)
    }
}

/// Clinical phases a case may require: DCR, DCS and PCC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Resuscitation,
    Surgery,
    ProlongedCare,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vitals {
    pub heart_rate: u32,
    pub blood_pressure: String,
    pub respiratory_rate: u32,
    pub spo2: u32,
    pub gcs: u32,
}

/// Structured case content as returned by the Narrative Generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CasePayload {
    #[serde(default)]
    pub age: Option<u32>,
    pub mechanism: String,
    pub description: String,
    pub triage: TriageCategory,
    #[serde(default)]
    pub vitals: Option<Vitals>,
    /// Phase name -> narrative notes for that phase.
    #[serde(default)]
    pub phases: BTreeMap<String, serde_json::Value>,
}

/// Where a case's content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseSource {
    Narrative,
    Fallback,
}

/// One clinical training case in the exercise population.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    /// Reference label, assigned once the pool order is final.
    pub case_ref: String,
    /// Injury or illness descriptor the case was planned from.
    pub descriptor: String,
    pub is_trauma: bool,
    pub source: CaseSource,
    pub payload: CasePayload,
    pub required_phases: Vec<Phase>,
}

impl Case {
    pub fn new(
        descriptor: impl Into<String>,
        mechanism_context: &str,
        is_trauma: bool,
        source: CaseSource,
        payload: CasePayload,
    ) -> Self {
        let descriptor = descriptor.into();
        let required_phases = classify_phases(&descriptor, mechanism_context);
        Self {
            case_ref: String::new(),
            descriptor,
            is_trauma,
            source,
            payload,
            required_phases,
        }
    }

    pub fn triage(&self) -> TriageCategory {
        self.payload.triage
    }

    /// Whether the generated content carries a surgery phase.
    pub fn needs_surgery(&self) -> bool {
        self.payload.phases.contains_key("surgery")
    }

    pub fn requires(&self, phase: Phase) -> bool {
        self.required_phases.contains(&phase)
    }
}

/// Keyword classification of the phases a case needs.
///
/// Surgical keywords are checked before medical ones; the first hit wins.
pub fn classify_phases(descriptor: &str, mechanism: &str) -> Vec<Phase> {
    let text = format!("{} {}", descriptor, mechanism).to_lowercase();

    if SURGICAL_KEYWORDS.iter().any(|k| text.contains(k)) {
        return vec![Phase::Resuscitation, Phase::Surgery, Phase::ProlongedCare];
    }
    if MEDICAL_KEYWORDS.iter().any(|k| text.contains(k)) {
        return vec![Phase::Resuscitation, Phase::ProlongedCare];
    }
    vec![Phase::Resuscitation, Phase::Surgery, Phase::ProlongedCare]
}

/// Builds a case from local data only, used when narrative generation fails.
pub fn fallback_payload<R: Rng + ?Sized>(
    descriptor: &str,
    mechanism: &str,
    is_trauma: bool,
    rng: &mut R,
) -> CasePayload {
    let age = rng.gen_range(19..=35);

    let (triage, vitals, actions) = if is_trauma {
        (
            TriageCategory::T2,
            Vitals {
                heart_rate: 118,
                blood_pressure: "98/64".to_string(),
                respiratory_rate: 24,
                spo2: 94,
                gcs: 14,
            },
            vec![
                "Apply tourniquet or wound packing as indicated",
                "Establish IV/IO access",
                "Administer TXA",
            ],
        )
    } else {
        (
            TriageCategory::T3,
            Vitals {
                heart_rate: 96,
                blood_pressure: "122/78".to_string(),
                respiratory_rate: 18,
                spo2: 98,
                gcs: 15,
            },
            vec!["Obtain history and focused exam", "Start oral or IV fluids"],
        )
    };

    let mut phases = BTreeMap::new();
    phases.insert("resuscitation".to_string(), serde_json::json!(actions));
    if is_trauma {
        phases.insert(
            "surgery".to_string(),
            serde_json::json!(["Damage control surgery as indicated"]),
        );
    }
    phases.insert(
        "prolonged_care".to_string(),
        serde_json::json!(["Reassess every 15 minutes", "Prepare for evacuation"]),
    );

    CasePayload {
        age: Some(age),
        mechanism: mechanism.to_string(),
        description: format!("{} year old service member: {}", age, descriptor),
        triage,
        vitals: Some(vitals),
        phases,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_surgical_keyword_wins() {
        let phases = classify_phases("Blast injury with bilateral amputation", "IED");
        assert_eq!(
            phases,
            vec![Phase::Resuscitation, Phase::Surgery, Phase::ProlongedCare]
        );
    }

    #[test]
    fn test_medical_keyword() {
        let phases = classify_phases("Acute appendicitis", "DNBI");
        assert_eq!(phases, vec![Phase::Resuscitation, Phase::ProlongedCare]);
    }

    #[test]
    fn test_surgical_checked_before_medical() {
        // "tbi" is medical, "vascular" surgical: surgical takes precedence
        let phases = classify_phases("TBI with vascular injury to the neck", "Mortar");
        assert!(phases.contains(&Phase::Surgery));
    }

    #[test]
    fn test_no_match_defaults_to_full_set() {
        let phases = classify_phases("Nerve agent exposure", "Chemical");
        assert_eq!(phases.len(), 3);
    }

    #[test]
    fn test_classification_uses_mechanism_text() {
        let phases = classify_phases("Casualty", "Hypothermia after immersion");
        assert_eq!(phases, vec![Phase::Resuscitation, Phase::ProlongedCare]);
    }

    #[test]
    fn test_fallback_payload() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let trauma = fallback_payload("Open tibia fracture", "Frontal Attack", true, &mut rng);
        let age = trauma.age.unwrap();
        assert!((19..=35).contains(&age));
        assert_eq!(trauma.triage, TriageCategory::T2);
        assert!(trauma.phases.contains_key("surgery"));

        let dnbi = fallback_payload("Dental abscess", "DNBI", false, &mut rng);
        assert_eq!(dnbi.triage, TriageCategory::T3);
        assert!(!dnbi.phases.contains_key("surgery"));
    }

    #[test]
    fn test_case_new_classifies() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let payload = fallback_payload("Heat stroke", "DNBI", false, &mut rng);
        let case = Case::new("Heat stroke", "DNBI", false, CaseSource::Fallback, payload);
        assert!(!case.requires(Phase::Surgery));
        assert!(!case.needs_surgery());
        assert_eq!(case.triage(), TriageCategory::T3);
    }
}
