//! Evaluator assignment.
//!
//! Each case walks a priority list of specialist roles chosen by clinical
//! need and takes the first role with any headcount. Slots within a role are
//! numbered round-robin, so a role never runs out; it just cycles.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::case::{Phase, TriageCategory};

/// Label returned when no qualified role has headcount.
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SpecialistRole {
    GeneralSurgery,
    OrthopaedicSurgery,
    Anesthesiology,
    EmergencyMedicine,
    FamilyPhysician,
    ErNurse,
    ErcNurse,
    IcuNurse,
    MedSurgNurse,
}

const SURGICAL_PRIORITY: [SpecialistRole; 4] = [
    SpecialistRole::GeneralSurgery,
    SpecialistRole::OrthopaedicSurgery,
    SpecialistRole::Anesthesiology,
    SpecialistRole::EmergencyMedicine,
];

const URGENT_PRIORITY: [SpecialistRole; 4] = [
    SpecialistRole::EmergencyMedicine,
    SpecialistRole::FamilyPhysician,
    SpecialistRole::ErNurse,
    SpecialistRole::ErcNurse,
];

const ROUTINE_PRIORITY: [SpecialistRole; 4] = [
    SpecialistRole::IcuNurse,
    SpecialistRole::MedSurgNurse,
    SpecialistRole::ErNurse,
    SpecialistRole::FamilyPhysician,
];

impl SpecialistRole {
    /// Canonical role name as used in staffing tables.
    pub fn name(self) -> &'static str {
        match self {
            SpecialistRole::GeneralSurgery => "General Surgery",
            SpecialistRole::OrthopaedicSurgery => "Orthopaedic Surgery",
            SpecialistRole::Anesthesiology => "Anesthesiology",
            SpecialistRole::EmergencyMedicine => "Emergency Medicine",
            SpecialistRole::FamilyPhysician => "Family Physician",
            SpecialistRole::ErNurse => "ER Nurse",
            SpecialistRole::ErcNurse => "ERC Nurse",
            SpecialistRole::IcuNurse => "ICU Nurse",
            SpecialistRole::MedSurgNurse => "Med Surg Nurse",
        }
    }

    /// Short prefix for numbered evaluator labels, e.g. "Gen Surg 2".
    pub fn label_prefix(self) -> &'static str {
        match self {
            SpecialistRole::GeneralSurgery => "Gen Surg",
            SpecialistRole::OrthopaedicSurgery => "Ortho",
            SpecialistRole::Anesthesiology => "Anesthesia",
            SpecialistRole::EmergencyMedicine => "EM",
            SpecialistRole::FamilyPhysician => "FP",
            SpecialistRole::ErNurse => "ER RN",
            SpecialistRole::ErcNurse => "ERC RN",
            SpecialistRole::IcuNurse => "ICU RN",
            SpecialistRole::MedSurgNurse => "Med Surg RN",
        }
    }

    /// Resolves a staffing-table role name, including the intake form's aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let role = match name.trim().to_lowercase().as_str() {
            "general surgery" | "general surgeon" => SpecialistRole::GeneralSurgery,
            "orthopaedic surgery" | "orthopedic surgery" | "orthopedic surgeon"
            | "orthopaedic surgeon" => SpecialistRole::OrthopaedicSurgery,
            "anesthesiology" | "anesthesiologist" => SpecialistRole::Anesthesiology,
            "emergency medicine" | "em doc" | "em physician" => SpecialistRole::EmergencyMedicine,
            "family physician" | "fp" => SpecialistRole::FamilyPhysician,
            "er nurse" => SpecialistRole::ErNurse,
            "erc nurse" => SpecialistRole::ErcNurse,
            "icu nurse" | "critical care nurse" => SpecialistRole::IcuNurse,
            "med surg nurse" => SpecialistRole::MedSurgNurse,
            _ => return None,
        };
        Some(role)
    }

    pub fn is_surgical_track(self) -> bool {
        SURGICAL_PRIORITY.contains(&self)
    }
}

impl fmt::Display for SpecialistRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Roles to try, in order, for a case.
pub fn priority_for(required_phases: &[Phase], triage: TriageCategory) -> &'static [SpecialistRole] {
    if required_phases.contains(&Phase::Surgery) {
        &SURGICAL_PRIORITY
    } else if triage.is_urgent() {
        &URGENT_PRIORITY
    } else {
        &ROUTINE_PRIORITY
    }
}

/// Headcount per specialist role.
#[derive(Debug, Clone, Default)]
pub struct StaffingTable {
    capacity: HashMap<SpecialistRole, u32>,
}

impl StaffingTable {
    /// Builds the table from a free-form role map. Aliases of one role add up;
    /// roles the assignment engine does not use are ignored.
    pub fn from_names(specialists: &HashMap<String, u32>) -> Self {
        let mut capacity = HashMap::new();
        for (name, count) in specialists {
            if let Some(role) = SpecialistRole::from_name(name) {
                *capacity.entry(role).or_insert(0) += *count;
            }
        }
        Self { capacity }
    }

    pub fn with_role(mut self, role: SpecialistRole, headcount: u32) -> Self {
        self.capacity.insert(role, headcount);
        self
    }

    pub fn capacity(&self, role: SpecialistRole) -> u32 {
        self.capacity.get(&role).copied().unwrap_or(0)
    }
}

/// Running assignment counts for one schedule generation run.
#[derive(Debug, Clone, Default)]
pub struct AssignmentState {
    counts: HashMap<SpecialistRole, u32>,
}

impl AssignmentState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, role: SpecialistRole) -> u32 {
        self.counts.get(&role).copied().unwrap_or(0)
    }

    /// Counts keyed by role name.
    pub fn by_name(&self) -> HashMap<String, u32> {
        self.counts
            .iter()
            .map(|(role, count)| (role.name().to_string(), *count))
            .collect()
    }

    /// Assignments made to surgical-track roles.
    pub fn surgical_track_total(&self) -> u32 {
        self.counts
            .iter()
            .filter(|(role, _)| role.is_surgical_track())
            .map(|(_, count)| *count)
            .sum()
    }

    fn record(&mut self, role: SpecialistRole) -> u32 {
        let count = self.counts.entry(role).or_insert(0);
        *count += 1;
        *count
    }
}

/// Assigns an evaluator label to a case, or [`UNASSIGNED`] when no qualified role is staffed.
pub fn assign_evaluator(
    required_phases: &[Phase],
    triage: TriageCategory,
    staffing: &StaffingTable,
    state: &mut AssignmentState,
) -> String {
    let role = priority_for(required_phases, triage)
        .iter()
        .copied()
        .find(|role| staffing.capacity(*role) > 0);

    match role {
        Some(role) => {
            let capacity = staffing.capacity(role);
            let count = state.record(role);
            let slot = (count - 1) % capacity + 1;
            format!("{} {}", role.label_prefix(), slot)
        }
        None => UNASSIGNED.to_string(),
    }
}
