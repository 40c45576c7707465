// src/classify/mod.rs

//! Static procedure-code classification.
//!
//! Four lookups chain together: group code → group name, (group, subgroup)
//! → subgroup name, subgroup name → category label, and full code →
//! anatomical region for the imaging categories. Every step has a fallback
//! label, so classifying a code never fails.

mod tables;

use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const OTHER_GROUP: &str = "Other Group";
pub const OTHER_SUBGROUP: &str = "Other Subgroup";
pub const OTHER_DIAGNOSTICS: &str = "Other Diagnostics";
pub const GENERAL_REGION: &str = "General";
pub const OTHER_DIAGNOSTIC_REGION: &str = "Other Diagnostic Region";

/// Group code of procedures with a diagnostic purpose.
pub const DIAGNOSTIC_GROUP: &str = "02";

/// Categories that are broken down by anatomical region.
pub const DETAILED_CATEGORIES: [&str; 3] = ["RM", "TC", "RX"];

static TABLES: Lazy<ClassificationTables> = Lazy::new(ClassificationTables::build);

/// Outcome of the two-level subgroup lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubgroupLookup {
    Found(&'static str),
    /// The group has no subgroup catalogue at all.
    UnknownGroup,
    /// The group is catalogued but this subgroup code is not.
    UnknownSubgroup,
}

impl SubgroupLookup {
    pub fn label(self) -> &'static str {
        match self {
            SubgroupLookup::Found(name) => name,
            SubgroupLookup::UnknownGroup | SubgroupLookup::UnknownSubgroup => OTHER_SUBGROUP,
        }
    }
}

/// First lookup level that had to fall back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unmapped {
    Group,
    Subgroup,
    Category,
    BodyRegion,
}

/// Every label derived from one procedure code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcedureClass {
    pub group: &'static str,
    pub subgroup: &'static str,
    pub category: &'static str,
    pub body_region: &'static str,
    pub unmapped: Option<Unmapped>,
}

/// Read-only lookup tables, built once per process.
#[derive(Debug)]
pub struct ClassificationTables {
    groups: HashMap<&'static str, &'static str>,
    subgroups: HashMap<&'static str, HashMap<&'static str, &'static str>>,
    categories: HashMap<&'static str, &'static str>,
    body_regions: HashMap<&'static str, &'static str>,
}

impl ClassificationTables {
    fn build() -> Self {
        Self {
            groups: tables::GROUPS.iter().copied().collect(),
            subgroups: tables::SUBGROUPS
                .iter()
                .map(|(group, inner)| (*group, inner.iter().copied().collect()))
                .collect(),
            categories: tables::CATEGORIES.iter().copied().collect(),
            body_regions: tables::BODY_REGIONS.iter().copied().collect(),
        }
    }

    /// The process-wide tables.
    pub fn global() -> &'static Self {
        &TABLES
    }

    pub fn group_name(&self, group_code: &str) -> Option<&'static str> {
        self.groups.get(group_code).copied()
    }

    pub fn subgroup(&self, group_code: &str, subgroup_code: &str) -> SubgroupLookup {
        match self.subgroups.get(group_code) {
            None => SubgroupLookup::UnknownGroup,
            Some(inner) => inner
                .get(subgroup_code)
                .map_or(SubgroupLookup::UnknownSubgroup, |name| {
                    SubgroupLookup::Found(name)
                }),
        }
    }

    pub fn category(&self, subgroup_name: &str) -> Option<&'static str> {
        self.categories.get(subgroup_name).copied()
    }

    pub fn body_region(&self, procedure_code: &str) -> Option<&'static str> {
        self.body_regions.get(procedure_code).copied()
    }

    /// Resolve the whole lookup chain for a procedure code.
    ///
    /// The code is trimmed; group and subgroup come from characters `[0,2)`
    /// and `[2,4)`. Short or non-ASCII codes resolve to fallbacks.
    pub fn classify(&self, procedure_code: &str) -> ProcedureClass {
        let code = procedure_code.trim();
        let group_code = code.get(0..2).unwrap_or("");
        let subgroup_code = code.get(2..4).unwrap_or("");
        let mut unmapped = None;

        let group = self.group_name(group_code).unwrap_or_else(|| {
            unmapped.get_or_insert(Unmapped::Group);
            OTHER_GROUP
        });

        let lookup = self.subgroup(group_code, subgroup_code);
        if !matches!(lookup, SubgroupLookup::Found(_)) {
            unmapped.get_or_insert(Unmapped::Subgroup);
        }
        let subgroup = lookup.label();

        let category = self.category(subgroup).unwrap_or_else(|| {
            unmapped.get_or_insert(Unmapped::Category);
            OTHER_DIAGNOSTICS
        });

        let body_region = if is_detailed(category) {
            self.body_region(code).unwrap_or_else(|| {
                unmapped.get_or_insert(Unmapped::BodyRegion);
                OTHER_DIAGNOSTIC_REGION
            })
        } else {
            GENERAL_REGION
        };

        ProcedureClass {
            group,
            subgroup,
            category,
            body_region,
            unmapped,
        }
    }
}

pub fn is_detailed(category: &str) -> bool {
    DETAILED_CATEGORIES.contains(&category)
}

/// Whether a procedure code belongs to the diagnostic group.
pub fn is_diagnostic(procedure_code: &str) -> bool {
    procedure_code.trim().get(0..2) == Some(DIAGNOSTIC_GROUP)
}
