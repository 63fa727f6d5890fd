//! Organizational hierarchy: regions → districts → facilities.
//!
//! The catalog resolves a hierarchical [`OrgUnitScope`] into the flat list of
//! facility ids that record fetches are scoped to, and provides the lookup
//! maps the org-unit dimensions extract from.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::model::{DomainValue, OrgLevel, OrgUnitScope};

/// A region or district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnit {
    pub id: String,
    pub name: String,
    /// Parent region, for districts.
    #[serde(default)]
    pub region_id: Option<String>,
}

/// A health facility, the leaf of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub district_id: Option<String>,
    /// Explicit region; falls back to the district's region.
    #[serde(default)]
    pub region_id: Option<String>,
}

/// The org-unit catalogue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrgUnitCatalog {
    pub regions: Vec<OrgUnit>,
    pub districts: Vec<OrgUnit>,
    pub facilities: Vec<Facility>,
}

impl OrgUnitCatalog {
    /// Resolve a scope selection into facility ids, in catalog order.
    ///
    /// Without `include_descendants`, region and district selections are
    /// returned as-is and treated as facility-equivalent ids.
    pub fn resolve(&self, scope: &OrgUnitScope) -> Vec<String> {
        match scope.level {
            OrgLevel::All => self.facilities.iter().map(|f| f.id.clone()).collect(),
            OrgLevel::Facility => dedup(&scope.selected_ids),
            OrgLevel::District | OrgLevel::Region if !scope.include_descendants => {
                dedup(&scope.selected_ids)
            }
            OrgLevel::District => {
                let selected: HashSet<&str> =
                    scope.selected_ids.iter().map(String::as_str).collect();
                self.facilities
                    .iter()
                    .filter(|f| f.district_id.as_deref().is_some_and(|d| selected.contains(d)))
                    .map(|f| f.id.clone())
                    .collect()
            }
            OrgLevel::Region => {
                let selected: HashSet<&str> =
                    scope.selected_ids.iter().map(String::as_str).collect();
                self.facilities
                    .iter()
                    .filter(|f| self.region_of(f).is_some_and(|r| selected.contains(r)))
                    .map(|f| f.id.clone())
                    .collect()
            }
        }
    }

    pub fn facility(&self, id: &str) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.id == id)
    }

    /// The region a facility belongs to, directly or through its district.
    pub fn region_of<'a>(&'a self, facility: &'a Facility) -> Option<&'a str> {
        if let Some(region) = facility.region_id.as_deref() {
            return Some(region);
        }
        let district = facility.district_id.as_deref()?;
        self.districts
            .iter()
            .find(|d| d.id == district)
            .and_then(|d| d.region_id.as_deref())
    }

    /// Facility id -> district id and facility id -> region id maps.
    pub fn parent_maps(&self) -> (HashMap<String, String>, HashMap<String, String>) {
        let mut districts = HashMap::new();
        let mut regions = HashMap::new();
        for facility in &self.facilities {
            if let Some(district) = &facility.district_id {
                districts.insert(facility.id.clone(), district.clone());
            }
            if let Some(region) = self.region_of(facility) {
                regions.insert(facility.id.clone(), region.to_string());
            }
        }
        (districts, regions)
    }

    /// Facility domain restricted to the resolved facility ids.
    ///
    /// Ids with no catalog entry (facility-equivalent selections) keep their
    /// id as label.
    pub fn facility_domain(&self, facility_ids: &[String]) -> Vec<DomainValue> {
        facility_ids
            .iter()
            .map(|id| {
                let label = self.facility(id).map_or(id.as_str(), |f| f.name.as_str());
                DomainValue::new(id.clone(), label)
            })
            .collect()
    }

    /// Districts that contain at least one of the resolved facilities.
    pub fn district_domain(&self, facility_ids: &[String]) -> Vec<DomainValue> {
        let (districts, _) = self.parent_maps();
        let used: HashSet<&String> = facility_ids.iter().filter_map(|f| districts.get(f)).collect();
        self.districts
            .iter()
            .filter(|d| used.contains(&d.id))
            .map(|d| DomainValue::new(d.id.clone(), d.name.clone()))
            .collect()
    }

    /// Regions that contain at least one of the resolved facilities.
    pub fn region_domain(&self, facility_ids: &[String]) -> Vec<DomainValue> {
        let (_, regions) = self.parent_maps();
        let used: HashSet<&String> = facility_ids.iter().filter_map(|f| regions.get(f)).collect();
        self.regions
            .iter()
            .filter(|r| used.contains(&r.id))
            .map(|r| DomainValue::new(r.id.clone(), r.name.clone()))
            .collect()
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect()
}
