use crate::types::{CanonicalRecord, GnFeature};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// GN names recur under different districts, so a bare name is unsafe as a
/// join key. Both sides of the join must go through this exact
/// normalization or matching silently fails.
pub fn compose_key(parent: &str, name: &str) -> String {
    format!(
        "{}|{}",
        parent.trim().to_uppercase(),
        name.trim().to_uppercase()
    )
}

/// Unmatched keys listed in the report.
pub const MAX_UNMATCHED_LISTED: usize = 20;
/// Unmatched keys that get a candidate search.
pub const MAX_SUGGESTION_SOURCES: usize = 5;
/// Candidates returned per unmatched key.
pub const MAX_CANDIDATES: usize = 5;
/// Records used when a requested DS division scope matches nothing.
pub const SCOPE_FALLBACK_ROWS: usize = 50;

#[derive(Debug)]
pub struct LinkageReport {
    pub scope: Option<String>,
    pub total: usize,
    pub matched: usize,
    /// Sorted composite keys present in the records but absent from the map.
    pub unmatched: Vec<String>,
    /// For leading unmatched keys, feature keys containing the first four
    /// characters of the division name. Hints only, never matches.
    pub suggestions: Vec<(String, Vec<String>)>,
}

/// Match record keys against feature keys. Equality of composed keys is the
/// sole matching criterion; the substring candidates are human-reviewable
/// hints and never establish a match.
pub fn link_records(
    records: &[CanonicalRecord],
    features: &[GnFeature],
    scope: Option<&str>,
) -> LinkageReport {
    let scoped: Vec<&CanonicalRecord> = match scope {
        Some(ds) => {
            let subset: Vec<&CanonicalRecord> = records
                .iter()
                .filter(|r| r.ds_name.trim() == ds)
                .collect();
            if subset.is_empty() {
                println!(
                    "Warning: No data found for DS Division '{}'. Using leading sample.",
                    ds
                );
                records.iter().take(SCOPE_FALLBACK_ROWS).collect()
            } else {
                subset
            }
        }
        None => records.iter().collect(),
    };

    let record_keys: BTreeSet<String> = scoped
        .iter()
        .map(|r| compose_key(&r.district_name, &r.gn_name))
        .collect();
    let feature_keys: BTreeSet<String> = features
        .iter()
        .map(|f| compose_key(f.district.as_deref().unwrap_or(""), &f.name))
        .collect();

    let matched = record_keys.intersection(&feature_keys).count();
    let unmatched: Vec<String> = record_keys.difference(&feature_keys).cloned().collect();

    let suggestions = unmatched
        .iter()
        .take(MAX_SUGGESTION_SOURCES)
        .map(|key| (key.clone(), candidate_keys(key, &feature_keys)))
        .collect();

    LinkageReport {
        scope: scope.map(str::to_string),
        total: record_keys.len(),
        matched,
        unmatched,
        suggestions,
    }
}

/// Feature keys containing the first four characters of the unmatched
/// division name.
fn candidate_keys(unmatched: &str, feature_keys: &BTreeSet<String>) -> Vec<String> {
    let name = unmatched.rsplit('|').next().unwrap_or(unmatched);
    let stem: String = name.chars().take(4).collect();
    if stem.is_empty() {
        return Vec::new();
    }
    feature_keys
        .iter()
        .filter(|key| key.contains(&stem))
        .take(MAX_CANDIDATES)
        .cloned()
        .collect()
}

pub fn write_mismatch_report(path: &Path, report: &LinkageReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create report directory: {:?}", parent))?;
        }
    }

    let mut out = String::new();
    match &report.scope {
        Some(ds) => out.push_str(&format!("--- Analysis for DS: {} ---\n", ds)),
        None => out.push_str("--- Analysis for all divisions ---\n"),
    }
    out.push_str(&format!("Total GN in CSV: {}\n", report.total));
    out.push_str(&format!("Successfully Matched: {}\n", report.matched));
    out.push_str(&format!(
        "Missing in Map (CSV has it, Map doesn't): {}\n\n",
        report.unmatched.len()
    ));

    out.push_str("--- Missing Examples (CSV Names) ---\n");
    for key in report.unmatched.iter().take(MAX_UNMATCHED_LISTED) {
        out.push_str(&format!("'{}'\n", key));
    }

    out.push_str("\n--- Available Map Names (Sample likely matches) ---\n");
    for (key, candidates) in &report.suggestions {
        out.push_str(&format!("\nLooking for matches for: '{}'\n", key));
        for candidate in candidates {
            out.push_str(&format!("  Candidate: '{}'\n", candidate));
        }
    }

    fs::write(path, out).with_context(|| format!("Failed to write mismatch report: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ds: &str, district: &str, name: &str) -> CanonicalRecord {
        CanonicalRecord {
            province_code: "1".to_string(),
            province_name: "Western".to_string(),
            district_code: "11".to_string(),
            district_name: district.to_string(),
            ds_code: "11-03".to_string(),
            ds_name: ds.to_string(),
            gn_code: "11-03-005".to_string(),
            gn_name: name.to_string(),
            gn_number: "5".to_string(),
            total_population: 0,
            male: 0,
            female: 0,
            age_0_14: 0,
            age_15_59: 0,
            age_60_64: 0,
            age_65_plus: 0,
        }
    }

    fn feature(district: &str, name: &str) -> GnFeature {
        GnFeature {
            name: name.to_string(),
            district: Some(district.to_string()),
            centroid: None,
        }
    }

    #[test]
    fn key_composition_is_case_and_whitespace_insensitive() {
        assert_eq!(
            compose_key("Colombo", "Kollupitiya "),
            compose_key(" COLOMBO", "kollupitiya")
        );
        assert_eq!(compose_key("Colombo", "Kollupitiya"), "COLOMBO|KOLLUPITIYA");
    }

    #[test]
    fn same_name_under_other_district_does_not_match() {
        let records = vec![record("Thimbirigasyaya", "Colombo", "Kollupitiya")];
        let features = vec![feature("Gampaha", "Kollupitiya")];

        let report = link_records(&records, &features, None);
        assert_eq!(report.total, 1);
        assert_eq!(report.matched, 0);
        assert_eq!(report.unmatched, vec!["COLOMBO|KOLLUPITIYA".to_string()]);
        let (key, candidates) = &report.suggestions[0];
        assert_eq!(key, "COLOMBO|KOLLUPITIYA");
        assert!(candidates.contains(&"GAMPAHA|KOLLUPITIYA".to_string()));
    }

    #[test]
    fn exact_composite_keys_match() {
        let records = vec![
            record("Thimbirigasyaya", "Colombo", "Kollupitiya"),
            record("Thimbirigasyaya", "Colombo", "Bambalapitiya"),
        ];
        let features = vec![
            feature("Colombo", " kollupitiya "),
            feature("Colombo", "Bambalapitiya"),
        ];

        let report = link_records(&records, &features, None);
        assert_eq!(report.total, 2);
        assert_eq!(report.matched, 2);
        assert!(report.unmatched.is_empty());
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn scope_filters_on_trimmed_ds_name() {
        let records = vec![
            record(" Thimbirigasyaya ", "Colombo", "Kollupitiya"),
            record("Homagama", "Colombo", "Pitipana"),
        ];
        let features = vec![feature("Colombo", "Kollupitiya")];

        let report = link_records(&records, &features, Some("Thimbirigasyaya"));
        assert_eq!(report.total, 1);
        assert_eq!(report.matched, 1);
    }

    #[test]
    fn empty_scope_falls_back_to_leading_sample() {
        let records = vec![
            record("Thimbirigasyaya", "Colombo", "Kollupitiya"),
            record("Homagama", "Colombo", "Pitipana"),
        ];
        let features = vec![feature("Colombo", "Kollupitiya")];

        let report = link_records(&records, &features, Some("Nuwara"));
        // Fallback keeps the leading records rather than reporting nothing.
        assert_eq!(report.total, 2);
        assert_eq!(report.matched, 1);
        assert_eq!(report.unmatched, vec!["COLOMBO|PITIPANA".to_string()]);
    }

    #[test]
    fn features_without_district_key_on_empty_parent() {
        let records = vec![record("Thimbirigasyaya", "", "Kollupitiya")];
        let features = vec![GnFeature {
            name: "Kollupitiya".to_string(),
            district: None,
            centroid: None,
        }];

        let report = link_records(&records, &features, None);
        assert_eq!(report.matched, 1);
    }
}
