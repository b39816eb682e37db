use crate::grid::{Cell, Grid};
use anyhow::{bail, Result};

/// Literal substring that marks the primary header row.
pub const HEADER_MARKER: &str = "Province Code";

/// Rows between the marker row and the first data row. The export carries a
/// two-line header: the primary row and a sub-header row beneath it.
pub const DATA_ROW_OFFSET: usize = 2;

/// The 16 canonical fields with the header labels they resolve against,
/// in output order. Labels are matched against normalized effective labels
/// (primary header forward-filled across merged spans, qualified by the
/// sub-header). The redundant age total under `AGE TOTAL` has no entry and
/// is discarded.
const EXPECTED_COLUMNS: [(&str, &str); 16] = [
    ("Province_Code", "PROVINCE CODE"),
    ("Province_Name", "PROVINCE"),
    ("District_Code", "DISTRICT CODE"),
    ("District_Name", "DISTRICT NAME"),
    ("DS_Code", "DS DIVISION CODE"),
    ("DS_Name", "DS DIVISION NAME"),
    ("GN_Code", "GN DIVISION CODE"),
    ("GN_Name", "GN DIVISION NAME"),
    ("GN_Number", "GN DIVISION NUMBER"),
    ("Total_Population", "SEX TOTAL"),
    ("Male", "SEX MALE"),
    ("Female", "SEX FEMALE"),
    ("Age_0_14", "AGE 0 14"),
    ("Age_15_59", "AGE 15 59"),
    ("Age_60_64", "AGE 60 64"),
    ("Age_65_Plus", "AGE 65"),
];

/// Resolved column index for each canonical field.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub province_code: usize,
    pub province_name: usize,
    pub district_code: usize,
    pub district_name: usize,
    pub ds_code: usize,
    pub ds_name: usize,
    pub gn_code: usize,
    pub gn_name: usize,
    pub gn_number: usize,
    pub total_population: usize,
    pub male: usize,
    pub female: usize,
    pub age_0_14: usize,
    pub age_15_59: usize,
    pub age_60_64: usize,
    pub age_65_plus: usize,
}

/// Scan rows top-to-bottom for the first one containing the header marker.
/// The positional layout below the header is meaningless without it, so a
/// missing marker aborts the run.
pub fn locate_header(grid: &Grid) -> Result<usize> {
    for (idx, row) in grid.iter().enumerate() {
        let hit = row.iter().any(|cell| match cell {
            Cell::Text(s) => s.contains(HEADER_MARKER),
            _ => false,
        });
        if hit {
            return Ok(idx);
        }
    }
    bail!("Could not find header row containing '{}'", HEADER_MARKER)
}

/// Uppercase a label and collapse runs of non-alphanumeric characters into
/// single spaces, so "DS_Division  Code" and "DS Division Code" compare
/// equal.
fn normalize_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(ch.to_uppercase());
        } else {
            pending_space = true;
        }
    }
    out
}

/// Compose an effective label per column from the two-line header. The
/// primary row is forward-filled across merged spans so grouped columns
/// inherit their group name ("Sex" + "Male" -> "SEX MALE").
fn effective_labels(grid: &Grid, header_idx: usize) -> Vec<String> {
    let header = &grid[header_idx];
    let sub = grid.get(header_idx + 1);
    let width = header.len().max(sub.map_or(0, |r| r.len()));

    let mut labels = Vec::with_capacity(width);
    let mut carried = String::new();
    for col in 0..width {
        let primary = header
            .get(col)
            .map(|c| normalize_label(&c.to_display()))
            .unwrap_or_default();
        if !primary.is_empty() {
            carried = primary.clone();
        }
        let sub_label = sub
            .and_then(|r| r.get(col))
            .map(|c| normalize_label(&c.to_display()))
            .unwrap_or_default();

        let effective = if sub_label.is_empty() {
            primary
        } else if carried.is_empty() {
            sub_label
        } else {
            format!("{} {}", carried, sub_label)
        };
        labels.push(effective);
    }
    labels
}

/// True when `label` is `expected` or `expected` followed by further words,
/// so "AGE 65" accepts "AGE 65 AND ABOVE" but not "AGE 650".
fn label_matches_prefix(label: &str, expected: &str) -> bool {
    label.starts_with(expected)
        && (label.len() == expected.len() || label.as_bytes()[expected.len()] == b' ')
}

/// Resolve each canonical field to a column index by its header label.
/// Exact matches win; a word-boundary prefix match covers variant suffixes.
/// Any field left without a column is a fatal layout error.
pub fn resolve_columns(grid: &Grid, header_idx: usize) -> Result<ColumnMap> {
    let labels = effective_labels(grid, header_idx);
    let mut resolved: [Option<usize>; 16] = [None; 16];
    let mut claimed = vec![false; labels.len()];

    for (slot, (_, expected)) in EXPECTED_COLUMNS.iter().enumerate() {
        if let Some(col) = labels
            .iter()
            .enumerate()
            .find(|(i, label)| !claimed[*i] && label.as_str() == *expected)
            .map(|(i, _)| i)
        {
            claimed[col] = true;
            resolved[slot] = Some(col);
        }
    }
    for (slot, (_, expected)) in EXPECTED_COLUMNS.iter().enumerate() {
        if resolved[slot].is_some() {
            continue;
        }
        if let Some(col) = labels
            .iter()
            .enumerate()
            .find(|(i, label)| !claimed[*i] && label_matches_prefix(label, expected))
            .map(|(i, _)| i)
        {
            claimed[col] = true;
            resolved[slot] = Some(col);
        }
    }

    let missing: Vec<&str> = EXPECTED_COLUMNS
        .iter()
        .zip(resolved.iter())
        .filter(|(_, col)| col.is_none())
        .map(|((field, _), _)| *field)
        .collect();
    if !missing.is_empty() {
        bail!(
            "Header located at row {} but expected columns are missing: {}",
            header_idx,
            missing.join(", ")
        );
    }

    let col = |slot: usize| resolved[slot].unwrap();
    Ok(ColumnMap {
        province_code: col(0),
        province_name: col(1),
        district_code: col(2),
        district_name: col(3),
        ds_code: col(4),
        ds_name: col(5),
        gn_code: col(6),
        gn_name: col(7),
        gn_number: col(8),
        total_population: col(9),
        male: col(10),
        female: col(11),
        age_0_14: col(12),
        age_15_59: col(13),
        age_60_64: col(14),
        age_65_plus: col(15),
    })
}
