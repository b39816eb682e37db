use crate::grid::{Cell, Grid};
use crate::layout;
use crate::normalize::normalize_count;
use crate::types::CanonicalRecord;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::path::Path;

/// Counters accumulated while cleaning. Mismatches are warnings: the
/// offending records stay in the canonical set.
#[derive(Debug, Default)]
pub struct CleanReport {
    pub rows_scanned: usize,
    pub parse_failures: usize,
    /// GN codes of records where male + female != total population.
    pub sex_mismatches: Vec<String>,
    /// GN codes of records where the age buckets don't sum to the total.
    pub age_mismatches: Vec<String>,
}

/// Turn the raw grid into the canonical record set. Rows without a GN code
/// are totals rows or blank lines and are filtered out; everything else is
/// retained, consistency warnings included.
pub fn clean_table(grid: &Grid) -> Result<(Vec<CanonicalRecord>, CleanReport)> {
    let header_idx = layout::locate_header(grid)?;
    println!("Headers found at row {}", header_idx);
    let columns = layout::resolve_columns(grid, header_idx)?;

    let mut report = CleanReport::default();
    let mut records = Vec::new();

    for row in grid.iter().skip(header_idx + layout::DATA_ROW_OFFSET) {
        report.rows_scanned += 1;

        let gn_code = cell_text(row, columns.gn_code);
        if gn_code.is_empty() {
            continue;
        }

        let mut count = |idx: usize| {
            let normalized = normalize_count(row.get(idx).unwrap_or(&Cell::Empty));
            if normalized.is_unparsable() {
                report.parse_failures += 1;
            }
            normalized.value()
        };

        records.push(CanonicalRecord {
            province_code: cell_text(row, columns.province_code),
            province_name: cell_text(row, columns.province_name),
            district_code: cell_text(row, columns.district_code),
            district_name: cell_text(row, columns.district_name),
            ds_code: cell_text(row, columns.ds_code),
            ds_name: cell_text(row, columns.ds_name),
            gn_name: cell_text(row, columns.gn_name),
            gn_number: cell_text(row, columns.gn_number),
            total_population: count(columns.total_population),
            male: count(columns.male),
            female: count(columns.female),
            age_0_14: count(columns.age_0_14),
            age_15_59: count(columns.age_15_59),
            age_60_64: count(columns.age_60_64),
            age_65_plus: count(columns.age_65_plus),
            gn_code,
        });
    }

    for record in &records {
        if record.sex_sum() != record.total_population {
            report.sex_mismatches.push(record.gn_code.clone());
        }
        if record.age_sum() != record.total_population {
            report.age_mismatches.push(record.gn_code.clone());
        }
    }

    Ok((records, report))
}

fn cell_text(row: &[Cell], idx: usize) -> String {
    row.get(idx).map(|c| c.to_display()).unwrap_or_default()
}

pub fn write_cleaned_csv(path: &Path, records: &[CanonicalRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
    }
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create cleaned CSV: {:?}", path))?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()
        .with_context(|| format!("Failed to write cleaned CSV: {:?}", path))?;
    Ok(())
}

pub fn read_cleaned_csv(path: &Path) -> Result<Vec<CanonicalRecord>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open cleaned CSV: {:?}", path))?;
    let mut rdr = csv::ReaderBuilder::new().from_reader(file);
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: CanonicalRecord = result?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn grid_with_rows(data_rows: Vec<Vec<Cell>>) -> Grid {
        let header = vec![
            text("Province Code"),
            text("Province"),
            text("District Code"),
            text("District Name"),
            text("DS_Division Code"),
            text("DS_Division Name"),
            text("GN_Division Code"),
            text("GN_Division Name"),
            text("GN_Division Number"),
            text("Sex"),
            Cell::Empty,
            Cell::Empty,
            text("Age"),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
        ];
        let mut sub = vec![Cell::Empty; 9];
        for label in [
            "Total", "Male", "Female", "Total", "0 - 14", "15 - 59", "60 - 64", "65 +",
        ] {
            sub.push(text(label));
        }

        let mut grid = vec![vec![text("metadata line")], header, sub];
        grid.extend(data_rows);
        grid
    }

    fn data_row(gn_code: &str, total: &str, male: &str, female: &str, ages: [&str; 4]) -> Vec<Cell> {
        let mut row = vec![
            text("1"),
            text("Western"),
            text("11"),
            text("Colombo"),
            text("11-03"),
            text("Thimbirigasyaya"),
            if gn_code.is_empty() { Cell::Empty } else { text(gn_code) },
            text("Kollupitiya"),
            text("5"),
            text(total),
            text(male),
            text(female),
            text(total), // redundant age total column
        ];
        for age in ages {
            row.push(text(age));
        }
        row
    }

    #[test]
    fn consistent_record_produces_no_warnings() {
        let grid = grid_with_rows(vec![data_row(
            "11-03-005",
            "1,900",
            "1,000",
            "900",
            ["500", "1000", "200", "200"],
        )]);
        let (records, report) = clean_table(&grid).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_population, 1900);
        assert_eq!(records[0].male, 1000);
        assert!(report.sex_mismatches.is_empty());
        assert!(report.age_mismatches.is_empty());
        assert_eq!(report.parse_failures, 0);
    }

    #[test]
    fn age_mismatch_is_warned_but_record_kept() {
        let grid = grid_with_rows(vec![data_row(
            "11-03-005",
            "1,900",
            "1,000",
            "900",
            ["500", "1000", "200", "100"], // sums to 1800
        )]);
        let (records, report) = clean_table(&grid).unwrap();
        assert_eq!(records.len(), 1);
        assert!(report.sex_mismatches.is_empty());
        assert_eq!(report.age_mismatches, vec!["11-03-005".to_string()]);
    }

    #[test]
    fn rows_without_gn_code_are_dropped_precisely() {
        let grid = grid_with_rows(vec![
            data_row("", "10", "5", "5", ["5", "5", "0", "0"]),
            data_row("11-03-010", "10", "5", "5", ["5", "5", "0", "0"]),
        ]);
        let (records, report) = clean_table(&grid).unwrap();
        assert_eq!(report.rows_scanned, 2);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gn_code, "11-03-010");
    }

    #[test]
    fn unparsable_cells_are_counted_not_fatal() {
        let grid = grid_with_rows(vec![data_row(
            "11-03-005",
            "n/a",
            "1,000",
            "900",
            ["500", "1000", "200", "200"],
        )]);
        let (records, report) = clean_table(&grid).unwrap();
        assert_eq!(records[0].total_population, 0);
        assert_eq!(report.parse_failures, 1);
        // total 0 now disagrees with both sums
        assert_eq!(report.sex_mismatches.len(), 1);
        assert_eq!(report.age_mismatches.len(), 1);
    }

    #[test]
    fn missing_header_aborts_cleaning() {
        let grid: Grid = vec![vec![text("no header")], vec![text("still none")]];
        assert!(clean_table(&grid).is_err());
    }
}
