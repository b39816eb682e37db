use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::fs::File;
use std::path::Path;

/// A raw export cell, reduced to the three shapes the cleaning stages
/// care about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Render a cell for an identifier or name column. Numeric cells print
    /// without a trailing `.0`.
    pub fn to_display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
        }
    }
}

pub type Grid = Vec<Vec<Cell>>;

/// Load the raw export fully into memory, dispatching on the file extension.
pub fn load_grid(path: &Path, sheet: &str) -> Result<Grid> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Census export {:?} has no file extension", path))?;

    match extension.as_str() {
        "xlsx" | "xls" | "xlsb" | "ods" => load_spreadsheet(path, sheet),
        "csv" | "txt" => load_delimited(path, b','),
        "tsv" => load_delimited(path, b'\t'),
        _ => Err(anyhow!("Unsupported census export format: {}", extension)),
    }
}

fn load_spreadsheet(path: &Path, sheet: &str) -> Result<Grid> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open spreadsheet: {:?}", path))?;
    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("Failed to read sheet '{}' from {:?}", sheet, path))?;

    let mut grid = Vec::with_capacity(range.height());
    for row in range.rows() {
        let cells = row
            .iter()
            .map(|cell| match cell {
                Data::Empty => Cell::Empty,
                Data::String(s) => Cell::Text(s.clone()),
                Data::Float(n) => Cell::Number(*n),
                Data::Int(n) => Cell::Number(*n as f64),
                Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
                Data::DateTime(dt) => Cell::Number(dt.as_f64()),
                Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
                Data::Error(_) => Cell::Empty,
            })
            .collect();
        grid.push(cells);
    }
    Ok(grid)
}

fn load_delimited(path: &Path, delimiter: u8) -> Result<Grid> {
    let file =
        File::open(path).with_context(|| format!("Failed to open census export: {:?}", path))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(file);

    let mut grid = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let cells = record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect();
        grid.push(cells);
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn displays_numeric_cells_without_trailing_zero() {
        assert_eq!(Cell::Number(1.0).to_display(), "1");
        assert_eq!(Cell::Number(11.5).to_display(), "11.5");
        assert_eq!(Cell::Text("  Colombo ".to_string()).to_display(), "Colombo");
        assert_eq!(Cell::Empty.to_display(), "");
    }

    #[test]
    fn loads_delimited_grid_with_ragged_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "a,b,c").unwrap();
        writeln!(file, "d, ,f,g").unwrap();
        drop(file);

        let grid = load_grid(&path, "ignored").unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid[0].len(), 3);
        assert_eq!(grid[1].len(), 4);
        assert_eq!(grid[1][1], Cell::Empty);
        assert_eq!(grid[1][3], Cell::Text("g".to_string()));
    }

    #[test]
    fn rejects_unknown_extension() {
        let err = load_grid(Path::new("export.parquet"), "Population").unwrap_err();
        assert!(err.to_string().contains("Unsupported census export format"));
    }

    #[test]
    fn rejects_missing_extension() {
        let err = load_grid(Path::new("export"), "Population").unwrap_err();
        assert!(err.to_string().contains("no file extension"));
    }
}
