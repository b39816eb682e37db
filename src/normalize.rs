use crate::grid::Cell;

/// Outcome of coercing a raw cell into a count.
///
/// Blank and unparsable cells both coerce to zero; keeping them apart lets
/// the cleaning stage report how many cells failed to parse instead of
/// folding them into legitimate zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalized {
    Blank,
    Value(u32),
    Unparsable,
}

impl Normalized {
    pub fn value(self) -> u32 {
        match self {
            Normalized::Value(n) => n,
            Normalized::Blank | Normalized::Unparsable => 0,
        }
    }

    pub fn is_unparsable(self) -> bool {
        matches!(self, Normalized::Unparsable)
    }
}

/// Clean numeric strings with thousands separators and convert to an
/// integer count. Numeric cells are truncated.
pub fn normalize_count(cell: &Cell) -> Normalized {
    match cell {
        Cell::Empty => Normalized::Blank,
        Cell::Number(n) => {
            let truncated = n.trunc();
            if truncated >= 0.0 && truncated <= f64::from(u32::MAX) {
                Normalized::Value(truncated as u32)
            } else {
                Normalized::Unparsable
            }
        }
        Cell::Text(s) => {
            if s.trim().is_empty() {
                return Normalized::Blank;
            }
            let cleaned = s.replace(',', "");
            match cleaned.trim().parse::<u32>() {
                Ok(n) => Normalized::Value(n),
                Err(_) => Normalized::Unparsable,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn strips_thousands_separators_and_whitespace() {
        assert_eq!(normalize_count(&text("1,234 ")), Normalized::Value(1234));
        assert_eq!(
            normalize_count(&text(" 1,234,567")),
            Normalized::Value(1234567)
        );
    }

    #[test]
    fn blank_and_whitespace_are_zero() {
        assert_eq!(normalize_count(&Cell::Empty), Normalized::Blank);
        assert_eq!(normalize_count(&text("   ")), Normalized::Blank);
        assert_eq!(normalize_count(&Cell::Empty).value(), 0);
    }

    #[test]
    fn numeric_cells_truncate() {
        assert_eq!(normalize_count(&Cell::Number(1234.0)), Normalized::Value(1234));
        assert_eq!(normalize_count(&Cell::Number(12.7)), Normalized::Value(12));
        assert_eq!(normalize_count(&Cell::Number(0.0)), Normalized::Value(0));
    }

    #[test]
    fn unparsable_text_is_zero_and_flagged() {
        let outcome = normalize_count(&text("N/A"));
        assert_eq!(outcome, Normalized::Unparsable);
        assert_eq!(outcome.value(), 0);
        assert!(outcome.is_unparsable());
        assert!(normalize_count(&Cell::Number(-5.0)).is_unparsable());
    }
}
