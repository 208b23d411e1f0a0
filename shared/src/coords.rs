use serde::{Deserialize, Serialize};

const COLUMN_LETTERS: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Zero-based grid position of a territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub column: usize,
    pub row: usize,
}

/// Fixed size of a campaign map. Columns are lettered, rows are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub cols: usize,
    pub rows: usize,
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self { cols: 14, rows: 9 }
    }
}

impl GridDimensions {
    /// Column count actually addressable by a single letter.
    const fn letter_cols(&self) -> usize {
        if self.cols < COLUMN_LETTERS.len() {
            self.cols
        } else {
            COLUMN_LETTERS.len()
        }
    }

    /// `(2, 3)` → `"C4"`. `None` outside the grid.
    pub fn to_label(&self, column: usize, row: usize) -> Option<String> {
        if column >= self.letter_cols() || row >= self.rows {
            return None;
        }
        Some(format!("{}{}", COLUMN_LETTERS[column] as char, row + 1))
    }

    /// `"c4"` → `(2, 3)`. Returns `None` for anything that is not a label on this grid so
    /// callers can skip the offending row and keep going.
    pub fn from_label(&self, label: &str) -> Option<Coordinate> {
        let mut chars = label.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let column = COLUMN_LETTERS[..self.letter_cols()]
            .iter()
            .position(|&c| c as char == letter)?;
        let row_number: usize = digits.parse().ok()?;
        if row_number == 0 || row_number > self.rows {
            return None;
        }

        Some(Coordinate {
            column,
            row: row_number - 1,
        })
    }

    pub fn contains_label(&self, label: &str) -> bool {
        self.from_label(label).is_some()
    }

    pub fn column_headers(&self) -> Vec<String> {
        COLUMN_LETTERS[..self.letter_cols()]
            .iter()
            .map(|&c| (c as char).to_string())
            .collect()
    }

    pub fn row_headers(&self) -> Vec<u32> {
        (1..=self.rows as u32).collect()
    }
}

/// Canonical territory key: trimmed, upper-case, no leading zeros on the row (`" d04"` → `"D4"`).
pub fn normalize_territory(raw: &str) -> String {
    let label = raw.trim().to_uppercase();
    let mut chars = label.chars();
    let Some(letter) = chars.next() else {
        return label;
    };
    let digits = chars.as_str();
    if !letter.is_ascii_alphabetic()
        || digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return label;
    }
    let row = digits.trim_start_matches('0');
    let row = if row.is_empty() { "0" } else { row };
    format!("{letter}{row}")
}

#[cfg(test)]
mod tests {
    use super::{Coordinate, GridDimensions, normalize_territory};

    #[test]
    fn every_cell_roundtrips_through_its_label() {
        let grid = GridDimensions::default();
        for column in 0..grid.cols {
            for row in 0..grid.rows {
                let label = grid.to_label(column, row).expect("in-range label");
                assert_eq!(grid.from_label(&label), Some(Coordinate { column, row }));
            }
        }
    }

    #[test]
    fn labels_use_letter_then_one_based_row() {
        let grid = GridDimensions::default();
        assert_eq!(grid.to_label(0, 0).as_deref(), Some("A1"));
        assert_eq!(grid.to_label(3, 3).as_deref(), Some("D4"));
        assert_eq!(grid.to_label(13, 8).as_deref(), Some("N9"));
    }

    #[test]
    fn out_of_range_indices_have_no_label() {
        let grid = GridDimensions::default();
        assert_eq!(grid.to_label(14, 0), None);
        assert_eq!(grid.to_label(0, 9), None);
    }

    #[test]
    fn parsing_is_case_insensitive_on_the_column() {
        let grid = GridDimensions::default();
        assert_eq!(grid.from_label("m8"), Some(Coordinate { column: 12, row: 7 }));
    }

    #[test]
    fn malformed_labels_are_rejected() {
        let grid = GridDimensions::default();
        for label in ["", "D", "4D", "O1", "A0", "A10", "A-1", "A+1", "A1x", " A1", "ÄA1"] {
            assert_eq!(grid.from_label(label), None, "{label:?} should be invalid");
        }
    }

    #[test]
    fn normalization_trims_and_uppercases() {
        assert_eq!(normalize_territory("  b2 "), "B2");
        assert_eq!(normalize_territory(""), "");
    }

    #[test]
    fn normalization_strips_zero_padding_from_the_row() {
        let grid = GridDimensions::default();
        assert_eq!(normalize_territory("A01"), "A1");
        assert_eq!(normalize_territory(" b002 "), "B2");
        assert_eq!(normalize_territory("A00"), "A0");
        assert_eq!(normalize_territory("A10"), "A10");
        assert_eq!(normalize_territory("4D"), "4D");
        assert_eq!(normalize_territory("A0x"), "A0X");
        for raw in ["a01", "D04", "n09"] {
            let label = normalize_territory(raw);
            let cell = grid.from_label(&label).expect("padded label is on the grid");
            assert_eq!(grid.to_label(cell.column, cell.row), Some(label));
        }
        assert!(!grid.contains_label(&normalize_territory("A00")));
    }

    #[test]
    fn headers_follow_dimensions() {
        let grid = GridDimensions { cols: 3, rows: 2 };
        assert_eq!(grid.column_headers(), vec!["A", "B", "C"]);
        assert_eq!(grid.row_headers(), vec![1, 2]);
    }
}
