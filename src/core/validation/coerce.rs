//! Value coercion
//!
//! Marker cells are forced to floats and categorical cells to trimmed title
//! case. Neither step ever fails: anything that can't be read becomes
//! missing.

use crate::domain::Cell;

/// Reads a marker cell as a float
///
/// Integers and reals pass through, text is trimmed and parsed. NaN,
/// unparsable text, booleans and nulls are all treated as missing.
pub fn coerce_numeric(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Integer(v) => *v as f64,
        Cell::Real(v) => *v,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        Cell::Bool(_) | Cell::Null => return None,
    };
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// Title-cases a string
///
/// A letter is upper-cased when it starts the string or follows a
/// non-letter, and lower-cased otherwise.
///
/// ```
/// use healthmark::core::validation::coerce::title_case;
///
/// assert_eq!(title_case("type-2 DIABETES"), "Type-2 Diabetes");
/// assert_eq!(title_case("o'neil"), "O'Neil");
/// ```
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(ch);
            prev_letter = false;
        }
    }
    out
}

/// Trims and title-cases a categorical cell; null stays null
pub fn normalize_categorical(cell: &Cell) -> Cell {
    match cell.to_text() {
        Some(text) => Cell::Text(title_case(text.trim())),
        None => Cell::Null,
    }
}
