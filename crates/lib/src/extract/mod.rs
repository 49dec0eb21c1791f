//! # Dictionary Extraction
//!
//! Pulls a year→value series out of free-form model output. Extraction runs in
//! two stages: balanced brace-delimited spans are located (nesting and string
//! aware), then each span is parsed with the safe literal parser in
//! [`literal`] and validated as a numeric, strictly ascending series.

pub mod literal;

use crate::{
    errors::ExtractionError,
    types::{DataPoint, Series},
};
use literal::{parse_literal, Literal};
use tracing::debug;

/// The smallest series worth charting.
pub const MIN_SERIES_POINTS: usize = 3;

/// Upper bound on candidate spans tried per response.
const MAX_CANDIDATES: usize = 32;

/// Extracts the first valid series embedded in `raw_text`.
///
/// Every `{` is a potential start, tried in order of appearance, so a mapping
/// wrapped in an outer object is still found. If no candidate validates, the
/// failure of the first candidate is returned.
pub fn extract_series(raw_text: &str) -> Result<Series, ExtractionError> {
    let mut first_error = None;

    for start in raw_text
        .match_indices('{')
        .map(|(i, _)| i)
        .take(MAX_CANDIDATES)
    {
        let attempt = balanced_span(raw_text, start)
            .and_then(|span| parse_series(span, start));
        match attempt {
            Ok(series) => return Ok(series),
            Err(e) => {
                debug!(start, error = %e, "Rejected candidate mapping");
                first_error.get_or_insert(e);
            }
        }
    }

    Err(first_error.unwrap_or(ExtractionError::NoMapping))
}

/// Returns the substring from the `{` at `start` through its matching `}`.
fn balanced_span(text: &str, start: usize) -> Result<&str, ExtractionError> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q || c == '\n' {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    Err(ExtractionError::Unbalanced(start))
}

/// Parses one span and validates it as a series.
fn parse_series(span: &str, offset: usize) -> Result<Series, ExtractionError> {
    let literal = parse_literal(span).map_err(|e| ExtractionError::Malformed {
        position: offset + e.position,
        message: e.message,
    })?;
    let Literal::Map(entries) = literal else {
        return Err(ExtractionError::NotAMapping);
    };

    let mut points: Vec<DataPoint> = Vec::with_capacity(entries.len());
    for (index, (key, value)) in entries.iter().enumerate() {
        let (Some(key), Some(value)) = (as_number(key), as_number(value)) else {
            return Err(ExtractionError::NonNumeric {
                index,
                entry: format!("{key:?}: {value:?}"),
            });
        };
        if points.last().is_some_and(|prev| prev.key >= key) {
            return Err(ExtractionError::NotAscending { index });
        }
        points.push(DataPoint { key, value });
    }

    if points.len() < MIN_SERIES_POINTS {
        return Err(ExtractionError::TooFewEntries {
            found: points.len(),
            required: MIN_SERIES_POINTS,
        });
    }
    Ok(Series::new(points))
}

/// Numbers, and strings that hold a number (JSON forces keys to be strings).
fn as_number(literal: &Literal) -> Option<f64> {
    match literal {
        Literal::Number(n) => Some(*n),
        Literal::Str(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(series: &Series) -> Vec<(f64, f64)> {
        series.points().iter().map(|p| (p.key, p.value)).collect()
    }

    #[test]
    fn extracts_plain_python_dict() {
        let series = extract_series("{2020: 5, 2021: 7, 2022: 9}").unwrap();
        assert_eq!(pairs(&series), vec![(2020.0, 5.0), (2021.0, 7.0), (2022.0, 9.0)]);
    }

    #[test]
    fn extracts_json_from_prose_and_code_fence() {
        let text = "Here is the data:\n```json\n{\"2019\": 1.5, \"2020\": 2.5, \"2021\": 4}\n```\nThanks!";
        let series = extract_series(text).unwrap();
        assert_eq!(pairs(&series), vec![(2019.0, 1.5), (2020.0, 2.5), (2021.0, 4.0)]);
    }

    #[test]
    fn no_braces_is_no_mapping() {
        assert_eq!(extract_series("no braces here"), Err(ExtractionError::NoMapping));
    }

    #[test]
    fn malformed_literal_is_an_error_not_a_panic() {
        assert!(matches!(
            extract_series("{invalid python: :}"),
            Err(ExtractionError::Malformed { .. })
        ));
    }

    #[test]
    fn nested_mapping_is_found_inside_wrapper() {
        let text = r#"{"revenue": {2021: 10, 2022: 12, 2023: 15}}"#;
        let series = extract_series(text).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.points()[2].value, 15.0);
    }

    #[test]
    fn descending_keys_are_rejected() {
        assert_eq!(
            extract_series("{2022: 1, 2021: 2, 2020: 3}"),
            Err(ExtractionError::NotAscending { index: 1 })
        );
    }

    #[test]
    fn too_few_entries_are_rejected() {
        assert_eq!(
            extract_series("{2021: 1, 2022: 2}"),
            Err(ExtractionError::TooFewEntries {
                found: 2,
                required: MIN_SERIES_POINTS
            })
        );
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        assert!(matches!(
            extract_series("{2020: 'high', 2021: 'higher', 2022: 'highest'}"),
            Err(ExtractionError::NonNumeric { index: 0, .. })
        ));
    }

    #[test]
    fn unbalanced_braces_are_reported() {
        assert_eq!(
            extract_series("{2020: 5, 2021: 7"),
            Err(ExtractionError::Unbalanced(0))
        );
    }

    #[test]
    fn braces_inside_strings_do_not_close_the_span() {
        let text = r#"{"note}": 1, "2020": 2}"#;
        assert_eq!(balanced_span(text, 0).unwrap(), text);
    }
}
