//! Textual rendering of result sets.
//!
//! Rows render as a list of tuples, `[(1, 'a'), (2, None)]`. Single-column
//! rows keep the trailing comma, `[(42,)]`. An empty result renders as "".

/// How a column's text values are rendered. Anything not known to be
/// numeric or boolean is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnKind {
    Numeric,
    Boolean,
    #[default]
    Text,
}

/// Render text-protocol rows. `None` is SQL NULL. `kinds` is indexed by
/// column; missing entries render as text.
pub fn render_rows(rows: &[Vec<Option<String>>], kinds: &[ColumnKind]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let rendered: Vec<String> = rows
        .iter()
        .map(|row| {
            let values: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, v)| render_value(v.as_deref(), kinds.get(i).copied().unwrap_or_default()))
                .collect();
            if values.len() == 1 {
                format!("({},)", values[0])
            } else {
                format!("({})", values.join(", "))
            }
        })
        .collect();

    format!("[{}]", rendered.join(", "))
}

/// NULL renders as `None`. Numbers render bare, booleans as `True`/`False`,
/// text quoted.
pub fn render_value(value: Option<&str>, kind: ColumnKind) -> String {
    match (value, kind) {
        (None, _) => "None".to_string(),
        (Some(v), ColumnKind::Numeric) if is_finite_number(v) => v.to_string(),
        (Some("t"), ColumnKind::Boolean) => "True".to_string(),
        (Some("f"), ColumnKind::Boolean) => "False".to_string(),
        (Some(v), _) => quote(v),
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

// NaN and Infinity come back from float and numeric columns as words.
fn is_finite_number(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ColumnKind::{Boolean, Numeric, Text};

    fn row(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[test]
    fn test_single_numeric_value() {
        assert_eq!(render_rows(&[row(&[Some("15342.75")])], &[Numeric]), "[(15342.75,)]");
    }

    #[test]
    fn test_mixed_row_types() {
        let rows = vec![
            row(&[Some("1"), Some("Widget"), None]),
            row(&[Some("2"), Some("O'Brien"), Some("t")]),
        ];
        assert_eq!(
            render_rows(&rows, &[Numeric, Text, Boolean]),
            r"[(1, 'Widget', None), (2, 'O\'Brien', True)]"
        );
    }

    #[test]
    fn test_empty_result_is_empty_string() {
        assert_eq!(render_rows(&[], &[Numeric]), "");
    }

    #[test]
    fn test_text_columns_stay_quoted() {
        assert_eq!(render_value(Some("t"), Text), "'t'");
        assert_eq!(render_value(Some("f"), Text), "'f'");
        assert_eq!(render_value(Some("007"), Text), "'007'");
        assert_eq!(render_value(Some("2024-01-05"), Text), "'2024-01-05'");
    }

    #[test]
    fn test_numeric_columns() {
        assert_eq!(render_value(Some("-3.5"), Numeric), "-3.5");
        assert_eq!(render_value(Some("1e3"), Numeric), "1e3");
        assert_eq!(render_value(Some("NaN"), Numeric), "'NaN'");
        assert_eq!(render_value(Some("Infinity"), Numeric), "'Infinity'");
    }

    #[test]
    fn test_unknown_column_types_render_as_text() {
        let rows = vec![row(&[Some("1"), Some("t")])];
        assert_eq!(render_rows(&rows, &[]), "[('1', 't')]");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let rows = vec![row(&[Some("a"), Some("1")]), row(&[Some("b"), Some("2")])];
        let kinds = [Text, Numeric];
        assert_eq!(render_rows(&rows, &kinds), render_rows(&rows.clone(), &kinds));
    }
}
