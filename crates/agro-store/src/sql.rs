//! Statement builders shared by the stores.

/// Positional placeholders for a multi-row `VALUES` list.
///
/// `values_list(2, 3)` is `($1, $2, $3), ($4, $5, $6)`. Values are always
/// bound, never spliced into the statement text.
pub fn values_list(rows: usize, columns: usize) -> String {
    (0..rows)
        .map(|row| {
            let cells: Vec<String> = (1..=columns)
                .map(|col| format!("${}", row * columns + col))
                .collect();
            format!("({})", cells.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Like [`values_list`], wrapping the first column of every row in
/// `template`, where `{}` stands for that column's placeholder.
pub fn values_list_with_first(rows: usize, columns: usize, template: &str) -> String {
    (0..rows)
        .map(|row| {
            let cells: Vec<String> = (1..=columns)
                .map(|col| {
                    let placeholder = format!("${}", row * columns + col);
                    if col == 1 {
                        template.replace("{}", &placeholder)
                    } else {
                        placeholder
                    }
                })
                .collect();
            format!("({})", cells.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_row() {
        assert_eq!(values_list(1, 3), "($1, $2, $3)");
    }

    #[test]
    fn numbering_continues_across_rows() {
        assert_eq!(values_list(3, 2), "($1, $2), ($3, $4), ($5, $6)");
    }

    #[test]
    fn no_rows_is_empty() {
        assert_eq!(values_list(0, 7), "");
    }

    #[test]
    fn first_column_template() {
        assert_eq!(
            values_list_with_first(2, 2, "COALESCE({}, 0)"),
            "(COALESCE($1, 0), $2), (COALESCE($3, 0), $4)"
        );
    }
}
