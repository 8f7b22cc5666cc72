// src/process/tokenize.rs

use csv::ReaderBuilder;
use tracing::{trace, warn};

/// One logical CSV record. May have spanned several physical lines when quoted.
pub type RawRow = Vec<String>;

/// Split CSV text into rows of fields.
///
/// - `""` inside a quoted field is a literal quote.
/// - Commas and line breaks (`\n`, `\r\n`, bare `\r`) inside quotes belong to the field.
/// - A final record without a trailing newline is still emitted.
/// - Rows whose fields are all blank are dropped.
///
/// An unterminated quote runs to end of input; this never fails.
pub fn tokenize(text: &str) -> Vec<RawRow> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // sheets pad rows to different widths
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(record = idx, error = %e, "skipping unreadable CSV record");
                continue;
            }
        };
        let row: RawRow = record.iter().map(str::to_string).collect();
        if row.iter().all(|f| f.trim().is_empty()) {
            trace!(record = idx, "dropping blank row");
            continue;
        }
        rows.push(row);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_comma_stays_in_one_field() {
        let rows = tokenize("a,\"Rao, Asha\",c\n");
        assert_eq!(rows, vec![vec!["a", "Rao, Asha", "c"]]);
    }

    #[test]
    fn quoted_newline_does_not_split_row() {
        let rows = tokenize("1,\"line one\nline two\",x\r\n2,y,z");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], "line one\nline two");
        assert_eq!(rows[1], vec!["2", "y", "z"]);
    }

    #[test]
    fn doubled_quote_is_literal() {
        let rows = tokenize("\"say \"\"hi\"\"\",b");
        assert_eq!(rows, vec![vec!["say \"hi\"", "b"]]);
    }

    #[test]
    fn crlf_and_trailing_row_without_newline() {
        let rows = tokenize("h1,h2\r\nv1,v2");
        assert_eq!(rows, vec![vec!["h1", "h2"], vec!["v1", "v2"]]);
    }

    #[test]
    fn blank_lines_are_discarded() {
        let rows = tokenize("a,b\n\n,,\n  , \nc,d\n");
        assert_eq!(rows, vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn unterminated_quote_closes_at_eof() {
        let rows = tokenize("a,\"open field\nstill open");
        assert_eq!(rows, vec![vec!["a", "open field\nstill open"]]);
    }

    #[test]
    fn ragged_rows_keep_their_own_width() {
        let rows = tokenize("a,b,c\nd\ne,f\n");
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["d"], vec!["e", "f"]]);
    }

    #[test]
    fn trailing_empty_field_is_kept() {
        let rows = tokenize("a,b,\n");
        assert_eq!(rows, vec![vec!["a", "b", ""]]);
    }
}
