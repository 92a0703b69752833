//! Tabular data for `coordinates` and `table` payloads.
//!
//! Data series keep their rows as plain text, one row per line, with cells
//! separated by commas, semicolons or whitespace. The helpers here split
//! rows, resolve named tables, and pull numeric points out for the preview.

use fxhash::FxHashMap;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::core::scan::{extract_group_at, extract_optional_arg, find_command, skip_whitespace};

lazy_static! {
    static ref COORDINATE: Regex = Regex::new(r"\(([^()]*)\)").unwrap();
    static ref TABLE_NAME: Regex = Regex::new(r"^\\([a-zA-Z@]+)$").unwrap();
}

/// Named data tables, keyed by control-sequence name without the backslash.
/// Insertion order is kept so listings are stable.
pub type DataTables = IndexMap<String, String>;

/// Collect `\pgfplotstableread{rows}\name` (or `{\name}`) blocks.
pub fn collect_table_reads(code: &str) -> DataTables {
    let mut tables = DataTables::new();
    let mut from = 0;
    while let Some(at) = find_command(code, r"\pgfplotstableread", from) {
        let mut pos = at + r"\pgfplotstableread".len();
        if let Some((_, after)) = extract_optional_arg(code, pos) {
            pos = after;
        }
        let Some((rows, after)) = extract_group_at(code, pos) else {
            from = pos;
            continue;
        };
        pos = skip_whitespace(code, after);
        let name = if code.as_bytes().get(pos) == Some(&b'{') {
            extract_group_at(code, pos).map(|(n, end)| (n.trim().to_string(), end))
        } else {
            let end = code[pos..]
                .char_indices()
                .skip(1)
                .find(|(_, c)| !c.is_ascii_alphabetic() && *c != '@')
                .map(|(i, _)| pos + i)
                .unwrap_or(code.len());
            Some((code[pos..end].to_string(), end))
        };
        match name {
            Some((name, end)) if table_reference(&name).is_some() => {
                let key = name.trim_start_matches('\\').to_string();
                tracing::trace!(table = %key, "collected table read");
                tables.insert(key, normalize_rows(&rows));
                from = end;
            }
            _ => from = pos.max(at + 1),
        }
    }
    tables
}

/// If a table payload is a single control sequence, its name.
pub fn table_reference(content: &str) -> Option<&str> {
    TABLE_NAME
        .captures(content.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// A file reference such as `data.csv`: one token, no separators, not a number.
pub fn is_file_reference(data: &str) -> bool {
    let data = data.trim();
    !data.is_empty()
        && !data.contains(|c: char| c.is_whitespace() || c == ',' || c == ';')
        && data.parse::<f64>().is_err()
}

/// Split one row into trimmed cells.
pub fn split_row(line: &str) -> Vec<&str> {
    if line.contains(',') {
        line.split(',').map(str::trim).collect()
    } else if line.contains(';') {
        line.split(';').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    }
}

/// Meaningful lines of a table body: trimmed, without `\\` row
/// terminators, comments or blanks.
pub fn row_lines(data: &str) -> impl Iterator<Item = &str> {
    data.lines()
        .map(|l| l.trim().trim_end_matches("\\\\").trim_end())
        .filter(|l| !l.is_empty() && !l.starts_with('%') && !l.starts_with('#'))
}

/// Canonical row text: one row per line.
pub fn normalize_rows(data: &str) -> String {
    row_lines(data).collect::<Vec<_>>().join("\n")
}

/// `(1,2) (3,4)` → `1,2\n3,4`. Only the first two components are kept.
pub fn parse_coordinates(body: &str) -> String {
    COORDINATE
        .captures_iter(body)
        .filter_map(|c| {
            let inner = c.get(1)?.as_str();
            let mut parts = inner.split(',').map(str::trim);
            let x = parts.next().filter(|s| !s.is_empty())?;
            let y = parts.next().filter(|s| !s.is_empty())?;
            Some(format!("{},{}", x, y))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rows as `(x,y)` tuples for a `coordinates {...}` payload.
pub fn format_coordinates(data: &str, has_header: bool) -> String {
    row_lines(data)
        .skip(usize::from(has_header))
        .filter_map(|line| {
            let cells = split_row(line);
            match cells.as_slice() {
                [x, y, ..] if !x.is_empty() && !y.is_empty() => Some(format!("({},{})", x, y)),
                _ => None,
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve a column selector: a header name, or a zero-based index.
fn column_index(selector: &str, header: &FxHashMap<&str, usize>, default: usize) -> usize {
    let selector = selector.trim();
    if selector.is_empty() {
        return default;
    }
    header
        .get(selector)
        .copied()
        .or_else(|| selector.parse::<usize>().ok())
        .unwrap_or(default)
}

/// Numeric points for the preview. Rows whose `y` cell is not numeric are
/// skipped; a non-numeric `x` (symbolic bar labels) becomes the row number.
pub fn points(data: &str, x_column: &str, y_column: &str, has_header: bool) -> Vec<(f64, f64)> {
    let mut lines = row_lines(data);
    let mut header: FxHashMap<&str, usize> = FxHashMap::default();
    if has_header {
        if let Some(first) = lines.next() {
            for (i, name) in split_row(first).into_iter().enumerate() {
                header.insert(name, i);
            }
        }
    }
    let xi = column_index(x_column, &header, 0);
    let yi = column_index(y_column, &header, 1);
    lines
        .enumerate()
        .filter_map(|(row, line)| {
            let cells = split_row(line);
            let y = cells.get(yi)?.parse::<f64>().ok()?;
            let x = cells
                .get(xi)
                .and_then(|c| c.parse::<f64>().ok())
                .unwrap_or(row as f64);
            Some((x, y))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collect_table_reads_both_name_forms() {
        let code = r"\pgfplotstableread{
x y
1 2
}\loaded
\pgfplotstableread[col sep=comma]{a,b
3,4}{\other}";
        let tables = collect_table_reads(code);
        assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["loaded", "other"]);
        assert_eq!(tables["loaded"], "x y\n1 2");
        assert_eq!(tables["other"], "a,b\n3,4");
    }

    #[test]
    fn test_table_reference() {
        assert_eq!(table_reference(r" \mydata "), Some("mydata"));
        assert_eq!(table_reference("1,2"), None);
        assert_eq!(table_reference(r"\a \b"), None);
    }

    #[test]
    fn test_file_reference() {
        assert!(is_file_reference("data.csv"));
        assert!(!is_file_reference("1,2\n3,4"));
        assert!(!is_file_reference("42"));
        assert!(!is_file_reference(""));
    }

    #[test]
    fn test_coordinates_round_trip() {
        let rows = parse_coordinates("{(0,0) (1, 1)\n(2,4)}");
        assert_eq!(rows, "0,0\n1,1\n2,4");
        assert_eq!(format_coordinates(&rows, false), "(0,0) (1,1) (2,4)");
        assert_eq!(format_coordinates("x,y\n1,2", true), "(1,2)");
    }

    #[test]
    fn test_row_lines_strip_terminators() {
        let rows = normalize_rows("  a b \\\\\n\n% note\n1 2 \\\\\n");
        assert_eq!(rows, "a b\n1 2");
    }

    #[test]
    fn test_points_by_header_and_index() {
        let data = "t,v,w\n0,1,5\n1,2,6";
        assert_eq!(points(data, "t", "w", true), vec![(0.0, 5.0), (1.0, 6.0)]);
        assert_eq!(points("0 1 5\n1 2 6", "0", "2", false), vec![(0.0, 5.0), (1.0, 6.0)]);
        assert_eq!(points("a,3\nb,4", "", "", false), vec![(0.0, 3.0), (1.0, 4.0)]);
    }
}
