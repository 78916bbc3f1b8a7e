//! Reading scope pairs from the batch CSV file.
//!
//! Columns are source org, source project, target org and target project.
//! A header row is optional; when present, columns are matched by name.

use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use transplant_migrate::ScopeRow;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Read every row of the file, in order.
///
/// Rows are returned as written; incomplete rows are filtered later by
/// the batch runner so they can be reported.
pub fn read_rows(path: &Path) -> Result<Vec<ScopeRow>, InputError> {
    let wrap = |source: csv::Error| InputError::Csv {
        path: path.display().to_string(),
        source,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(wrap)?;

    let mut records = reader.records();
    let Some(first) = records.next().transpose().map_err(wrap)? else {
        return Ok(Vec::new());
    };

    let mut rows: Vec<ScopeRow> = Vec::new();
    if is_header(&first) {
        for record in records {
            let record = record.map_err(wrap)?;
            rows.push(record.deserialize(Some(&first)).map_err(wrap)?);
        }
    } else {
        rows.push(positional(&first));
        for record in records {
            rows.push(positional(&record.map_err(wrap)?));
        }
    }
    Ok(rows)
}

fn is_header(record: &StringRecord) -> bool {
    record.get(0).is_some_and(|cell| {
        let normalized: String = cell
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        normalized == "sourceorg"
    })
}

fn positional(record: &StringRecord) -> ScopeRow {
    let cell = |index: usize| {
        record
            .get(index)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };
    ScopeRow {
        source_org: cell(0),
        source_project: cell(1),
        target_org: cell(2),
        target_project: cell(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn row(cells: [Option<&str>; 4]) -> ScopeRow {
        ScopeRow {
            source_org: cells[0].map(String::from),
            source_project: cells[1].map(String::from),
            target_org: cells[2].map(String::from),
            target_project: cells[3].map(String::from),
        }
    }

    #[test]
    fn test_positional_rows() {
        let file = file_with("src,payments,tgt,payments\nsrc, billing ,tgt\n");
        let rows = read_rows(file.path()).unwrap();
        assert_eq!(
            rows,
            vec![
                row([Some("src"), Some("payments"), Some("tgt"), Some("payments")]),
                row([Some("src"), Some("billing"), Some("tgt"), None]),
            ]
        );
    }

    #[test]
    fn test_header_row_matches_by_name() {
        let file = file_with("Source Org,Source Project,Target Org,Target Project\nsrc,payments,tgt,\n");
        let rows = read_rows(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        let pair = rows[0].resolve().unwrap();
        assert_eq!(pair.target.to_string(), "tgt/payments");
    }

    #[test]
    fn test_camel_case_header() {
        let file = file_with("sourceOrg,sourceProject,targetOrg,targetProject\na,b,c,d\n");
        let rows = read_rows(file.path()).unwrap();
        assert_eq!(rows, vec![row([Some("a"), Some("b"), Some("c"), Some("d")])]);
    }

    #[test]
    fn test_empty_file() {
        let file = file_with("");
        assert!(read_rows(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let err = read_rows(Path::new("/nonexistent/scopes.csv")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scopes.csv"));
    }
}
