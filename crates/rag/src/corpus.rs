//! Corpus loading from the tabular source.
//!
//! Parses the curated CSV of historical Vietnamese cooking instructions into
//! normalized [`Document`]s. The loader strictly prefers `data.csv` inside the
//! data directory and falls back to any other `*.csv` file when it is absent.

use crate::citation::citation_label;
use crate::types::{DocMetadata, Document, SourceRecord};
use hearth_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Preferred corpus file name.
const PREFERRED_FILE: &str = "data.csv";

const ACTION_HEADER: &str = "Động từ (Action)";
const RECIPE_HEADER: &str = "Công thức gốc (Original recipes)";
// Known header-name variant: some exports carry a trailing space here, so
// this column is matched on the trimmed header.
const FULL_TEXT_HEADER: &str = "Nguyên văn";
const DATE_HEADER: &str = "Ngày xuất bản";
const ISSUE_HEADER: &str = "Số báo";
const NEWSPAPER_HEADER: &str = "Báo";

/// Load all documents from the data directory.
///
/// Rows where both the action and the original recipe are empty are skipped.
/// Fails with `NoDataFound` if no CSV file exists or no valid rows survive.
pub fn load_documents(data_dir: &Path) -> AppResult<Vec<Document>> {
    let csv_path = locate_csv(data_dir)?;

    tracing::info!("Loading corpus from {:?}", csv_path);

    let records = parse_records(&csv_path)?;
    let documents: Vec<Document> = records
        .into_iter()
        .filter(|record| !record.is_empty())
        .map(|record| to_document(record, &csv_path))
        .collect();

    if documents.is_empty() {
        return Err(AppError::NoDataFound(format!(
            "No documents were loaded from {:?}",
            csv_path
        )));
    }

    tracing::info!("Loaded {} documents", documents.len());
    Ok(documents)
}

/// Locate the corpus CSV: `data.csv` if present, else the lexicographically
/// first `*.csv` in the directory.
fn locate_csv(data_dir: &Path) -> AppResult<PathBuf> {
    let preferred = data_dir.join(PREFERRED_FILE);
    if preferred.exists() {
        return Ok(preferred);
    }

    let mut csv_files: Vec<PathBuf> = std::fs::read_dir(data_dir)
        .map_err(|e| AppError::NoDataFound(format!("Cannot read data dir {:?}: {}", data_dir, e)))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    csv_files.sort();

    csv_files
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NoDataFound(format!("No CSV files found in {:?}", data_dir)))
}

/// Parse all rows of the CSV into source records.
fn parse_records(csv_path: &Path) -> AppResult<Vec<SourceRecord>> {
    let raw = std::fs::read_to_string(csv_path)
        .map_err(|e| AppError::NoDataFound(format!("Failed to read {:?}: {}", csv_path, e)))?;
    // Tolerate a UTF-8 byte-order mark
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::NoDataFound(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let action_idx = column(ACTION_HEADER);
    let recipe_idx = column(RECIPE_HEADER);
    let full_text_idx = column(FULL_TEXT_HEADER);
    let date_idx = column(DATE_HEADER);
    let issue_idx = column(ISSUE_HEADER);
    let newspaper_idx = column(NEWSPAPER_HEADER);

    let field = |row: &csv::StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    };

    let mut records = Vec::new();
    for (row_num, result) in reader.records().enumerate() {
        let row = result.map_err(|e| {
            AppError::NoDataFound(format!("Failed to read CSV row {}: {}", row_num + 1, e))
        })?;

        records.push(SourceRecord {
            action: field(&row, action_idx),
            original_recipe: field(&row, recipe_idx),
            full_text: field(&row, full_text_idx),
            date: field(&row, date_idx),
            issue: field(&row, issue_idx),
            newspaper: field(&row, newspaper_idx),
        });
    }

    Ok(records)
}

/// Build the fixed-format document content for a record.
///
/// All metadata is folded into the text so the generation model can cite it
/// directly from the retrieved context.
pub fn record_content(record: &SourceRecord) -> String {
    format!(
        "Hành động: {}\nCông thức gốc: {}\nNguyên văn: {}\nBáo: {}\nSố báo: {}\nNgày: {}",
        record.action,
        record.original_recipe,
        record.full_text,
        record.newspaper,
        record.issue,
        record.date
    )
}

fn to_document(record: SourceRecord, csv_path: &Path) -> Document {
    let content = record_content(&record);
    let citation_label = citation_label(&record);

    Document {
        content,
        metadata: DocMetadata {
            source_path: csv_path.to_string_lossy().to_string(),
            file_name: csv_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            action: record.action,
            original_recipe: record.original_recipe,
            full_text: record.full_text,
            date: record.date,
            issue: record.issue,
            newspaper: record.newspaper,
            citation_label,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADERS: &str =
        "Động từ (Action),Công thức gốc (Original recipes),Nguyên văn,Ngày xuất bản,Số báo,Báo";

    fn write_csv(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    #[test]
    fn test_load_documents_basic() {
        let temp = TempDir::new().unwrap();
        write_csv(
            temp.path(),
            "data.csv",
            &format!(
                "{}\nrửa,Cá kho,\"Rửa cá, kho với nước mắm.\",\"May 10, 2020\",12,Báo X\n",
                HEADERS
            ),
        );

        let documents = load_documents(temp.path()).unwrap();
        assert_eq!(documents.len(), 1);

        let doc = &documents[0];
        assert!(doc.content.starts_with("Hành động: rửa\n"));
        assert!(doc.content.contains("Công thức gốc: Cá kho"));
        assert!(doc.content.ends_with("Ngày: May 10, 2020"));
        assert_eq!(doc.metadata.newspaper, "Báo X");
        assert_eq!(doc.metadata.citation_label, "Cá kho (Báo X, May 10, 2020)");
        assert_eq!(doc.metadata.file_name, "data.csv");
    }

    #[test]
    fn test_load_documents_strips_bom() {
        let temp = TempDir::new().unwrap();
        write_csv(
            temp.path(),
            "data.csv",
            &format!("\u{feff}{}\nrửa,Cá kho,văn,\"May 10, 2020\",12,Báo X\n", HEADERS),
        );

        let documents = load_documents(temp.path()).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].metadata.action, "rửa");
    }

    #[test]
    fn test_load_documents_tolerates_trailing_space_header() {
        let temp = TempDir::new().unwrap();
        let headers = HEADERS.replace("Nguyên văn", "Nguyên văn ");
        write_csv(
            temp.path(),
            "data.csv",
            &format!("{}\nrửa,Cá kho,nguyên văn đây,\"May 10, 2020\",12,Báo X\n", headers),
        );

        let documents = load_documents(temp.path()).unwrap();
        assert_eq!(documents[0].metadata.full_text, "nguyên văn đây");
    }

    #[test]
    fn test_load_documents_skips_rows_with_both_primary_fields_empty() {
        let temp = TempDir::new().unwrap();
        write_csv(
            temp.path(),
            "data.csv",
            &format!(
                "{}\n,,ignored,\"May 10, 2020\",12,Báo X\nbăm,,văn,\"May 11, 2020\",13,Báo Y\n",
                HEADERS
            ),
        );

        let documents = load_documents(temp.path()).unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].metadata.action, "băm");
    }

    #[test]
    fn test_load_documents_missing_dir_is_no_data() {
        let result = load_documents(Path::new("/nonexistent/corpus"));
        assert!(matches!(result, Err(hearth_core::AppError::NoDataFound(_))));
    }

    #[test]
    fn test_load_documents_no_csv_is_no_data() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("notes.txt"), "not a corpus").unwrap();

        let result = load_documents(temp.path());
        assert!(matches!(result, Err(hearth_core::AppError::NoDataFound(_))));
    }

    #[test]
    fn test_load_documents_all_rows_empty_is_no_data() {
        let temp = TempDir::new().unwrap();
        write_csv(temp.path(), "data.csv", &format!("{}\n,,x,y,z,w\n", HEADERS));

        let result = load_documents(temp.path());
        assert!(matches!(result, Err(hearth_core::AppError::NoDataFound(_))));
    }

    #[test]
    fn test_locate_prefers_data_csv_then_falls_back() {
        let temp = TempDir::new().unwrap();
        write_csv(temp.path(), "other.csv", &format!("{}\nbăm,Gỏi,v,d,1,B\n", HEADERS));

        // Fallback: only other.csv exists
        let documents = load_documents(temp.path()).unwrap();
        assert_eq!(documents[0].metadata.file_name, "other.csv");

        // Preferred file wins once present
        write_csv(temp.path(), "data.csv", &format!("{}\nrửa,Cá kho,v,d,2,C\n", HEADERS));
        let documents = load_documents(temp.path()).unwrap();
        assert_eq!(documents[0].metadata.file_name, "data.csv");
    }
}
