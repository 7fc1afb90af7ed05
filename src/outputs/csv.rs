//! Append-only CSV sink for article records.
//!
//! Rows are `url,title,raw_date,parsed_date,text`. The header is written
//! only when the file is new or empty, so repeated runs keep appending to
//! one table.

use crate::models::ArticleRecord;
use std::fs::{File, OpenOptions};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub const HEADER: [&str; 5] = ["url", "title", "raw_date", "parsed_date", "text"];

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot open output file {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed writing row: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed flushing output: {0}")]
    Io(#[from] std::io::Error),
}

/// Exclusive writer over the output table.
#[derive(Debug)]
pub struct CsvSink {
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvSink {
    /// Open `path` for appending, creating it if needed.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let open_err = |source| SinkError::Open {
            path: path.display().to_string(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(open_err)?;
        let is_empty = file.metadata().map_err(open_err)?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            writer.write_record(HEADER)?;
            writer.flush()?;
        }
        info!(new_file = is_empty, "Output file ready");
        Ok(Self { writer, rows: 0 })
    }

    /// Write one record and flush it to disk.
    pub fn append(&mut self, record: &ArticleRecord) -> Result<(), SinkError> {
        self.writer.write_record(record.to_row())?;
        self.writer.flush()?;
        self.rows += 1;
        debug!(url = %record.url, rows = self.rows, "Wrote article row");
        Ok(())
    }

    /// Rows written through this sink.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NO_DATE_TEXT, NO_DATE_VALUE};
    use chrono::NaiveDate;

    fn record(url: &str) -> ArticleRecord {
        ArticleRecord {
            url: url.to_string(),
            title: "A \"quoted\", title".to_string(),
            raw_date_text: None,
            parsed_date: None,
            body_text: "line one\nline two".to_string(),
        }
    }

    fn read_rows(path: &Path) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_header_then_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&record("https://example.com/1")).unwrap();
        assert_eq!(sink.rows(), 1);

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], HEADER.map(String::from).to_vec());
        assert_eq!(rows[1][0], "https://example.com/1");
        assert_eq!(rows[1][1], "A \"quoted\", title");
        assert_eq!(rows[1][2], NO_DATE_TEXT);
        assert_eq!(rows[1][3], NO_DATE_VALUE);
        assert_eq!(rows[1][4], "line one\nline two");
    }

    #[test]
    fn test_reopen_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("news.csv");

        CsvSink::open(&path)
            .unwrap()
            .append(&record("https://example.com/1"))
            .unwrap();
        let mut dated = record("https://example.com/2");
        dated.raw_date_text = Some("Published June 7, 2022".to_string());
        dated.parsed_date = NaiveDate::from_ymd_opt(2022, 6, 7).and_then(|d| d.and_hms_opt(0, 0, 0));
        CsvSink::open(&path).unwrap().append(&dated).unwrap();

        let rows = read_rows(&path);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][3], "2022-06-07 00:00:00");
    }

    #[test]
    fn test_unwritable_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("news.csv");
        assert!(matches!(CsvSink::open(&path), Err(SinkError::Open { .. })));
    }
}
