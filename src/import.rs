use std::io;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::{ApiClient, Transport};
use crate::pages::students::StudentForm;
use crate::store::StudentStore;

#[derive(Debug, Deserialize)]
struct CsvRow {
    name: String,
    roll_number: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    year: Option<u8>,
}

impl From<CsvRow> for StudentForm {
    fn from(row: CsvRow) -> Self {
        StudentForm {
            name: row.name,
            roll_number: row.roll_number,
            email: row.email.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
            department: row.department.unwrap_or_default(),
            year: row.year,
        }
        .sanitized()
    }
}

/// A parsed row and the file line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub line: u64,
    pub form: StudentForm,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: u64,
    pub roll_number: String,
    pub reason: String,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub total: usize,
    pub imported: usize,
    pub rejected: Vec<RejectedRow>,
}

pub fn read_rows<R: io::Read>(source: R) -> anyhow::Result<Vec<ImportRow>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(source);
    let headers = reader.headers()?.clone();
    let mut record = csv::StringRecord::new();
    let mut rows = Vec::new();

    while reader.read_record(&mut record)? {
        let line = record.position().map_or(0, |position| position.line());
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("malformed student row on line {line}"))?;
        rows.push(ImportRow {
            line,
            form: row.into(),
        });
    }

    Ok(rows)
}

pub fn read_file(path: &Path) -> anyhow::Result<Vec<ImportRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_rows(file).with_context(|| format!("failed to read {}", path.display()))
}

/// Creates each valid row in order. Invalid rows and server rejections are
/// collected, not fatal. The store is refreshed once if anything landed.
pub async fn import_students<T: Transport>(
    api: &ApiClient<T>,
    store: &mut StudentStore,
    rows: Vec<ImportRow>,
) -> ImportSummary {
    let mut summary = ImportSummary {
        total: rows.len(),
        ..ImportSummary::default()
    };

    for ImportRow { line, form } in rows {
        let rejected = |reason: String| RejectedRow {
            line,
            roll_number: form.roll_number.clone(),
            reason,
        };

        if let Err(errors) = form.validate() {
            let reason = errors
                .iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>()
                .join("; ");
            summary.rejected.push(rejected(reason));
            continue;
        }

        match api
            .students()
            .create(&form.create_request())
            .await
            .into_ack("Failed to add student")
        {
            Ok(()) => summary.imported += 1,
            Err(error) => {
                warn!(line, roll_number = %form.roll_number, %error, "import row rejected");
                summary.rejected.push(rejected(error));
            }
        }
    }

    info!(
        total = summary.total,
        imported = summary.imported,
        rejected = summary.rejected.len(),
        "student import finished"
    );
    if summary.imported > 0 {
        store.refresh_students(api).await;
    }
    summary
}
