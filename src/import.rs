use std::path::Path;

use anyhow::{bail, Context};
use tracing::warn;

use crate::api::Backend;
use crate::models::ActivityType;
use crate::session::Session;
use crate::view;

#[derive(Debug, Clone)]
pub struct ImportRow {
    pub line: usize,
    pub activity_type: String,
    pub amount: String,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Default)]
pub struct ImportFile {
    pub rows: Vec<ImportRow>,
    pub unreadable: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub accepted: usize,
    pub rejected: usize,
}

/// Rows may stop after the amount. Rows that can't be read at all are
/// counted, not fatal.
pub fn read_rows(csv_path: &Path) -> anyhow::Result<ImportFile> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|header| header.trim() == name);
    let (Some(type_column), Some(amount_column)) = (column("activity_type"), column("amount")) else {
        bail!("{} has no activity_type and amount columns", csv_path.display());
    };
    let wallet_column = column("wallet_address");

    let mut file = ImportFile::default();
    for (index, result) in reader.records().enumerate() {
        let line = index + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                warn!(line, error = %err, "skipping unreadable row");
                file.unreadable += 1;
                continue;
            }
        };
        let field = |column: usize| record.get(column).unwrap_or_default().to_string();
        file.rows.push(ImportRow {
            line,
            activity_type: field(type_column),
            amount: field(amount_column),
            wallet_address: wallet_column.and_then(|column| record.get(column)).map(str::to_string),
        });
    }
    Ok(file)
}

/// Submits each row through the same validation as the form. Rows without a
/// wallet address use the session's wallet.
pub async fn import_rows<B: Backend>(session: &mut Session<B>, file: &ImportFile) -> ImportSummary {
    let mut summary = ImportSummary {
        accepted: 0,
        rejected: file.unreadable,
    };

    for row in &file.rows {
        let line = row.line;
        let wallet = row
            .wallet_address
            .as_deref()
            .filter(|wallet| !wallet.trim().is_empty())
            .unwrap_or(&session.state().wallet_address)
            .to_string();

        let activity_type = row.activity_type.parse::<ActivityType>().ok();
        if activity_type.is_none() {
            warn!(line, activity_type = %row.activity_type, "skipping row with unknown activity type");
            summary.rejected += 1;
            continue;
        }

        let activity = match view::validate(&wallet, activity_type, &row.amount) {
            Ok(activity) => activity,
            Err(err) => {
                warn!(line, error = %err, "skipping invalid row");
                summary.rejected += 1;
                continue;
            }
        };

        if session.post_activity(&activity).await {
            summary.accepted += 1;
        } else {
            summary.rejected += 1;
        }
    }

    summary
}
