use dashsync_core::{Folder, SearchHit};

use crate::sync::{FolderOutcome, ItemOutcome, Summary};

/// Left-aligned columns sized to their widest cell.
pub fn table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    for row in std::iter::once(&header).chain(rows) {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

pub fn folders_table(folders: &[Folder]) -> String {
    let rows: Vec<Vec<String>> = folders
        .iter()
        .map(|folder| vec![folder.id.to_string(), folder.uid.clone(), folder.title.clone()])
        .collect();
    table(&["ID", "UID", "TITLE"], &rows)
}

pub fn search_table(hits: &[SearchHit]) -> String {
    let rows: Vec<Vec<String>> = hits
        .iter()
        .map(|hit| {
            vec![
                hit.id.to_string(),
                hit.title.clone(),
                hit.tags.join(", "),
                hit.is_starred.to_string(),
            ]
        })
        .collect();
    table(&["ID", "TITLE", "TAGS", "STARRED"], &rows)
}

/// Progress line for a successful or skipped item; failures go through [`failure_line`].
pub fn outcome_line(item: &ItemOutcome) -> Option<String> {
    let line = match item {
        ItemOutcome::Folder {
            dir,
            title,
            outcome,
        } => {
            let verb = match outcome {
                FolderOutcome::Materialized => "created directory",
                FolderOutcome::Reused => "reusing directory",
                FolderOutcome::Created => "created folder for",
                FolderOutcome::Updated => "updated folder for",
            };
            format!("{verb} '{}' ({title})", dir.display())
        }
        ItemOutcome::Downloaded { path } => format!("Downloaded {}", path.display()),
        ItemOutcome::Uploaded { title, slug, url, .. } => {
            format!("Successfully uploaded dashboard '{title}' ({slug})\nurl: {url}")
        }
        ItemOutcome::Unchanged { file, title } => format!(
            "No changes were made to dashboard '{title}' ({}). Not updating",
            file.display()
        ),
        ItemOutcome::Skipped { path, reason } => {
            format!("Skipping '{}' ({reason})", path.display())
        }
        ItemOutcome::Failed { .. } => return None,
    };
    Some(line)
}

pub fn failure_line(item: &ItemOutcome) -> Option<String> {
    match item {
        ItemOutcome::Failed { item, error } => Some(format!("{item}: {error}")),
        _ => None,
    }
}

pub fn summary_line(summary: &Summary) -> String {
    format!(
        "{} folder(s), {} dashboard(s) written, {} unchanged, {} skipped, {} failed",
        summary.folders, summary.written, summary.unchanged, summary.skipped, summary.failed
    )
}
