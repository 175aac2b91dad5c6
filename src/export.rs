//! Paginated text for a completed checklist. The webview turns the pages
//! into the downloadable document.

use serde::Serialize;

use crate::models::{CompletedChecklist, YesNo};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ExportPage {
    pub number: usize,
    pub total: usize,
    pub lines: Vec<String>,
}

impl ExportPage {
    pub fn footer(&self) -> String {
        format!("Page {} of {}", self.number, self.total)
    }
}

fn body_lines(record: &CompletedChecklist) -> Vec<String> {
    let mut lines = vec![
        record.title.clone(),
        format!("Site: {}", record.site),
        format!(
            "Completed by {} on {}",
            record.completed_by,
            record.completed_at.format("%d/%m/%Y %H:%M")
        ),
        String::new(),
    ];

    for (n, answer) in record.answers.iter().enumerate() {
        let verdict = match answer.answer {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        };
        lines.push(format!("{}. {} - {verdict}", n + 1, answer.question));
        if let Some(action) = &answer.corrective_action {
            lines.push(format!("   Corrective action: {action}"));
        }
    }

    lines
}

pub fn paginate_completed_checklist(record: &CompletedChecklist, lines_per_page: usize) -> Vec<ExportPage> {
    let lines = body_lines(record);
    let chunks: Vec<&[String]> = lines.chunks(lines_per_page.max(1)).collect();
    let total = chunks.len();

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| ExportPage {
            number: i + 1,
            total,
            lines: chunk.to_vec(),
        })
        .collect()
}

/// Plain-text rendition, pages separated by form feeds.
pub fn render_text(pages: &[ExportPage]) -> String {
    pages
        .iter()
        .map(|page| format!("{}\n\n{}\n", page.lines.join("\n"), page.footer()))
        .collect::<Vec<_>>()
        .join("\u{c}")
}
