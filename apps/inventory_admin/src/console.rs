//! Terminal implementations of the confirmation, notification and table surfaces.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use client_core::{
    Confirmer, FormSchema, Notification, NotificationLevel, TableWidget, TableWidgetFactory,
};
use shared::domain::{Record, RECORD_ID_FIELD};
use tokio::sync::broadcast;
use tracing::warn;

/// `[y/N]` prompt on stderr, answer read from stdin.
pub struct StdinConfirmer;

#[async_trait]
impl Confirmer for StdinConfirmer {
    async fn confirm(&self, message: &str) -> bool {
        let prompt = format!("{message} [y/N]: ");
        let answer = tokio::task::spawn_blocking(move || -> io::Result<String> {
            let mut stderr = io::stderr();
            stderr.write_all(prompt.as_bytes())?;
            stderr.flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await;

        match answer {
            Ok(Ok(line)) => is_affirmative(&line),
            Ok(Err(err)) => {
                warn!(%err, "could not read confirmation");
                false
            }
            Err(err) => {
                warn!(%err, "confirmation prompt task failed");
                false
            }
        }
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes" | "ya"
    )
}

/// Prints everything queued so far; returns how many were errors.
pub fn drain_notifications(rx: &mut broadcast::Receiver<Notification>) -> usize {
    let mut errors = 0;
    while let Ok(notification) = rx.try_recv() {
        match notification.level {
            NotificationLevel::Success => eprintln!("✔ {}", notification.message),
            NotificationLevel::Error => {
                errors += 1;
                eprintln!("✘ {}", notification.message);
            }
        }
    }
    errors
}

/// Renders each row set as an aligned text table on stdout.
pub struct TextTableWidgets {
    columns: Vec<String>,
}

impl TextTableWidgets {
    pub fn for_schema(schema: &FormSchema) -> Self {
        let mut columns = vec![RECORD_ID_FIELD.to_string()];
        columns.extend(schema.fields.iter().map(|f| f.name.clone()));
        Self { columns }
    }
}

struct PrintedTable;

impl TableWidget for PrintedTable {
    fn destroy(self: Box<Self>) -> anyhow::Result<()> {
        Ok(())
    }
}

impl TableWidgetFactory for TextTableWidgets {
    fn initialize(&self, rows: &[Record]) -> anyhow::Result<Box<dyn TableWidget>> {
        let columns = if self.columns.len() > 1 {
            self.columns.clone()
        } else {
            discovered_columns(rows)
        };
        let mut stdout = io::stdout().lock();
        stdout.write_all(render_table(&columns, rows).as_bytes())?;
        stdout.flush()?;
        Ok(Box::new(PrintedTable))
    }
}

/// Columns for collections without a schema: `id` first, then keys in first-seen order.
fn discovered_columns(rows: &[Record]) -> Vec<String> {
    let mut columns = vec![RECORD_ID_FIELD.to_string()];
    for row in rows {
        for name in row.field_names() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

pub fn render_table(columns: &[String], rows: &[Record]) -> String {
    if rows.is_empty() {
        return "(no records)\n".to_string();
    }
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| row.display_field(c)).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            cells
                .iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(c.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[String]| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| format!("{v:<w$}"))
            .collect();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut out = line(columns);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("{}\n", rule.join("-+-")));
    for row in &cells {
        out.push_str(&line(row.as_slice()));
    }
    out
}

#[cfg(test)]
#[path = "tests/console_tests.rs"]
mod tests;
