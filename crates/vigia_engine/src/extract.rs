//! Counting pending documents in the queue table.

use scraper::{Html, Selector};

use crate::types::QueueSnapshot;

/// Extracts a [`QueueSnapshot`] from a rendered queue page.
///
/// Implementations must fail closed: any page that does not contain the
/// expected structure counts as an empty queue.
pub trait QueueExtractor: Send + Sync {
    fn extract(&self, html: &str) -> QueueSnapshot;
}

/// Counts the rows of the queue table.
///
/// A row is a pending document when its first cell has visible text, which
/// skips placeholder rows such as "nenhum documento na fila".
#[derive(Debug, Clone)]
pub struct TableRowExtractor {
    table_selector: String,
}

impl TableRowExtractor {
    /// CSS selector of the queue table body on the authenticator page.
    pub const DEFAULT_TABLE_SELECTOR: &'static str = "tbody#listaUsuarios";

    pub fn new(table_selector: impl Into<String>) -> Self {
        Self {
            table_selector: table_selector.into(),
        }
    }
}

impl Default for TableRowExtractor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TABLE_SELECTOR)
    }
}

impl QueueExtractor for TableRowExtractor {
    fn extract(&self, html: &str) -> QueueSnapshot {
        let document = Html::parse_document(html);
        let table = Selector::parse(&self.table_selector).ok();
        let row = Selector::parse("tr").ok();
        let cell = Selector::parse("td").ok();
        let (Some(table), Some(row), Some(cell)) = (table, row, cell) else {
            return QueueSnapshot::empty();
        };

        let Some(body) = document.select(&table).next() else {
            return QueueSnapshot::empty();
        };

        let count = body
            .select(&row)
            .filter(|tr| {
                tr.select(&cell)
                    .next()
                    .map(|td| !td.text().collect::<String>().trim().is_empty())
                    .unwrap_or(false)
            })
            .count();

        QueueSnapshot::from_count(count as u32)
    }
}

/// Checks whether a page currently renders the queue view.
///
/// The authenticator is a single page whose views are switched by URL
/// fragment, so the fragment never survives an HTTP round trip. The queue
/// view is detected structurally instead: either the navigation anchor for
/// the fragment or the queue table itself must be present.
pub fn has_queue_view_marker(html: &str, fragment: &str, table_selector: &str) -> bool {
    let document = Html::parse_document(html);

    if let Ok(anchor) = Selector::parse(&format!("a[href=\"#{fragment}\"]")) {
        if document.select(&anchor).next().is_some() {
            return true;
        }
    }

    Selector::parse(table_selector)
        .map(|table| document.select(&table).next().is_some())
        .unwrap_or(false)
}
