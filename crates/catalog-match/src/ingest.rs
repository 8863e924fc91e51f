//! Find-or-create of canonical products from crawl records.

use std::io::BufRead;

use catalog_core::{CrawlRecord, Database, ProductDraft, ProductId};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{MatchError, Result};
use crate::identifiers::{generate_variations, strip_known_prefix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub product_id: ProductId,
    pub created: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub created: usize,
    pub matched: usize,
    pub rejected: usize,
}

impl IngestSummary {
    fn record(&mut self, outcome: &IngestOutcome) {
        if outcome.created {
            self.created += 1;
        } else {
            self.matched += 1;
        }
    }
}

pub struct Ingestor<'a> {
    db: &'a Database,
}

impl<'a> Ingestor<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Match `record` to an existing product through any spelling of its
    /// code, or create one, then upsert the record's listing.
    pub fn ingest(&self, record: &CrawlRecord) -> Result<IngestOutcome> {
        validate(record)?;

        let code = record.original_product_id.trim();
        let variations: Vec<String> = generate_variations(code).into_iter().collect();
        let draft = draft_for(record, code);

        let outcome = match self.db.find_product_by_codes(&variations)? {
            Some(existing) => {
                self.db.refresh_product(existing.id, &draft)?;
                IngestOutcome {
                    product_id: existing.id,
                    created: false,
                }
            }
            None => {
                let (product_id, created) = self.db.insert_product(&draft)?;
                if !created {
                    self.db.refresh_product(product_id, &draft)?;
                }
                IngestOutcome { product_id, created }
            }
        };

        self.db.upsert_listing(&record.to_listing(outcome.product_id))?;
        debug!(
            product_id = outcome.product_id,
            created = outcome.created,
            asp = %record.asp_name,
            code,
            "ingested crawl record"
        );
        Ok(outcome)
    }

    /// Ingest every record; invalid records are counted and skipped.
    pub fn ingest_batch<I>(&self, records: I) -> Result<IngestSummary>
    where
        I: IntoIterator<Item = CrawlRecord>,
    {
        let mut summary = IngestSummary::default();
        for record in records {
            match self.ingest(&record) {
                Ok(outcome) => summary.record(&outcome),
                Err(MatchError::InvalidRecord(reason)) => {
                    warn!(%reason, code = %record.original_product_id, "rejected crawl record");
                    summary.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    /// Ingest newline-delimited JSON crawl records. Blank lines are ignored;
    /// lines that do not parse are rejected.
    pub fn ingest_jsonl<R: BufRead>(&self, reader: R) -> Result<IngestSummary> {
        let mut summary = IngestSummary::default();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: CrawlRecord = match serde_json::from_str(&line) {
                Ok(record) => record,
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "unparsable crawl record");
                    summary.rejected += 1;
                    continue;
                }
            };
            let batch = self.ingest_batch([record])?;
            summary.created += batch.created;
            summary.matched += batch.matched;
            summary.rejected += batch.rejected;
        }
        Ok(summary)
    }
}

fn validate(record: &CrawlRecord) -> Result<()> {
    if record.title.trim().is_empty() {
        return Err(MatchError::InvalidRecord("title is empty".to_string()));
    }
    if record.asp_name.trim().is_empty() {
        return Err(MatchError::InvalidRecord("ASP name is empty".to_string()));
    }
    if record.original_product_id.trim().is_empty() {
        return Err(MatchError::InvalidRecord("product code is empty".to_string()));
    }
    Ok(())
}

fn draft_for(record: &CrawlRecord, code: &str) -> ProductDraft {
    let mut draft = ProductDraft::new(record.title.trim()).with_code(strip_known_prefix(code));
    if let Some(date) = record.release_date {
        draft = draft.with_release_date(date);
    }
    if let Some(url) = record.thumbnail_url.as_deref().filter(|u| !u.trim().is_empty()) {
        draft = draft.with_thumbnail(url);
    }
    draft
}
