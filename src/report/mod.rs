//! Relation table output: CSV, JSON and the console summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::relation::RelationRecord;

/// CSV row with the fixed column headers of the relation table.
#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Entity_Type")]
    entity_type: &'a str,
    #[serde(rename = "Entity_Value")]
    entity_value: &'a str,
    #[serde(rename = "Relation")]
    relation: &'a str,
    #[serde(rename = "Related_Entity_Type")]
    related_entity_type: &'a str,
    #[serde(rename = "Related_Entity")]
    related_entity: &'a str,
}

impl<'a> From<&'a RelationRecord> for CsvRow<'a> {
    fn from(record: &'a RelationRecord) -> Self {
        Self {
            entity_type: &record.entity_type,
            entity_value: record.value.as_str(),
            relation: &record.relation,
            related_entity_type: record.related_entity_type.as_str(),
            related_entity: &record.related_entity,
        }
    }
}

const CSV_HEADERS: [&str; 5] = [
    "Entity_Type",
    "Entity_Value",
    "Relation",
    "Related_Entity_Type",
    "Related_Entity",
];

/// Write records as CSV (header first, even when there are no records).
pub fn write_csv_to<W: Write>(records: &[RelationRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(CSV_HEADERS)?;
    for record in records {
        csv_writer.serialize(CsvRow::from(record))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write records to a CSV file at `path`.
pub fn write_csv(records: &[RelationRecord], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to(records, file)?;
    log::info!("Results saved to {}", path.display());
    Ok(())
}

/// Records extracted from one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub records: Vec<RelationRecord>,
}

/// JSON report of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub documents: Vec<DocumentReport>,
}

impl ExtractionReport {
    pub fn new(documents: Vec<DocumentReport>) -> Self {
        let all: Vec<RelationRecord> = documents
            .iter()
            .flat_map(|d| d.records.iter().cloned())
            .collect();
        Self {
            generated_at: Utc::now(),
            summary: Summary::from_records(&all),
            documents,
        }
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        log::info!("Results saved to {}", path.display());
        Ok(())
    }
}

/// Matched/unmatched counts over a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
}

impl Summary {
    pub fn from_records(records: &[RelationRecord]) -> Self {
        let matched = records.iter().filter(|r| r.is_resolved()).count();
        Self {
            total: records.len(),
            matched,
            unmatched: records.len() - matched,
        }
    }
}

/// Console summary: counts followed by the first `sample` records.
pub fn render_summary(records: &[RelationRecord], sample: usize) -> String {
    let summary = Summary::from_records(records);
    let mut out = String::new();

    out.push_str(&format!("{:=<70}\n", ""));
    out.push_str(" EXTRACTION SUMMARY\n");
    out.push_str(&format!("{:=<70}\n", ""));
    out.push_str(&format!("Total PAN numbers found: {}\n", summary.total));
    out.push_str(&format!("Successfully matched: {}\n", summary.matched));
    out.push_str(&format!("Unmatched: {}\n", summary.unmatched));

    if !records.is_empty() && sample > 0 {
        out.push_str("\nSample results:\n");
        out.push_str(&format!("{:-<70}\n", ""));
        for (i, record) in records.iter().take(sample).enumerate() {
            let status = if record.is_resolved() { "✓" } else { "✗" };
            out.push_str(&format!("{} {}. PAN: {}\n", status, i + 1, record.value));
            out.push_str(&format!(
                "   → Belongs to: {} ({})\n",
                record.related_entity, record.related_entity_type
            ));
        }
        if records.len() > sample {
            out.push_str(&format!("... and {} more entities\n", records.len() - sample));
        }
    }

    out.push_str(&format!("{:=<70}\n", ""));
    out
}
