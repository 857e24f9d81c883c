//! JSON export of adverse impact reports

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use super::impact_report::{AdverseImpactReport, ReportRow};

/// Metadata about the analysis run
#[derive(Debug, Serialize)]
pub struct ReportMetadata {
    /// Timestamp of the export (ISO 8601 format)
    pub timestamp: String,
    /// iopsy version
    pub iopsy_version: String,
    /// Grouping column name
    pub group_column: String,
    /// Outcome column name
    pub outcome_column: String,
    /// Pass rule, as displayed
    pub pass_rule: String,
    /// Referent group used for comparisons
    pub referent: String,
    /// Whether the referent was given rather than elected
    pub referent_forced: bool,
    /// Minimum sample size for referent election
    pub min_referent_n: usize,
    /// Filters applied before the analysis, as displayed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
}

/// Summary counts of the analysis
#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub groups: usize,
    pub records_input: usize,
    pub records_analyzed: usize,
    pub four_fifths_violations: usize,
    pub significant_differences: usize,
}

/// Complete report export with metadata
#[derive(Debug, Serialize)]
pub struct ReportExport {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    pub groups: Vec<ReportRow>,
}

impl ReportExport {
    pub fn from_report(report: &AdverseImpactReport) -> Self {
        let config = &report.config;
        let rows = report.rows();

        let metadata = ReportMetadata {
            timestamp: Utc::now().to_rfc3339(),
            iopsy_version: env!("CARGO_PKG_VERSION").to_string(),
            group_column: config.group_column.clone(),
            outcome_column: config.outcome_column.clone(),
            pass_rule: config.rule.to_string(),
            referent: report.referent().to_string(),
            referent_forced: config.referent.is_some(),
            min_referent_n: config.min_referent_n,
            filters: config.filters.iter().map(|f| f.to_string()).collect(),
        };

        let summary = ReportSummary {
            groups: rows.len(),
            records_input: report.records_input,
            records_analyzed: report.records_analyzed,
            four_fifths_violations: rows.iter().filter(|r| r.four_fifths_violation).count(),
            significant_differences: rows.iter().filter(|r| r.significant).count(),
        };

        Self {
            metadata,
            summary,
            groups: rows,
        }
    }
}

impl AdverseImpactReport {
    /// Serialize the report, with run metadata, to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        let export = ReportExport::from_report(self);
        serde_json::to_string_pretty(&export).with_context(|| {
            format!(
                "Failed to serialize adverse impact report for '{}'",
                self.config.group_column
            )
        })
    }
}
