//! Metadata side-file of a validation report.

use chrono::{DateTime, Utc};
use ingestion_core::config::validation::ValidationConfig;
use ingestion_entity::job::Job;
use ingestion_entity::validation::ErrorCategory;

use crate::aggregator::ErrorSummary;

pub const SMALL_GEOMETRIES_THRESHOLD_LABEL: &str = "Small Geometries Threshold";
pub const SMALL_HOLES_THRESHOLD_LABEL: &str = "Small Holes Threshold";

/// Inputs of [`build_metadata_xml`].
pub struct MetadataContext<'a> {
    pub job: &'a Job,
    pub task_id: &'a str,
    pub summary: &'a ErrorSummary,
    pub thresholds: &'a ValidationConfig,
    pub created_at: DateTime<Utc>,
}

fn verdict(exceeded: bool) -> &'static str {
    if exceeded { "FAILED" } else { "PASSED" }
}

/// Render the report metadata as XML.
pub fn build_metadata_xml(ctx: &MetadataContext<'_>) -> String {
    let job = ctx.job;
    let counts = &ctx.summary.errors_count;
    let thresholds = &ctx.summary.thresholds;

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
    xml.push_str("<metadata>\n");
    xml.push_str(&format!(
        "  <identifier>{}</identifier>\n",
        xml_escape(ctx.task_id)
    ));
    xml.push_str(&format!(
        "  <parentidentifier>{}</parentidentifier>\n",
        xml_escape(&job.id)
    ));
    xml.push_str("  <type>Validation Report</type>\n");
    xml.push_str(&format!(
        "  <title>{}</title>\n",
        xml_escape(&format!(
            "{} {} v{} validation report",
            job.resource_id, job.product_type, job.version
        ))
    ));
    xml.push_str(&format!(
        "  <abstract>{}</abstract>\n",
        xml_escape(&format!(
            "Validation of {} found {} errors ({} job, created {}).",
            job.parameters.shapefile_path,
            counts.total(),
            job.job_type,
            ctx.created_at.to_rfc3339()
        ))
    ));

    for category in ErrorCategory::ALL {
        xml.push_str(&format!(
            "  <keywords vocabulary=\"{}\">\n",
            xml_escape(category.label())
        ));
        xml.push_str(&format!(
            "    <keyword>{}</keyword>\n",
            counts.get(category)
        ));
        xml.push_str("  </keywords>\n");
    }

    xml.push_str(&format!(
        "  <keywords vocabulary=\"{SMALL_GEOMETRIES_THRESHOLD_LABEL}\">\n"
    ));
    xml.push_str(&format!(
        "    <keyword>{}</keyword>\n",
        verdict(thresholds.small_geometries.exceeded)
    ));
    xml.push_str(&format!(
        "    <keyword>limit {}%</keyword>\n",
        ctx.thresholds.small_geometries_threshold_percentage
    ));
    xml.push_str("  </keywords>\n");

    xml.push_str(&format!(
        "  <keywords vocabulary=\"{SMALL_HOLES_THRESHOLD_LABEL}\">\n"
    ));
    xml.push_str(&format!(
        "    <keyword>{}</keyword>\n",
        verdict(thresholds.small_holes.exceeded)
    ));
    xml.push_str(&format!(
        "    <keyword>count {}</keyword>\n",
        thresholds.small_holes.count
    ));
    xml.push_str(&format!(
        "    <keyword>limit {}%</keyword>\n",
        ctx.thresholds.small_holes_threshold_percentage
    ));
    xml.push_str("  </keywords>\n");

    xml.push_str("</metadata>\n");
    xml
}

/// Escape XML special characters.
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
