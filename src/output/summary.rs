//! Human-readable run summaries

use crate::output::traits::HarvestSummary;

/// Renders the summary block printed at the end of a namespace run
pub fn format_summary(summary: &HarvestSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Harvest Summary: {} ===\n\n", summary.namespace));

    out.push_str("Discovery:\n");
    out.push_str(&format!("  Listing pages: {}\n", summary.listing_pages));
    out.push_str(&format!("  Detail links:  {}\n\n", summary.detail_links));

    out.push_str("Results:\n");
    out.push_str(&format!("  Records: {}\n", summary.records));
    out.push_str(&format!("  Errors:  {}\n", summary.errors));

    if summary.detail_links > 0 {
        let rate = summary.records as f64 / summary.detail_links as f64 * 100.0;
        out.push_str(&format!("  Success rate: {:.1}%\n", rate));
    }
    out.push('\n');

    let status = if summary.interrupted {
        format!(
            "interrupted ({} of {} links processed)",
            summary.processed(),
            summary.detail_links
        )
    } else {
        "completed".to_string()
    };
    out.push_str(&format!("Status: {}\n", status));
    out.push_str(&format!("Elapsed: {:.1}s\n", summary.elapsed.as_secs_f64()));

    out
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &HarvestSummary) {
    print!("{}", format_summary(summary));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_completed_summary() {
        let summary = HarvestSummary {
            namespace: "Land-Rover".to_string(),
            listing_pages: 2,
            detail_links: 5,
            records: 4,
            errors: 1,
            interrupted: false,
            elapsed: Duration::from_millis(12_300),
        };

        let text = format_summary(&summary);
        assert!(text.contains("=== Harvest Summary: Land-Rover ==="));
        assert!(text.contains("Detail links:  5"));
        assert!(text.contains("Success rate: 80.0%"));
        assert!(text.contains("Status: completed"));
        assert!(text.contains("Elapsed: 12.3s"));
    }

    #[test]
    fn test_interrupted_summary() {
        let mut summary = HarvestSummary::new("Jaguar");
        summary.detail_links = 10;
        summary.records = 3;
        summary.interrupted = true;

        let text = format_summary(&summary);
        assert!(text.contains("interrupted (3 of 10 links processed)"));
    }

    #[test]
    fn test_empty_namespace_has_no_rate() {
        let text = format_summary(&HarvestSummary::new("Empty"));
        assert!(!text.contains("Success rate"));
    }
}
