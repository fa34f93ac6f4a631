//! Plain-text summary table.

use crate::aggregator::{AggregationResult, DistributionStats, Snapshot};
use crate::utils::config::GLOBAL_GROUP;

const NAME_WIDTH: usize = 24;

/// Render one row per entry, global totals first
pub fn render_summary(result: &AggregationResult) -> String {
    let mut lines = Vec::new();

    let header = format!(
        "{:<width$} {:>8} {:>7} {:>7} {:>9} {:>8} {:>9} {:>9} {:>8} {:>10}",
        "Group",
        "Count",
        "Errors",
        "Err %",
        "Mean ms",
        "Min ms",
        "Median ms",
        "P90 ms",
        "Max ms",
        "Mean B",
        width = NAME_WIDTH
    );
    let rule = "-".repeat(header.len());

    lines.push(header);
    lines.push(rule.clone());

    for (name, snapshot) in result.iter() {
        let display_name = if name == GLOBAL_GROUP { "(all)" } else { name };
        lines.push(render_row(display_name, snapshot));
    }

    lines.push(rule);

    let global = result.global();
    if let Some(throughput) = global.throughput() {
        lines.push(format!("Throughput: {:.2} samples/s", throughput));
    }
    if let Some(duration) = &global.duration {
        if !duration.is_exact(global.count) {
            lines.push(format!(
                "Percentiles estimated from {} of {} samples",
                duration.retained, global.count
            ));
        }
    }

    lines.join("\n")
}

fn render_row(name: &str, snapshot: &Snapshot) -> String {
    let duration = snapshot.duration.as_ref();

    format!(
        "{:<width$} {:>8} {:>7} {:>7} {:>9} {:>8} {:>9} {:>9} {:>8} {:>10}",
        truncate(name, NAME_WIDTH),
        snapshot.count,
        snapshot.error_count,
        fmt_float(snapshot.error_rate(), 1),
        fmt_float(duration.map(|d| d.mean), 1),
        fmt_int(duration.map(|d| d.min)),
        fmt_float(duration.and_then(DistributionStats::median), 1),
        fmt_float(duration.and_then(|d| d.percentile(90.0)), 1),
        fmt_int(duration.map(|d| d.max)),
        fmt_float(snapshot.size.as_ref().map(|s| s.mean), 0),
        width = NAME_WIDTH
    )
}

fn truncate(name: &str, width: usize) -> String {
    if name.chars().count() <= width {
        return name.to_string();
    }
    let tail: String = name
        .chars()
        .rev()
        .take(width - 3)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{}", tail)
}

fn fmt_float(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.*}", precision, v))
}

fn fmt_int(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::run;
    use crate::parser::Sample;
    use crate::utils::config::AnalyzerConfig;
    use chrono::{TimeZone, Utc};
    use std::convert::Infallible;

    #[test]
    fn test_empty_result_renders_dashes() {
        let result = run(Vec::<Result<Sample, Infallible>>::new(), AnalyzerConfig::default()).unwrap();
        let text = render_summary(&result);

        let row = text.lines().nth(2).unwrap();
        assert!(row.starts_with("(all)"));
        assert!(row.contains(" - "));
        assert!(!text.contains("Throughput"));
    }

    #[test]
    fn test_rows_follow_result_order() {
        let ts = Utc.timestamp_millis_opt(0).unwrap();
        let samples = vec![
            Sample::new(ts, "/b", 10, 1, true),
            Sample::new(ts, "/a", 20, 1, true),
        ];
        let config = AnalyzerConfig::new().with_group("a", "/a").with_group("b", "/b");
        let result = run(samples.into_iter().map(Ok::<_, Infallible>), config).unwrap();

        let text = render_summary(&result);
        let names: Vec<&str> = text
            .lines()
            .skip(2)
            .take(3)
            .map(|l| l.split_whitespace().next().unwrap())
            .collect();

        assert_eq!(names, vec!["(all)", "b", "a"]);
    }

    #[test]
    fn test_truncate_keeps_tail() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("/a/very/long/label", 10), "...g/label");
    }
}
