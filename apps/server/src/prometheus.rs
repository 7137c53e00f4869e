//! Prometheus text exposition of service health.

use std::collections::HashMap;

use healthcheck::{MetricsSnapshot, ServiceStatus, StatusSnapshot};

/// Content type of the text exposition format
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

struct Family {
    name: &'static str,
    help: &'static str,
    kind: &'static str,
}

const STATUS: Family = Family {
    name: "health_check_status",
    help: "Whether the service passed its last check (1) or not (0)",
    kind: "gauge",
};

const RESPONSE_TIME: Family = Family {
    name: "health_check_response_time_ms",
    help: "Response time of the last successful check in milliseconds",
    kind: "gauge",
};

const TOTAL_CHECKS: Family = Family {
    name: "health_check_total_checks",
    help: "Total number of checks performed",
    kind: "counter",
};

const FAILURES: Family = Family {
    name: "health_check_failures_total",
    help: "Total number of failed checks",
    kind: "counter",
};

/// Render every registered service
///
/// Services are sorted by name. Totals come from the metrics store and are
/// zero for a service that has not recorded a check yet.
pub fn render(statuses: &HashMap<String, StatusSnapshot>, metrics: &MetricsSnapshot) -> String {
    let mut names: Vec<&String> = statuses.keys().collect();
    names.sort();

    let mut out = String::new();

    write_family(&mut out, &STATUS, names.iter().map(|name| {
        let healthy = statuses[*name].status == ServiceStatus::Healthy;
        (name.as_str(), u64::from(healthy))
    }));

    write_family(&mut out, &RESPONSE_TIME, names.iter().map(|name| {
        (name.as_str(), statuses[*name].last_response_time_ms.unwrap_or(0))
    }));

    write_family(&mut out, &TOTAL_CHECKS, names.iter().map(|name| {
        (name.as_str(), metrics.totals.get(*name).map_or(0, |totals| totals.total))
    }));

    write_family(&mut out, &FAILURES, names.iter().map(|name| {
        (name.as_str(), metrics.totals.get(*name).map_or(0, |totals| totals.failures))
    }));

    out
}

fn write_family<'a>(out: &mut String, family: &Family, samples: impl Iterator<Item = (&'a str, u64)>) {
    out.push_str(&format!("# HELP {} {}\n", family.name, family.help));
    out.push_str(&format!("# TYPE {} {}\n", family.name, family.kind));
    for (service, value) in samples {
        out.push_str(&format!("{}{{service=\"{}\"}} {}\n", family.name, escape_label(service), value));
    }
}

/// Escape a label value per the exposition format
fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthcheck::Totals;

    fn snapshot(name: &str, status: ServiceStatus, response_time_ms: Option<u64>) -> StatusSnapshot {
        StatusSnapshot {
            name: name.to_string(),
            target: format!("http://{name}.local/health"),
            status,
            last_check_time: None,
            last_response_time_ms: response_time_ms,
            consecutive_failures: 0,
        }
    }

    #[test]
    fn test_render_families() {
        let statuses = HashMap::from([
            ("web".to_string(), snapshot("web", ServiceStatus::Critical, None)),
            ("api".to_string(), snapshot("api", ServiceStatus::Healthy, Some(42))),
        ]);
        let mut metrics = MetricsSnapshot::default();
        metrics.totals.insert("api".to_string(), Totals { total: 10, failures: 2 });
        metrics.totals.insert("web".to_string(), Totals { total: 4, failures: 4 });

        let text = render(&statuses, &metrics);

        let expected = "\
# HELP health_check_status Whether the service passed its last check (1) or not (0)
# TYPE health_check_status gauge
health_check_status{service=\"api\"} 1
health_check_status{service=\"web\"} 0
# HELP health_check_response_time_ms Response time of the last successful check in milliseconds
# TYPE health_check_response_time_ms gauge
health_check_response_time_ms{service=\"api\"} 42
health_check_response_time_ms{service=\"web\"} 0
# HELP health_check_total_checks Total number of checks performed
# TYPE health_check_total_checks counter
health_check_total_checks{service=\"api\"} 10
health_check_total_checks{service=\"web\"} 4
# HELP health_check_failures_total Total number of failed checks
# TYPE health_check_failures_total counter
health_check_failures_total{service=\"api\"} 2
health_check_failures_total{service=\"web\"} 4
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_missing_totals_render_zero() {
        let statuses =
            HashMap::from([("new".to_string(), snapshot("new", ServiceStatus::Unknown, None))]);

        let text = render(&statuses, &MetricsSnapshot::default());
        assert!(text.contains("health_check_status{service=\"new\"} 0\n"));
        assert!(text.contains("health_check_total_checks{service=\"new\"} 0\n"));
        assert!(text.contains("health_check_failures_total{service=\"new\"} 0\n"));
    }

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("plain"), "plain");
        assert_eq!(escape_label("a\"b"), "a\\\"b");
        assert_eq!(escape_label("a\\b"), "a\\\\b");
        assert_eq!(escape_label("a\nb"), "a\\nb");
    }
}
