use std::fmt::Write as _;

use disaster_watch_store::SnapshotStore;

use super::server_metrics::{DEFAULT_BUCKETS, ServerMetrics};

/// `Content-Type` of the text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders all metrics; gauges are read from `store` at call time.
#[must_use]
pub fn render_prometheus(m: &ServerMetrics, store: &SnapshotStore) -> String {
    let mut out = String::with_capacity(2048);

    write_header(
        &mut out,
        "http_requests_total",
        "Total number of HTTP requests",
        "counter",
    );
    for ((method, endpoint, status), count) in m.requests() {
        let _ = writeln!(
            out,
            "http_requests_total{{method=\"{}\",endpoint=\"{}\",http_status=\"{status}\"}} {count}",
            escape(&method),
            escape(&endpoint),
        );
    }

    write_header(
        &mut out,
        "http_request_duration_seconds",
        "HTTP request latency",
        "histogram",
    );
    for ((method, endpoint), h) in m.latency() {
        let labels = format!(
            "method=\"{}\",endpoint=\"{}\"",
            escape(&method),
            escape(&endpoint)
        );
        for (bound, count) in DEFAULT_BUCKETS.iter().zip(h.buckets) {
            let _ = writeln!(
                out,
                "http_request_duration_seconds_bucket{{{labels},le=\"{bound}\"}} {count}"
            );
        }
        let _ = writeln!(
            out,
            "http_request_duration_seconds_bucket{{{labels},le=\"+Inf\"}} {}",
            h.count
        );
        let _ = writeln!(out, "http_request_duration_seconds_sum{{{labels}}} {}", h.sum);
        let _ = writeln!(out, "http_request_duration_seconds_count{{{labels}}} {}", h.count);
    }

    write_header(
        &mut out,
        "feed_fetch_total",
        "Upstream fetch attempts by outcome",
        "counter",
    );
    for ((source, outcome), count) in m.fetches() {
        let _ = writeln!(
            out,
            "feed_fetch_total{{source=\"{source}\",outcome=\"{}\"}} {count}",
            outcome.as_str()
        );
    }

    write_gauge(
        &mut out,
        "gdacs_alerts_count",
        "Number of GDACS alerts fetched",
        store.gdacs.get().data.len(),
    );
    write_gauge(
        &mut out,
        "reliefweb_disasters_count",
        "Number of ReliefWeb disasters fetched",
        store.reliefweb.get().data.len(),
    );
    write_gauge(
        &mut out,
        "weather_data_present",
        "Indicates if weather data is present (1) or not (0)",
        usize::from(store.weather.get().data.is_some()),
    );

    out
}

fn write_header(out: &mut String, name: &str, help: &str, kind: &str) {
    let _ = writeln!(out, "# HELP {name} {help}");
    let _ = writeln!(out, "# TYPE {name} {kind}");
}

fn write_gauge(out: &mut String, name: &str, help: &str, val: usize) {
    write_header(out, name, help, "gauge");
    let _ = writeln!(out, "{name} {val}");
}

fn escape(label: &str) -> String {
    label
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use disaster_watch_feed_models::{NormalizedAlert, SourceId, WeatherSnapshot};

    use super::*;
    use crate::metrics::server_metrics::FetchOutcome;

    #[test]
    fn prometheus_output() {
        let m = ServerMetrics::new();
        m.observe_request("GET", "/api/status", 200, Duration::from_millis(20));
        m.record_fetch(SourceId::Gdacs, FetchOutcome::Failure);

        let store = SnapshotStore::new();
        store
            .gdacs
            .set(vec![NormalizedAlert::default(), NormalizedAlert::default()], Utc::now());

        let output = render_prometheus(&m, &store);
        assert!(output.contains(
            "http_requests_total{method=\"GET\",endpoint=\"/api/status\",http_status=\"200\"} 1"
        ));
        assert!(output.contains("# TYPE http_request_duration_seconds histogram"));
        assert!(output.contains(
            "http_request_duration_seconds_bucket{method=\"GET\",endpoint=\"/api/status\",le=\"0.025\"} 1"
        ));
        assert!(output.contains(
            "http_request_duration_seconds_bucket{method=\"GET\",endpoint=\"/api/status\",le=\"0.01\"} 0"
        ));
        assert!(output.contains("feed_fetch_total{source=\"gdacs\",outcome=\"failure\"} 1"));
        assert!(output.contains("gdacs_alerts_count 2"));
        assert!(output.contains("reliefweb_disasters_count 0"));
        assert!(output.contains("weather_data_present 0"));
    }

    #[test]
    fn weather_gauge_follows_store() {
        let store = SnapshotStore::new();
        store
            .weather
            .set(Some(WeatherSnapshot::default()), Utc::now());
        let output = render_prometheus(&ServerMetrics::new(), &store);
        assert!(output.contains("weather_data_present 1"));
    }

    #[test]
    fn labels_are_escaped() {
        assert_eq!(escape("a\"b\\c"), "a\\\"b\\\\c");
    }
}
