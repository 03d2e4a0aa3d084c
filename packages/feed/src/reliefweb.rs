//! `ReliefWeb` disasters API.

use disaster_watch_feed_models::{NormalizedDisaster, SourceId};
use serde_json::Value;

use crate::config::{ReliefWebConfig, ReliefWebOutput};
use crate::dynamic::as_text;
use crate::{FetchCause, FetchError, http};

/// `scheme://host` followed by the configured path.
#[must_use]
pub fn base_url(config: &ReliefWebConfig) -> String {
    let api = &config.api;
    format!("{}://{}{}", api.scheme, api.host, api.path)
}

/// Query-string pairs for one request.
///
/// Sort expressions repeat `sort[]`. Each filter becomes
/// `filter[field][<key>]`; empty strings and empty lists are skipped, a
/// list repeats the parameter per element, and nested tables are ignored.
#[must_use]
pub fn build_query(config: &ReliefWebConfig) -> Vec<(String, String)> {
    let query = &config.query;
    let mut params = vec![
        ("appname".to_string(), config.api.appname.clone()),
        ("limit".to_string(), query.limit.to_string()),
        ("profile".to_string(), query.profile.clone()),
    ];

    params.extend(
        query
            .sort
            .iter()
            .map(|sort| ("sort[]".to_string(), sort.clone())),
    );

    for (key, value) in &query.filters {
        let name = format!("filter[field][{key}]");
        match value {
            toml::Value::String(s) if s.is_empty() => {}
            toml::Value::Array(items) => {
                params.extend(
                    items
                        .iter()
                        .filter_map(filter_scalar)
                        .map(|v| (name.clone(), v)),
                );
            }
            other => match filter_scalar(other) {
                Some(v) => params.push((name, v)),
                None => log::warn!("Ignoring non-scalar ReliefWeb filter {key}"),
            },
        }
    }

    params
}

fn filter_scalar(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) if s.is_empty() => None,
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}

/// Fetches the current disasters.
///
/// # Errors
///
/// Returns [`FetchError`] tagged [`SourceId::ReliefWeb`] on transport
/// errors, non-2xx responses, or an unexpected body shape.
pub async fn fetch(
    client: &reqwest::Client,
    config: &ReliefWebConfig,
) -> Result<Vec<NormalizedDisaster>, FetchError> {
    let tag = |cause: FetchCause| FetchError::new(SourceId::ReliefWeb, cause);

    let url = base_url(config);
    log::debug!("Fetching ReliefWeb data from {url}");
    let body = http::send_json(client.get(&url).query(&build_query(config)))
        .await
        .map_err(tag)?;
    let disasters = parse_response(body).map_err(tag)?;
    log::debug!("Parsed {} ReliefWeb disasters", disasters.len());
    Ok(disasters)
}

/// Extracts the `data` array from a response body.
///
/// # Errors
///
/// Returns [`FetchCause::Parse`] if `data` is present but not an array.
pub fn parse_response(body: Value) -> Result<Vec<NormalizedDisaster>, FetchCause> {
    let Value::Object(mut map) = body else {
        return Err(FetchCause::Parse {
            message: "ReliefWeb response is not a JSON object".to_string(),
        });
    };
    match map.remove("data") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.into_iter().map(NormalizedDisaster).collect()),
        Some(other) => Err(FetchCause::Parse {
            message: format!("ReliefWeb `data` is not an array: {other}"),
        }),
    }
}

/// Renders `name: value` lines for one disaster per the `[output]` table.
///
/// `fields = None` lists every field the record has; an empty list
/// yields nothing.
#[must_use]
pub fn summarize(disaster: &NormalizedDisaster, output: &ReliefWebOutput) -> Vec<String> {
    let Some(record) = disaster.fields() else {
        return Vec::new();
    };
    let render = |value: Option<&Value>| {
        value.map_or_else(
            || "None".to_string(),
            |v| as_text(v).unwrap_or_else(|| v.to_string()),
        )
    };
    match &output.fields {
        None => record
            .iter()
            .map(|(name, value)| format!("{name}: {}", render(Some(value))))
            .collect(),
        Some(names) => names
            .iter()
            .map(|name| format!("{name}: {}", render(record.get(name))))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::test_server::{Canned, serve};

    fn config_from(toml_src: &str) -> ReliefWebConfig {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn base_url_joins_parts() {
        assert_eq!(
            base_url(&ReliefWebConfig::default()),
            "https://api.reliefweb.int/v1/disasters"
        );
    }

    #[test]
    fn query_includes_sort_and_non_empty_filters() {
        let config = config_from(
            r#"
            [query]
            limit = 5
            sort = ["date:desc", "id:asc"]

            [query.filters]
            status = "current"
            country = ""
            type = ["Flood", "Earthquake"]
            "#,
        );
        let params = build_query(&config);
        let get_all = |key: &str| -> Vec<&str> {
            params
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .collect()
        };
        assert_eq!(get_all("appname"), vec!["disaster-watch"]);
        assert_eq!(get_all("limit"), vec!["5"]);
        assert_eq!(get_all("profile"), vec!["full"]);
        assert_eq!(get_all("sort[]"), vec!["date:desc", "id:asc"]);
        assert_eq!(get_all("filter[field][status]"), vec!["current"]);
        assert!(get_all("filter[field][country]").is_empty());
        assert_eq!(
            get_all("filter[field][type]"),
            vec!["Flood", "Earthquake"]
        );
    }

    #[test]
    fn response_data_shapes() {
        let disasters = parse_response(json!({"data": [{"id": 1}, {"id": "2"}]})).unwrap();
        assert_eq!(disasters.len(), 2);
        assert_eq!(disasters[1].id().as_deref(), Some("2"));

        assert!(parse_response(json!({"count": 0})).unwrap().is_empty());
        assert!(parse_response(json!({"data": {"id": 1}})).is_err());
        assert!(parse_response(json!([1, 2])).is_err());
    }

    #[test]
    fn summary_respects_output_fields() {
        let disaster = NormalizedDisaster(json!({
            "id": 7,
            "fields": {"name": "Chile: Earthquake", "status": "current"}
        }));
        let all = summarize(&disaster, &ReliefWebOutput { fields: None });
        assert_eq!(all, vec!["name: Chile: Earthquake", "status: current"]);

        let picked = summarize(
            &disaster,
            &ReliefWebOutput {
                fields: Some(vec!["status".to_string(), "glide".to_string()]),
            },
        );
        assert_eq!(picked, vec!["status: current", "glide: None"]);

        let none = summarize(&disaster, &ReliefWebOutput { fields: Some(vec![]) });
        assert!(none.is_empty());
    }

    #[actix_web::test]
    async fn fetch_passes_data_through_unchanged() {
        let body = r#"{"count":1,"data":[{"id":"51234","href":"https://api.reliefweb.int/v1/disasters/51234","fields":{"name":"Kenya: Floods","type":[{"name":"Flood"}]}}]}"#;
        let (base, seen) = serve(vec![Canned::ok("/v1/disasters", "application/json", body)]);
        let authority = base.trim_start_matches("http://").to_string();
        let config = config_from(&format!(
            "[api]\nscheme = \"http\"\nhost = \"{authority}\"\n\n[query]\nlimit = 3\nsort = [\"date:desc\"]\n"
        ));

        let disasters = fetch(&reqwest::Client::new(), &config).await.unwrap();
        assert_eq!(disasters.len(), 1);
        assert_eq!(disasters[0].first_name_of("type"), Some("Flood"));
        assert_eq!(
            disasters[0].raw()["href"],
            json!("https://api.reliefweb.int/v1/disasters/51234")
        );

        let requests = seen.lock().unwrap();
        let query = &requests[0].1;
        assert!(query.contains("limit=3"));
        assert!(query.contains("sort%5B%5D=date%3Adesc"));
    }

    #[actix_web::test]
    async fn non_success_status_is_tagged_reliefweb() {
        let (base, _) = serve(vec![]);
        let authority = base.trim_start_matches("http://").to_string();
        let config = config_from(&format!("[api]\nscheme = \"http\"\nhost = \"{authority}\"\n"));

        let err = fetch(&reqwest::Client::new(), &config).await.unwrap_err();
        assert_eq!(err.feed, SourceId::ReliefWeb);
        assert!(matches!(err.cause, FetchCause::Status { status, .. } if status == 404));
    }

    #[actix_web::test]
    async fn invalid_json_is_parse_error() {
        let (base, _) = serve(vec![Canned::ok("/v1/disasters", "text/html", "<html>")]);
        let authority = base.trim_start_matches("http://").to_string();
        let config = config_from(&format!("[api]\nscheme = \"http\"\nhost = \"{authority}\"\n"));

        let err = fetch(&reqwest::Client::new(), &config).await.unwrap_err();
        assert_eq!(err.feed, SourceId::ReliefWeb);
        assert_eq!(err.cause.kind(), "parse");
    }
}
