//! HTTP handler functions for the disaster watch API.
//!
//! Every handler except the on-demand weather path only reads the
//! snapshot store.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use disaster_watch_feed_models::Coordinates;
use disaster_watch_server_models::{
    ApiDisasters, ApiError, ApiHealth, ApiList, ApiStatus, ApiWeatherAt, ApiWeatherCached,
    SourceCounts, StatusData, WeatherQueryParams,
};

use crate::AppState;
use crate::combined::combine;
use crate::metrics::exposition::{CONTENT_TYPE, render_prometheus};

/// A client-supplied value that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// A coordinate did not parse as a number.
    #[error("invalid {name}: {value:?}")]
    Coordinate {
        /// `lat` or `lng`.
        name: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Parses the `lat`/`lng` query values. No range check is applied.
///
/// # Errors
///
/// Returns [`ValidationError::Coordinate`] for the first value that is
/// not a float.
pub fn parse_position(lat: &str, lng: &str) -> Result<Coordinates, ValidationError> {
    let parse = |name: &'static str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::Coordinate {
                name,
                value: value.to_string(),
            })
    };
    Ok(Coordinates {
        lat: parse("lat", lat)?,
        lng: parse("lng", lng)?,
    })
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/gdacs`
pub async fn gdacs(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.store.gdacs.get();
    HttpResponse::Ok().json(ApiList {
        success: true,
        data: &snapshot.data,
        count: snapshot.data.len(),
        last_updated: snapshot.fetched_at,
    })
}

/// `GET /api/reliefweb`
pub async fn reliefweb(state: web::Data<AppState>) -> HttpResponse {
    let snapshot = state.store.reliefweb.get();
    HttpResponse::Ok().json(ApiList {
        success: true,
        data: &snapshot.data,
        count: snapshot.data.len(),
        last_updated: snapshot.fetched_at,
    })
}

/// `GET /api/disasters`
///
/// Both feeds merged into one newest-first list.
pub async fn disasters(state: web::Data<AppState>) -> HttpResponse {
    let gdacs = state.store.gdacs.get();
    let reliefweb = state.store.reliefweb.get();
    let data = combine(&gdacs, &reliefweb, Utc::now());

    HttpResponse::Ok().json(ApiDisasters {
        success: true,
        count: data.len(),
        data,
        sources: SourceCounts {
            gdacs: gdacs.data.len(),
            reliefweb: reliefweb.data.len(),
        },
        last_updated: gdacs.fetched_at.max(reliefweb.fetched_at),
    })
}

/// `GET /api/weather?lat=&lng=`
///
/// With both coordinates, fetches weather for that position without
/// caching it. Otherwise serves the cached server-location snapshot.
pub async fn weather(
    state: web::Data<AppState>,
    params: web::Query<WeatherQueryParams>,
) -> HttpResponse {
    let lat = params.lat.as_deref().filter(|v| !v.is_empty());
    let lng = params.lng.as_deref().filter(|v| !v.is_empty());

    if let (Some(lat), Some(lng)) = (lat, lng) {
        let position = match parse_position(lat, lng) {
            Ok(position) => position,
            Err(e) => {
                log::debug!("Rejected weather query: {e}");
                return HttpResponse::BadRequest().json(ApiError::new("Invalid coordinates provided"));
            }
        };

        return match state.fetcher.fetch_weather(Some(position)).await {
            Ok(data) => HttpResponse::Ok().json(ApiWeatherAt {
                success: true,
                data,
                coordinates: position,
                timestamp: Utc::now(),
            }),
            Err(e) => {
                log::error!("On-demand weather fetch failed: {e}");
                HttpResponse::InternalServerError().json(ApiError::new(
                    "Failed to fetch weather data for specified coordinates",
                ))
            }
        };
    }

    let snapshot = state.store.weather.get();
    match &snapshot.data {
        Some(data) => HttpResponse::Ok().json(ApiWeatherCached {
            success: true,
            data,
            last_updated: snapshot.fetched_at,
        }),
        None => HttpResponse::ServiceUnavailable().json(ApiError::new(
            "Weather data not yet available or failed to fetch",
        )),
    }
}

/// `GET /api/status`
///
/// Counts and fetch times; never triggers a fetch.
pub async fn status(state: web::Data<AppState>) -> HttpResponse {
    let gdacs = state.store.gdacs.get();
    let reliefweb = state.store.reliefweb.get();
    let weather = state.store.weather.get();

    HttpResponse::Ok().json(ApiStatus {
        success: true,
        status: "operational".to_string(),
        data: StatusData {
            gdacs_alert_count: gdacs.data.len(),
            reliefweb_disaster_count: reliefweb.data.len(),
            total_disasters: gdacs.data.len() + reliefweb.data.len(),
            weather_available: weather.data.is_some(),
            gdacs_last_updated: gdacs.fetched_at,
            reliefweb_last_updated: reliefweb.fetched_at,
            last_updated: gdacs.fetched_at.max(reliefweb.fetched_at),
            last_weather_updated: weather.fetched_at,
        },
    })
}

/// `GET /metrics`
pub async fn metrics(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(CONTENT_TYPE)
        .body(render_prometheus(&state.metrics, &state.store))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use actix_web::test::{TestRequest, call_service, init_service, read_body, read_body_json};
    use actix_web::{App, http::StatusCode};
    use async_trait::async_trait;
    use chrono::TimeZone as _;
    use disaster_watch_feed::{FeedFetcher, FetchCause, FetchError};
    use disaster_watch_feed_models::{
        NormalizedAlert, NormalizedDisaster, SourceId, WeatherSnapshot,
    };
    use disaster_watch_store::SnapshotStore;
    use serde_json::{Value, json};

    use super::*;
    use crate::configure;
    use crate::metrics::ServerMetrics;

    /// Records requested positions; fails when `fail` is set.
    #[derive(Default)]
    struct FakeFetcher {
        positions: Mutex<Vec<Option<Coordinates>>>,
        fail: bool,
    }

    #[async_trait]
    impl FeedFetcher for FakeFetcher {
        async fn fetch_alerts(&self) -> Result<Vec<NormalizedAlert>, FetchError> {
            Ok(Vec::new())
        }

        async fn fetch_disasters(&self) -> Result<Vec<NormalizedDisaster>, FetchError> {
            Ok(Vec::new())
        }

        async fn fetch_weather(
            &self,
            position: Option<Coordinates>,
        ) -> Result<WeatherSnapshot, FetchError> {
            self.positions.lock().unwrap().push(position);
            if self.fail {
                return Err(FetchError::new(
                    SourceId::Weather,
                    FetchCause::Parse {
                        message: "provider down".to_string(),
                    },
                ));
            }
            Ok(WeatherSnapshot {
                conditions: "Sunny".to_string(),
                ..WeatherSnapshot::default()
            })
        }
    }

    fn state(store: Arc<SnapshotStore>, fetcher: Arc<FakeFetcher>) -> web::Data<AppState> {
        web::Data::new(AppState {
            store,
            fetcher,
            metrics: Arc::new(ServerMetrics::new()),
        })
    }

    async fn get(state: web::Data<AppState>, uri: &str) -> (StatusCode, Value) {
        let app = init_service(
            App::new()
                .app_data(state)
                .configure(|cfg| configure(cfg, "/api")),
        )
        .await;
        let resp = call_service(&app, TestRequest::get().uri(uri).to_request()).await;
        let status = resp.status();
        let body: Value = read_body_json(resp).await;
        (status, body)
    }

    fn alert(guid: &str, level: &str) -> NormalizedAlert {
        NormalizedAlert::new(vec![
            ("guid".to_string(), json!(guid)),
            ("alertlevel".to_string(), json!(level)),
        ])
    }

    #[actix_web::test]
    async fn health_is_always_ok() {
        let (status, body) = get(
            state(Arc::default(), Arc::default()),
            "/api/health",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["version"].is_string());
    }

    #[actix_web::test]
    async fn cold_store_serves_empty_lists() {
        let (status, body) = get(state(Arc::default(), Arc::default()), "/api/gdacs").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "data": [], "count": 0, "last_updated": null}));
    }

    #[actix_web::test]
    async fn gdacs_serves_normalized_alerts_in_field_order() {
        let store = Arc::new(SnapshotStore::new());
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        store.gdacs.set(vec![alert("EQ1", "Red")], at);

        let (_, body) = get(state(store, Arc::default()), "/api/gdacs").await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["data"][0]["guid"], "EQ1");
        assert_eq!(body["last_updated"], "2026-05-01T12:00:00Z");
    }

    #[actix_web::test]
    async fn reliefweb_passes_records_through() {
        let store = Arc::new(SnapshotStore::new());
        let record = json!({"id": "7", "fields": {"name": "Chile: Earthquake"}});
        store
            .reliefweb
            .set(vec![NormalizedDisaster(record.clone())], Utc::now());

        let (_, body) = get(state(store, Arc::default()), "/api/reliefweb").await;
        assert_eq!(body["data"][0], record);
    }

    #[actix_web::test]
    async fn disasters_combines_and_counts_sources() {
        let store = Arc::new(SnapshotStore::new());
        let early = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 5, 2, 0, 0, 0).unwrap();
        store.gdacs.set(vec![alert("EQ1", "Green")], early);
        store.reliefweb.set(
            vec![NormalizedDisaster(json!({"id": 3, "fields": {"name": "Flood"}}))],
            late,
        );

        let (status, body) = get(state(store, Arc::default()), "/api/disasters").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 2);
        assert_eq!(body["sources"], json!({"gdacs": 1, "reliefweb": 1}));
        assert_eq!(body["data"][0]["id"], "reliefweb-3");
        assert_eq!(body["data"][1]["severity"], "Low");
        assert_eq!(body["last_updated"], "2026-05-02T00:00:00Z");
    }

    #[actix_web::test]
    async fn cached_weather_on_cold_store_is_503() {
        let (status, body) = get(state(Arc::default(), Arc::default()), "/api/weather").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn cached_weather_is_served_without_fetching() {
        let store = Arc::new(SnapshotStore::new());
        store
            .weather
            .set(Some(WeatherSnapshot::default()), Utc::now());
        let fetcher = Arc::new(FakeFetcher::default());

        let (status, body) = get(state(store, fetcher.clone()), "/api/weather?lat=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["conditions"], "Unknown");
        assert!(fetcher.positions.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn invalid_coordinates_are_400() {
        let fetcher = Arc::new(FakeFetcher::default());
        let (status, body) = get(
            state(Arc::default(), fetcher.clone()),
            "/api/weather?lat=abc&lng=1",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid coordinates provided");
        assert!(fetcher.positions.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn out_of_range_coordinates_are_forwarded() {
        let store: Arc<SnapshotStore> = Arc::default();
        let fetcher = Arc::new(FakeFetcher::default());
        let (status, body) = get(
            state(store.clone(), fetcher.clone()),
            "/api/weather?lat=91&lng=0",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["coordinates"], json!({"lat": 91.0, "lng": 0.0}));
        assert_eq!(body["data"]["conditions"], "Sunny");
        assert_eq!(
            *fetcher.positions.lock().unwrap(),
            vec![Some(Coordinates { lat: 91.0, lng: 0.0 })]
        );
        assert!(store.weather.get().data.is_none());
    }

    #[actix_web::test]
    async fn provider_failure_is_500() {
        let fetcher = Arc::new(FakeFetcher {
            fail: true,
            ..FakeFetcher::default()
        });
        let (status, body) = get(state(Arc::default(), fetcher), "/api/weather?lat=1&lng=2").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn status_reports_counts_without_fetching() {
        let store = Arc::new(SnapshotStore::new());
        store
            .gdacs
            .set(vec![alert("a", "Red"), alert("b", "Red")], Utc::now());
        let fetcher = Arc::new(FakeFetcher::default());

        let (_, body) = get(state(store, fetcher.clone()), "/api/status").await;
        assert_eq!(body["status"], "operational");
        assert_eq!(body["data"]["gdacs_alert_count"], 2);
        assert_eq!(body["data"]["total_disasters"], 2);
        assert_eq!(body["data"]["weather_available"], false);
        assert!(body["data"]["reliefweb_last_updated"].is_null());
        assert!(fetcher.positions.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn metrics_are_recorded_per_route() {
        let state = state(Arc::default(), Arc::default());
        let metrics = state.metrics.clone();
        let app = init_service(
            App::new()
                .app_data(state)
                .wrap_fn(move |req, srv| crate::metrics::track(metrics.clone(), req, srv))
                .configure(|cfg| configure(cfg, "/api")),
        )
        .await;

        call_service(&app, TestRequest::get().uri("/api/status").to_request()).await;
        let resp =
            call_service(&app, TestRequest::get().uri("/metrics").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains(
            "http_requests_total{method=\"GET\",endpoint=\"/api/status\",http_status=\"200\"} 1"
        ));
        assert!(text.contains("gdacs_alerts_count 0"));
    }

    #[test]
    fn parse_position_accepts_padded_floats() {
        let position = parse_position(" 12.5", "-70.25 ").unwrap();
        assert_eq!(position, Coordinates { lat: 12.5, lng: -70.25 });
        assert!(matches!(
            parse_position("1", "east"),
            Err(ValidationError::Coordinate { name: "lng", .. })
        ));
    }
}
