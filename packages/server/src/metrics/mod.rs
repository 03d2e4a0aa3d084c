//! Prometheus metrics: request counters and latency collected by
//! middleware, fetch outcomes reported by the refresher, and snapshot
//! gauges read from the store at scrape time.

pub mod exposition;
pub mod server_metrics;

use std::sync::Arc;
use std::time::Instant;

use actix_web::Error;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse};

pub use exposition::render_prometheus;
pub use server_metrics::ServerMetrics;

/// Endpoint label for requests that matched no route.
const UNMATCHED: &str = "unmatched";

/// Times the wrapped service and records one observation per request.
///
/// Intended for `App::wrap_fn`. The endpoint label is the matched route
/// pattern so path parameters and unknown paths do not create new series.
///
/// # Errors
///
/// Returns the wrapped service's error unchanged; such requests are not
/// recorded.
pub fn track<S, B>(
    metrics: Arc<ServerMetrics>,
    req: ServiceRequest,
    srv: &S,
) -> impl std::future::Future<Output = Result<ServiceResponse<B>, Error>> + use<S, B>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let method = req.method().to_string();
    let started = Instant::now();
    let response = srv.call(req);

    async move {
        let res = response.await?;
        let endpoint = res
            .request()
            .match_pattern()
            .unwrap_or_else(|| UNMATCHED.to_string());
        metrics.observe_request(&method, &endpoint, res.status().as_u16(), started.elapsed());
        Ok(res)
    }
}
