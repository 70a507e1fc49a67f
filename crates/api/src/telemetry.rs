use std::time::Duration;
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use axum::body::Body;
use tower_http::limit::ResponseBody;
use tower_http::map_response_body::MapResponseBodyLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::HttpMakeClassifier;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Large course catalogues are posted whole.
const BODY_LIMIT: usize = 8 * 1024 * 1024;

/// Upper bound for a synchronous generate call; background jobs are not affected.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Converts the body-limit response body back to `Body` so `CorsLayer` (which needs `Default`) can wrap it.
type LimitBodyToBody = MapResponseBodyLayer<fn(ResponseBody<Body>) -> Body>;

pub type Layers = Stack<
    TimeoutLayer,
    Stack<
        RequestBodyLimitLayer,
        Stack<LimitBodyToBody, Stack<CorsLayer, Stack<TraceLayer<HttpMakeClassifier>, Identity>>>,
    >,
>;

pub fn stack() -> ServiceBuilder<Layers> {
    ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(MapResponseBodyLayer::new(Body::new as fn(ResponseBody<Body>) -> Body))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
