//! HTTP endpoint for air quality queries
//!
//! Endpoints (also served under an `/api` prefix):
//! - GET /air-quality?latitude=..&longitude=.. - Live air quality for a coordinate pair
//! - GET /paris/most-polluted - Most polluted stored reading for the fixed location
//! - GET /paris/air-quality - Live air quality for the fixed location
//! - GET /health - Service health check

use crate::error::AirQualityError;
use crate::service::AirQualityService;
use serde_json::{Value, json};
use std::collections::HashMap;

type JsonResponse = tiny_http::Response<std::io::Cursor<Vec<u8>>>;

const AVAILABLE_ENDPOINTS: [&str; 4] = [
    "/air-quality?latitude={lat}&longitude={lon}",
    "/paris/most-polluted",
    "/paris/air-quality",
    "/health",
];

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Bind and serve on `bind:port`. Blocks for the life of the server.
pub fn start_endpoint_server(bind: &str, port: u16, service: AirQualityService) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("{}:{}", bind, port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    tracing::info!(address = %format!("http://{}:{}", bind, port), "HTTP endpoint listening");
    serve(server, service);
    Ok(())
}

/// Serve requests from an already-bound server until it shuts down.
pub fn serve(server: tiny_http::Server, mut service: AirQualityService) {
    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let (status, body) = route(&mut service, &method, &url);
        tracing::info!(method = %method, url = %redact_query(&url), status, "request handled");

        if let Err(e) = request.respond(create_response(status, body)) {
            tracing::warn!(error = %e, "failed to send response");
        }
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Map a request onto a status code and JSON body.
pub fn route(service: &mut AirQualityService, method: &tiny_http::Method, url: &str) -> (u16, Value) {
    let (path, query) = split_url(url);
    let path = normalize_path(path);

    if !matches!(
        path,
        "/air-quality" | "/paris/most-polluted" | "/paris/air-quality" | "/health"
    ) {
        return (
            404,
            json!({
                "error": "Not found",
                "available_endpoints": AVAILABLE_ENDPOINTS
            }),
        );
    }

    if *method != tiny_http::Method::Get {
        return (405, json!({ "error": "Method not allowed" }));
    }

    match path {
        "/air-quality" => handle_air_quality(service, &query),
        "/paris/most-polluted" => handle_most_polluted(service),
        "/paris/air-quality" => handle_fixed_air_quality(service),
        _ => handle_health(service),
    }
}

/// Handle /health endpoint
fn handle_health(service: &AirQualityService) -> (u16, Value) {
    (
        200,
        json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "location": service.location_name(),
        }),
    )
}

/// Handle /air-quality endpoint
fn handle_air_quality(service: &AirQualityService, query: &HashMap<String, String>) -> (u16, Value) {
    let latitude = query.get("latitude").map(String::as_str);
    let longitude = query.get("longitude").map(String::as_str);

    match service.get_air_quality(latitude, longitude) {
        Ok(result) => to_json(&result),
        Err(e) => error_response("Failed to fetch air quality data", &e),
    }
}

/// Handle /paris/most-polluted endpoint
fn handle_most_polluted(service: &mut AirQualityService) -> (u16, Value) {
    match service.get_most_polluted_for_fixed_location() {
        Ok(most) => to_json(&most),
        Err(e) => error_response("Failed to fetch most polluted datetime", &e),
    }
}

/// Handle /paris/air-quality endpoint
fn handle_fixed_air_quality(service: &AirQualityService) -> (u16, Value) {
    match service.get_current_fixed_location_air_quality() {
        Ok(result) => to_json(&result),
        Err(e) => {
            let context = format!("Failed to fetch {} air quality data", service.location_name());
            error_response(&context, &e)
        }
    }
}

/// Client errors and not-found carry just `error`; server-side failures
/// carry a fixed `error` summary plus the underlying `message`.
pub fn error_response(context: &str, err: &AirQualityError) -> (u16, Value) {
    let status = err.http_status();
    if status >= 500 {
        tracing::error!(error = %err, "{}", context);
        (status, json!({ "error": context, "message": err.to_string() }))
    } else {
        tracing::warn!(error = %err, "request rejected");
        (status, json!({ "error": err.to_string() }))
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> (u16, Value) {
    match serde_json::to_value(value) {
        Ok(json) => (200, json),
        Err(e) => (
            500,
            json!({ "error": "Failed to encode response", "message": e.to_string() }),
        ),
    }
}

// ---------------------------------------------------------------------------
// URL handling
// ---------------------------------------------------------------------------

/// Split a request URL into its path and decoded query parameters.
/// Repeated keys keep the first value.
pub fn split_url(url: &str) -> (&str, HashMap<String, String>) {
    let (path, raw_query) = url.split_once('?').unwrap_or((url, ""));

    let mut query = HashMap::new();
    for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        query
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }

    (path, query)
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

/// Strip the optional `/api` mount prefix and any trailing slash.
fn normalize_path(path: &str) -> &str {
    let path = match path.strip_prefix("/api") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    };
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Drop the query string from logged URLs.
fn redact_query(url: &str) -> &str {
    url.split_once('?').map(|(path, _)| path).unwrap_or(url)
}

/// Create HTTP response with JSON body
fn create_response(status_code: u16, json: Value) -> JsonResponse {
    let body = serde_json::to_vec_pretty(&json).unwrap_or_else(|_| b"{}".to_vec());

    let response = tiny_http::Response::from_data(body)
        .with_status_code(tiny_http::StatusCode::from(status_code));

    match tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(_) => response,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
