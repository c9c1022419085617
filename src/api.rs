//! HTTP API over a loaded database.
//!
//! Routes keep the v39 paths and JSON shape: a miss is a
//! `null` body with status 200, a malformed parameter is a 400.

use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::db::{GeoDatabase, LoadStats};
use crate::models::GeoItem;

/// Build the router. The database is shared read-only by every handler.
pub fn router(db: Arc<GeoDatabase>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/v39/ip/s.json", get(ip_handler))
        .route("/v39/geo/n.json", get(nearest_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    records: usize,
    spatial_points: usize,
}

async fn health_handler(State(db): State<Arc<GeoDatabase>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        records: db.range_index().len(),
        spatial_points: db.spatial_index().len(),
    })
}

async fn stats_handler(State(db): State<Arc<GeoDatabase>>) -> Json<LoadStats> {
    Json(db.stats().clone())
}

#[derive(Deserialize)]
struct IpQueryParams {
    /// Dotted-decimal IPv4 address
    ip: String,
}

/// Region owning an IPv4 address
async fn ip_handler(
    State(db): State<Arc<GeoDatabase>>,
    Query(params): Query<IpQueryParams>,
) -> Result<Json<Option<GeoItem>>, (StatusCode, String)> {
    let ip = parse_ipv4(&params.ip).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid IPv4 address: {}", params.ip),
        )
    })?;

    let item = db.lookup_ip(ip).cloned();
    debug!("IP lookup {}: found={}", params.ip, item.is_some());
    Ok(Json(item))
}

#[derive(Deserialize)]
struct NearestQueryParams {
    /// "lat,lng"
    location: String,
}

/// Nearest indexed place to a position
async fn nearest_handler(
    State(db): State<Arc<GeoDatabase>>,
    Query(params): Query<NearestQueryParams>,
) -> Result<Json<Option<GeoItem>>, (StatusCode, String)> {
    let (lat, lng) = parse_location(&params.location).ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid location, expected \"lat,lng\": {}", params.location),
        )
    })?;

    let item = db.lookup_nearest(lat, lng).cloned();
    debug!("Nearest lookup ({}, {}): found={}", lat, lng, item.is_some());
    Ok(Json(item))
}

/// Parse an IPv4 address (or IPv4-mapped IPv6) into its big-endian `u32`.
pub fn parse_ipv4(s: &str) -> Option<u32> {
    match s.trim().parse::<IpAddr>().ok()? {
        IpAddr::V4(v4) => Some(u32::from(v4)),
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(u32::from),
    }
}

/// Parse "lat,lng" into two finite floats.
pub fn parse_location(s: &str) -> Option<(f64, f64)> {
    let (lat, lng) = s.split_once(',')?;
    if lng.contains(',') {
        return None;
    }

    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    (lat.is_finite() && lng.is_finite()).then_some((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        assert_eq!(parse_ipv4("1.1.1.5"), Some(0x0101_0105));
        assert_eq!(parse_ipv4("255.255.255.255"), Some(u32::MAX));
        assert_eq!(parse_ipv4(" 8.8.8.8 "), Some(0x0808_0808));
        assert_eq!(parse_ipv4("::ffff:1.2.3.4"), Some(0x0102_0304));
    }

    #[test]
    fn test_parse_ipv4_rejects() {
        assert_eq!(parse_ipv4(""), None);
        assert_eq!(parse_ipv4("1.2.3"), None);
        assert_eq!(parse_ipv4("256.1.1.1"), None);
        assert_eq!(parse_ipv4("2001:db8::1"), None);
        assert_eq!(parse_ipv4("localhost"), None);
    }

    #[test]
    fn test_parse_location() {
        assert_eq!(parse_location("39.9,116.4"), Some((39.9, 116.4)));
        assert_eq!(parse_location("-33.8, 151.2"), Some((-33.8, 151.2)));
    }

    #[test]
    fn test_parse_location_rejects() {
        assert_eq!(parse_location("39.9"), None);
        assert_eq!(parse_location("1,2,3"), None);
        assert_eq!(parse_location("lat,lng"), None);
        assert_eq!(parse_location("NaN,1"), None);
        assert_eq!(parse_location("inf,1"), None);
    }
}
