use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{config::AppConfig, error::AppError};

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

/// Reject requests whose `Host` is not on the configured allow-list.
pub async fn enforce_allowed_hosts(
    State(config): State<Arc<AppConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().host())
        .map(strip_port)
        .unwrap_or_default()
        .to_string();

    if !config.host_allowed(&host) {
        tracing::warn!(host = %host, "rejected request for disallowed host");
        return AppError::BadRequest("Invalid HTTP_HOST header".into()).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ports_from_names_and_ipv6() {
        assert_eq!(strip_port("shop.example.com:8080"), "shop.example.com");
        assert_eq!(strip_port("localhost"), "localhost");
        assert_eq!(strip_port("[::1]:3000"), "[::1]");
    }
}
