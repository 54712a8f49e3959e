//! Cookie policy shared by the session and auth cookies.

use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Site-wide, script-inaccessible cookie.
pub fn site_cookie(
    name: &'static str,
    value: impl Into<String>,
    max_age_secs: Option<i64>,
    secure: bool,
) -> Cookie<'static> {
    let mut builder = Cookie::build((name, value.into()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);
    if let Some(secs) = max_age_secs {
        builder = builder.max_age(Duration::seconds(secs));
    }
    builder.build()
}

/// Cookie that makes the browser drop `name`.
pub fn removal_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    site_cookie(name, "", Some(0), secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};
    use axum_extra::extract::cookie::CookieJar;

    #[test]
    fn jar_reads_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sessionid=abc123; auth_token=jwt"),
        );
        let jar = CookieJar::from_headers(&headers);

        assert_eq!(jar.get("sessionid").map(|c| c.value()), Some("abc123"));
        assert_eq!(jar.get("auth_token").map(|c| c.value()), Some("jwt"));
        assert!(jar.get("missing").is_none());
    }

    #[test]
    fn jar_reads_across_headers_and_decodes_values() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("next=%2Forder%2F1"));
        let jar = CookieJar::from_headers(&headers);

        assert_eq!(jar.get("a").map(|c| c.value()), Some("1"));
        assert_eq!(jar.get("next").map(|c| c.value()), Some("/order/1"));
    }

    #[test]
    fn site_cookie_attributes() {
        let cookie = site_cookie("sessionid", "abc", None, true);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.secure(), Some(true));
        assert!(cookie.max_age().is_none());

        let expired = removal_cookie("auth_token", false);
        assert_eq!(expired.value(), "");
        assert_eq!(expired.max_age(), Some(Duration::ZERO));
        assert_eq!(expired.secure(), Some(false));
    }
}
