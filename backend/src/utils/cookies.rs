//! Session cookies handed to the browser UI alongside the JSON tokens.

use std::time::Duration;

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub secure: bool,
    pub same_site: SameSite,
}

impl From<&Config> for CookieOptions {
    fn from(config: &Config) -> Self {
        Self {
            // Browsers drop SameSite=None cookies that are not Secure.
            secure: config.cookie_secure || config.cookie_same_site == SameSite::None,
            same_site: config.cookie_same_site,
        }
    }
}

pub const ACCESS_COOKIE_NAME: &str = "ld_access";
pub const REFRESH_COOKIE_NAME: &str = "ld_refresh";
pub const ACCESS_COOKIE_PATH: &str = "/";
pub const REFRESH_COOKIE_PATH: &str = "/api/auth";

fn build_cookie(name: &str, value: &str, max_age: Duration, path: &str, options: CookieOptions) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; HttpOnly; SameSite={}",
        name,
        value,
        path,
        max_age.as_secs(),
        options.same_site.as_str()
    );
    if options.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Headers setting both session cookies after login or refresh.
pub fn session_cookie_headers(config: &Config, access_token: &str, refresh_token: &str) -> HeaderMap {
    let options = CookieOptions::from(config);
    let access = build_cookie(
        ACCESS_COOKIE_NAME,
        access_token,
        Duration::from_secs(config.jwt_expiration_hours * 3600),
        ACCESS_COOKIE_PATH,
        options,
    );
    let refresh = build_cookie(
        REFRESH_COOKIE_NAME,
        refresh_token,
        Duration::from_secs(config.refresh_token_expiration_days * 86_400),
        REFRESH_COOKIE_PATH,
        options,
    );
    cookie_headers([access, refresh])
}

/// Headers expiring both session cookies on logout.
pub fn clear_session_cookie_headers(config: &Config) -> HeaderMap {
    let options = CookieOptions::from(config);
    cookie_headers([
        build_cookie(ACCESS_COOKIE_NAME, "", Duration::ZERO, ACCESS_COOKIE_PATH, options),
        build_cookie(REFRESH_COOKIE_NAME, "", Duration::ZERO, REFRESH_COOKIE_PATH, options),
    ])
}

fn cookie_headers(cookies: [String; 2]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for cookie in cookies {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            headers.append(SET_COOKIE, value);
        }
    }
    headers
}

pub fn extract_cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(same_site: &str, secure: &str) -> Config {
        let mut map = HashMap::new();
        map.insert("COOKIE_SAMESITE".to_string(), same_site.to_string());
        map.insert("COOKIE_SECURE".to_string(), secure.to_string());
        Config::from_map(&map).expect("config")
    }

    #[test]
    fn session_cookies_carry_paths_and_lifetimes() {
        let headers = session_cookie_headers(&config("lax", "true"), "acc", "ref");
        let cookies: Vec<&str> = headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies[0].starts_with("ld_access=acc; Path=/;"));
        assert!(cookies[0].contains("Max-Age=3600"));
        assert!(cookies[0].contains("Secure"));
        assert!(cookies[1].starts_with("ld_refresh=ref; Path=/api/auth;"));
        assert!(cookies[1].contains("Max-Age=604800"));
    }

    #[test]
    fn same_site_none_forces_secure() {
        let headers = clear_session_cookie_headers(&config("none", "false"));
        for value in headers.get_all(SET_COOKIE) {
            let cookie = value.to_str().unwrap();
            assert!(cookie.contains("Max-Age=0"));
            assert!(cookie.contains("SameSite=None"));
            assert!(cookie.contains("Secure"));
        }
    }

    #[test]
    fn extract_cookie_value_finds_matching_name() {
        let header = "a=1; ld_access=token-value; b=2";
        assert_eq!(
            extract_cookie_value(header, ACCESS_COOKIE_NAME).as_deref(),
            Some("token-value")
        );
        assert!(extract_cookie_value(header, "missing").is_none());
    }
}
