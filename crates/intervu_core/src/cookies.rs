//! crates/intervu_core/src/cookies.rs
//!
//! Explicit cookie contexts for one request/response cycle. The session
//! layer never touches ambient HTTP state; the web layer parses the inbound
//! `Cookie` header into a `RequestCookies` and applies the `ResponseCookies`
//! it gets back as `Set-Cookie` headers.

use std::collections::HashMap;

/// Cookies read from one inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestCookies {
    values: HashMap<String, String>,
}

impl RequestCookies {
    /// Parses a `Cookie` request header. Malformed pairs are skipped.
    pub fn parse(header: Option<&str>) -> Self {
        let mut values = HashMap::new();
        if let Some(header) = header {
            for part in header.split(';') {
                if let Some((name, value)) = part.trim().split_once('=') {
                    values.insert(name.to_string(), value.to_string());
                }
            }
        }
        Self { values }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Cookies to be written onto one outbound response.
#[derive(Debug, Default)]
pub struct ResponseCookies {
    pending: Vec<String>,
}

impl ResponseCookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a scoped cookie. `Secure` is only emitted for production-like
    /// deployments; the remaining attributes are fixed.
    pub fn set(&mut self, name: &str, value: &str, max_age_secs: i64, secure: bool) {
        let secure_attr = if secure { "Secure; " } else { "" };
        self.pending.push(format!(
            "{name}={value}; HttpOnly; {secure_attr}SameSite=Lax; Path=/; Max-Age={max_age_secs}"
        ));
    }

    pub fn headers(&self) -> &[String] {
        &self.pending
    }

    pub fn into_headers(self) -> Vec<String> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_cookies_with_whitespace() {
        let cookies = RequestCookies::parse(Some("theme=dark; session=abc.def.ghi ;x=1"));
        assert_eq!(cookies.get("session"), Some("abc.def.ghi"));
        assert_eq!(cookies.get("theme"), Some("dark"));
        assert_eq!(cookies.get("missing"), None);
    }

    #[test]
    fn absent_header_parses_to_empty() {
        let cookies = RequestCookies::parse(None);
        assert_eq!(cookies.get("session"), None);
    }

    #[test]
    fn set_cookie_renders_fixed_attributes() {
        let mut cookies = ResponseCookies::new();
        cookies.set("session", "tok", 604800, false);
        assert_eq!(
            cookies.headers(),
            &["session=tok; HttpOnly; SameSite=Lax; Path=/; Max-Age=604800".to_string()]
        );
    }

    #[test]
    fn secure_flag_is_conditional() {
        let mut cookies = ResponseCookies::new();
        cookies.set("session", "tok", 60, true);
        assert!(cookies.headers()[0].contains("Secure; "));

        let mut dev_cookies = ResponseCookies::new();
        dev_cookies.set("session", "tok", 60, false);
        assert!(!dev_cookies.headers()[0].contains("Secure"));
    }
}
