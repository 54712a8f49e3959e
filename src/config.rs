use std::env;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub stripe_secret_key: String,
    pub stripe_publishable_key: String,
    pub stripe_api_base: String,
    pub debug: bool,
    pub allowed_hosts: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET is not set"))?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);

        let stripe_secret_key = env::var("STRIPE_SECRET_KEY").unwrap_or_default();
        if stripe_secret_key.is_empty() {
            tracing::warn!("STRIPE_SECRET_KEY is not set; checkout will be rejected by the processor");
        }
        let stripe_publishable_key = env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default();
        let stripe_api_base =
            env::var("STRIPE_API_BASE").unwrap_or_else(|_| DEFAULT_STRIPE_API_BASE.to_string());

        let debug = env::var("DEBUG")
            .ok()
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let allowed_hosts = env::var("ALLOWED_HOSTS")
            .map(|v| parse_host_list(&v))
            .unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            stripe_secret_key,
            stripe_publishable_key,
            stripe_api_base,
            debug,
            allowed_hosts,
        })
    }

    /// Whether a request addressed to `host` (port already stripped) may be served.
    ///
    /// An empty allow-list admits any host in debug mode and only loopback
    /// names otherwise.
    pub fn host_allowed(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        if self.allowed_hosts.is_empty() {
            return self.debug || matches!(host.as_str(), "localhost" | "127.0.0.1" | "[::1]");
        }
        self.allowed_hosts.iter().any(|allowed| {
            if allowed == "*" {
                return true;
            }
            match allowed.strip_prefix('.') {
                Some(domain) => host == domain || host.ends_with(allowed.as_str()),
                None => host == *allowed,
            }
        })
    }
}

pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_host_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(debug: bool, hosts: &[&str]) -> AppConfig {
        AppConfig {
            database_url: String::new(),
            host: "127.0.0.1".into(),
            port: 3000,
            jwt_secret: "secret".into(),
            stripe_secret_key: String::new(),
            stripe_publishable_key: String::new(),
            stripe_api_base: DEFAULT_STRIPE_API_BASE.into(),
            debug,
            allowed_hosts: hosts.iter().map(|h| h.to_string()).collect(),
        }
    }

    #[test]
    fn flags_accept_common_spellings() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" 1 "));
        assert!(parse_flag("Yes"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn host_list_is_trimmed_and_lowercased() {
        assert_eq!(
            parse_host_list(" Shop.Example.com, ,.example.org"),
            vec!["shop.example.com".to_string(), ".example.org".to_string()]
        );
    }

    #[test]
    fn empty_allow_list_depends_on_debug() {
        assert!(config(true, &[]).host_allowed("shop.example.com"));
        assert!(!config(false, &[]).host_allowed("shop.example.com"));
        assert!(config(false, &[]).host_allowed("localhost"));
    }

    #[test]
    fn allow_list_matches_exact_wildcard_and_subdomains() {
        let cfg = config(false, &["shop.example.com", ".example.org"]);
        assert!(cfg.host_allowed("shop.example.com"));
        assert!(cfg.host_allowed("SHOP.example.com"));
        assert!(cfg.host_allowed("example.org"));
        assert!(cfg.host_allowed("www.example.org"));
        assert!(!cfg.host_allowed("evil.com"));
        assert!(config(false, &["*"]).host_allowed("anything.test"));
    }
}
