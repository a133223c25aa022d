use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.stackexchange.com/2.3/";
const DEFAULT_SITE: &str = "stackoverflow";
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_CONNECTIVITY_INTERVAL_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime settings, read from the environment (and `.env`) at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub site: String,
    pub page_size: u32,
    pub db_path: PathBuf,
    pub connectivity_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut base_url = lookup("STACK_SEARCH_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        // Endpoint paths are joined relative to the base
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        let page_size = parse_or(&lookup, "STACK_SEARCH_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
        if !(1..=100).contains(&page_size) {
            bail!("STACK_SEARCH_PAGE_SIZE must be between 1 and 100, got {}", page_size);
        }

        let db_path = match lookup("STACK_SEARCH_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => Self::default_db_path()?,
        };

        Ok(Self {
            base_url,
            api_key: lookup("STACK_EXCHANGE_API_KEY").unwrap_or_default(),
            site: lookup("STACK_SEARCH_SITE").unwrap_or_else(|| DEFAULT_SITE.to_string()),
            page_size,
            db_path,
            connectivity_interval: Duration::from_secs(parse_or(
                &lookup,
                "STACK_SEARCH_CONNECTIVITY_INTERVAL_SECS",
                DEFAULT_CONNECTIVITY_INTERVAL_SECS,
            )?),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "STACK_SEARCH_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let home_dir = dirs_next::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home_dir.join(".stack_search").join("cache.db"))
    }

    /// Web host of the configured site. The API takes either a short site
    /// name or the full domain.
    pub fn site_host(&self) -> String {
        let site = self.site.trim().to_lowercase();
        if site.ends_with(".com") || site.ends_with(".net") {
            return site;
        }
        let (is_meta, name) = match site.strip_prefix("meta.") {
            Some(name) => (true, name),
            None => (false, site.as_str()),
        };
        match name {
            "stackoverflow" | "serverfault" | "superuser" | "askubuntu" | "stackapps" => format!("{}.com", site),
            "mathoverflow" => format!("{}.net", site),
            _ if is_meta => format!("{}.meta.stackexchange.com", name),
            _ => format!("{}.stackexchange.com", name),
        }
    }

    /// Fallback web address of a question, for rows cached without a link.
    pub fn question_url(&self, question_id: i64) -> String {
        format!("https://{}/q/{}", self.site_host(), question_id)
    }

    pub fn site_search_url(&self, query: &str) -> String {
        format!("https://{}/search?q={}", self.site_host(), urlencoding::encode(query))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[("STACK_SEARCH_DB_PATH", "/tmp/cache.db")]).unwrap();
        assert_eq!(config.base_url, "https://api.stackexchange.com/2.3/");
        assert_eq!(config.site, "stackoverflow");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.api_key, "");
        assert_eq!(config.db_path, PathBuf::from("/tmp/cache.db"));
        assert_eq!(config.connectivity_interval, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = config_from(&[
            ("STACK_SEARCH_DB_PATH", "cache.db"),
            ("STACK_SEARCH_BASE_URL", "http://localhost:8080/2.3"),
        ])
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/2.3/");
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(config_from(&[("STACK_SEARCH_DB_PATH", "x"), ("STACK_SEARCH_PAGE_SIZE", "lots")]).is_err());
        assert!(config_from(&[("STACK_SEARCH_DB_PATH", "x"), ("STACK_SEARCH_PAGE_SIZE", "0")]).is_err());
        assert!(config_from(&[("STACK_SEARCH_DB_PATH", "x"), ("STACK_SEARCH_PAGE_SIZE", "101")]).is_err());
    }

    #[test]
    fn share_links_use_site() {
        let config = config_from(&[("STACK_SEARCH_DB_PATH", "x"), ("STACK_SEARCH_SITE", "superuser")]).unwrap();
        assert_eq!(config.question_url(42), "https://superuser.com/q/42");
        assert_eq!(
            config.site_search_url("rust & c++"),
            "https://superuser.com/search?q=rust%20%26%20c%2B%2B"
        );
    }

    #[test]
    fn stackexchange_sites_get_their_subdomain() {
        let config = config_from(&[("STACK_SEARCH_DB_PATH", "x"), ("STACK_SEARCH_SITE", "math")]).unwrap();
        assert_eq!(config.question_url(42), "https://math.stackexchange.com/q/42");
        assert_eq!(config.site_search_url("ring"), "https://math.stackexchange.com/search?q=ring");
    }

    #[test]
    fn site_host_variants() {
        let host = |site: &str| {
            config_from(&[("STACK_SEARCH_DB_PATH", "x"), ("STACK_SEARCH_SITE", site)])
                .unwrap()
                .site_host()
        };
        assert_eq!(host("stackoverflow"), "stackoverflow.com");
        assert_eq!(host("mathoverflow"), "mathoverflow.net");
        assert_eq!(host("meta.stackoverflow"), "meta.stackoverflow.com");
        assert_eq!(host("meta.math"), "math.meta.stackexchange.com");
        assert_eq!(host("unix.stackexchange.com"), "unix.stackexchange.com");
    }
}
