/// TLS protocols accepted by both HTTPS server blocks.
pub const SSL_PROTOCOLS: &str = "TLSv1.2 TLSv1.3";

/// Fixed cipher list for both HTTPS server blocks.
pub const SSL_CIPHERS: &str = "ECDHE-ECDSA-AES128-GCM-SHA256:ECDHE-RSA-AES128-GCM-SHA256:\
ECDHE-ECDSA-AES256-GCM-SHA384:ECDHE-RSA-AES256-GCM-SHA384:\
ECDHE-ECDSA-CHACHA20-POLY1305:ECDHE-RSA-CHACHA20-POLY1305:\
DHE-RSA-AES128-GCM-SHA256:DHE-RSA-AES256-GCM-SHA384";

pub const SITES_AVAILABLE: &str = "/etc/nginx/sites-available/postiz";
pub const SITES_ENABLED: &str = "/etc/nginx/sites-enabled/postiz";
pub const DEFAULT_SITE: &str = "/etc/nginx/sites-enabled/default";

/// Webroot served on plain HTTP for ACME HTTP-01 challenges.
pub const ACME_WEBROOT: &str = "/var/www/letsencrypt";

/// Configuration for the Nginx reverse proxy in front of the
/// frontend and API containers.
///
/// # Example
///
/// ```
/// use postiz_deploy::Nginx;
///
/// let nginx = Nginx::new()
///     .client_max_body_size("250M")
///     .hsts();
///
/// assert_eq!(nginx.client_max_body_size, "250M");
/// assert!(nginx.hsts);
/// ```
#[derive(Debug, Clone)]
pub struct Nginx {
    /// Directory holding `fullchain.pem` and `privkey.pem`.
    /// Defaults to the Let's Encrypt live directory of the domain.
    pub cert_dir: Option<String>,
    pub client_max_body_size: String,
    pub proxy_read_timeout_secs: u32,
    pub hsts: bool,
    pub extra_directives: Vec<String>,
}

impl Default for Nginx {
    fn default() -> Self {
        Self {
            cert_dir: None,
            client_max_body_size: "100M".to_string(),
            proxy_read_timeout_secs: 300,
            hsts: false,
            extra_directives: Vec::new(),
        }
    }
}

impl Nginx {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn cert_dir(mut self, dir: &str) -> Self {
        self.cert_dir = Some(dir.trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn client_max_body_size(mut self, size: &str) -> Self {
        self.client_max_body_size = size.to_string();
        self
    }

    #[must_use]
    pub const fn proxy_read_timeout_secs(mut self, secs: u32) -> Self {
        self.proxy_read_timeout_secs = secs;
        self
    }

    #[must_use]
    pub const fn hsts(mut self) -> Self {
        self.hsts = true;
        self
    }

    /// Extra raw directive added to both HTTPS server blocks.
    #[must_use]
    pub fn directive(mut self, raw: &str) -> Self {
        self.extra_directives
            .push(raw.trim_end_matches(';').to_string());
        self
    }

    /// Certificate directory for `domain`.
    #[must_use]
    pub fn cert_dir_for(&self, domain: &str) -> String {
        self.cert_dir
            .clone()
            .unwrap_or_else(|| format!("/etc/letsencrypt/live/{domain}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let nginx = Nginx::new();

        assert!(nginx.cert_dir.is_none());
        assert_eq!(nginx.client_max_body_size, "100M");
        assert_eq!(nginx.proxy_read_timeout_secs, 300);
        assert!(!nginx.hsts);
        assert!(nginx.extra_directives.is_empty());
    }

    #[test]
    fn cert_dir_defaults_to_letsencrypt() {
        let nginx = Nginx::new();

        assert_eq!(
            nginx.cert_dir_for("social.dev"),
            "/etc/letsencrypt/live/social.dev"
        );
    }

    #[test]
    fn cert_dir_override() {
        let nginx = Nginx::new().cert_dir("/etc/ssl/postiz/");

        assert_eq!(nginx.cert_dir_for("social.dev"), "/etc/ssl/postiz");
    }

    #[test]
    fn directive_strips_semicolon() {
        let nginx = Nginx::new().directive("access_log off;");

        assert_eq!(nginx.extra_directives, vec!["access_log off"]);
    }
}
