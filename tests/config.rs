use std::path::Path;

use postiz_deploy::{Config, Pipeline};
use postiz_deploy::error::DeployError;

const FULL: &str = "\
domain: social.example.com
email: ops@example.com
install_dir: /srv/postiz/
repository: https://github.com/example/postiz-app.git
branch: stable
frontend_port: 5000
backend_port: 5001
upload_dir: /data/uploads
backup_dir: /srv/backups/
railway:
  backend_service: api
  frontend_service: web
";

#[test]
fn full_config() {
    let config = Config::from_yaml(FULL).expect("parse");

    assert_eq!(config.domain.as_deref(), Some("social.example.com"));
    assert_eq!(config.frontend_port, Some(5000));
    assert_eq!(config.railway.backend_service.as_deref(), Some("api"));
}

#[test]
fn empty_config_is_default() {
    assert_eq!(Config::from_yaml("").expect("parse"), Config::default());
    assert_eq!(Config::from_yaml("\n  \n").expect("parse"), Config::default());
}

#[test]
fn unknown_field_is_rejected() {
    let err = Config::from_yaml("domian: social.example.com\n").unwrap_err();

    assert!(matches!(err, DeployError::Yaml(_)));
    assert!(err.to_string().contains("domian"));
}

#[test]
fn overrides_apply_to_installation() {
    let config = Config::from_yaml(FULL).expect("parse");

    let postiz = config.postiz("social.example.com", "ops@example.com");

    assert_eq!(postiz.install_dir, "/srv/postiz");
    assert_eq!(postiz.repository, "https://github.com/example/postiz-app.git");
    assert_eq!(postiz.branch, "stable");
    assert_eq!(postiz.frontend_port, 5000);
    assert_eq!(postiz.backend_port, 5001);
    assert_eq!(postiz.upload_dir, "/data/uploads");
    assert_eq!(config.backup_settings().dir, "/srv/backups");

    let railway = config.railway();
    assert_eq!(railway.backend_service, "api");
    assert_eq!(railway.frontend_service, "web");
}

#[test]
fn defaults_without_overrides() {
    let postiz = Config::default().postiz("social.example.com", "ops@example.com");

    assert_eq!(postiz.install_dir, "/opt/postiz");
    assert_eq!(postiz.branch, "main");
    assert_eq!(Config::default().backup_settings().dir, "/opt/postiz-backups");
    assert_eq!(Config::default().railway().backend_service, "postiz-backend");
}

#[test]
fn missing_file() {
    let err = Config::load(Path::new("/nonexistent/postiz.yaml")).unwrap_err();

    assert!(matches!(err, DeployError::FileNotFound(_)));
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("postiz.yaml");
    std::fs::write(&path, "domain: social.example.com\nbranch: stable\n").expect("write");

    let config = Config::load(&path).expect("load");

    assert_eq!(config.domain.as_deref(), Some("social.example.com"));
    assert_eq!(config.branch.as_deref(), Some("stable"));
}

#[test]
fn invalid_file_names_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("postiz.yaml");
    std::fs::write(&path, "frontend_port: not-a-port\n").expect("write");

    let err = Config::load(&path).unwrap_err();

    assert!(matches!(err, DeployError::Config(_)));
    assert!(err.to_string().contains("postiz.yaml"));
}

const PROXY: &str = "\
nginx:
  cert_dir: /etc/ssl/postiz/
  client_max_body_size: 1G
  proxy_read_timeout_secs: 60
  hsts: true
  directives:
    - access_log off;
retention:
  compress_after_days: 2
  delete_after_days: 14
";

#[test]
fn proxy_and_retention_sections() {
    let config = Config::from_yaml(PROXY).expect("parse");

    let nginx = config.nginx();
    assert_eq!(nginx.cert_dir.as_deref(), Some("/etc/ssl/postiz"));
    assert_eq!(nginx.client_max_body_size, "1G");
    assert_eq!(nginx.proxy_read_timeout_secs, 60);
    assert!(nginx.hsts);
    assert_eq!(nginx.extra_directives, vec!["access_log off"]);

    let retention = config.backup_settings().retention;
    assert_eq!(retention.compress_after_days, 2);
    assert_eq!(retention.delete_after_days, 14);
}

#[test]
fn pipeline_uses_configured_proxy() {
    let config = Config::from_yaml(PROXY).expect("parse");

    let vps = Pipeline::new(config).vps();

    assert_eq!(vps.nginx.client_max_body_size, "1G");
    assert!(vps.nginx.hsts);
    assert_eq!(vps.backup.retention.delete_after_days, 14);
}

#[test]
fn proxy_defaults_without_section() {
    let nginx = Config::default().nginx();

    assert!(nginx.cert_dir.is_none());
    assert_eq!(nginx.client_max_body_size, "100M");
    assert!(!nginx.hsts);
}

#[test]
fn unknown_nginx_field_is_rejected() {
    let err = Config::from_yaml("nginx:\n  max_body: 1G\n").unwrap_err();

    assert!(err.to_string().contains("max_body"));
}
