use std::fmt::Write;

use crate::nginx::{ACME_WEBROOT, Nginx, SSL_CIPHERS, SSL_PROTOCOLS};
use crate::postiz::Postiz;

/// A single Nginx directive, either `name args;` or a
/// `name args { ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Simple(String, Vec<String>),
    Block(String, Vec<String>, Vec<Directive>),
}

impl Directive {
    #[must_use]
    pub fn new(name: &str, args: &[&str]) -> Self {
        Self::Simple(name.to_string(), args.iter().map(ToString::to_string).collect())
    }

    #[must_use]
    pub fn block(name: &str, args: &[&str], body: Vec<Self>) -> Self {
        Self::Block(
            name.to_string(),
            args.iter().map(ToString::to_string).collect(),
            body,
        )
    }

    /// A raw `name arg arg` line split on whitespace.
    #[must_use]
    pub fn raw(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default().to_string();
        Self::Simple(name, words.map(ToString::to_string).collect())
    }
}

/// Render the full site configuration: the HTTP redirect, the
/// frontend server and the API server.
#[must_use]
pub fn render(nginx: &Nginx, postiz: &Postiz) -> String {
    let blocks = vec![
        redirect_server(postiz),
        https_server(nginx, postiz, &postiz.domain, postiz.frontend_port),
        https_server(nginx, postiz, &postiz.api_domain(), postiz.backend_port),
    ];
    format(&blocks)
}

/// Format top-level directives with four-space indentation and a
/// blank line between top-level blocks.
#[must_use]
pub fn format(directives: &[Directive]) -> String {
    let mut out = String::new();
    for (i, d) in directives.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        write_directive(&mut out, d, 0);
    }
    out
}

fn write_directive(out: &mut String, directive: &Directive, depth: usize) {
    let indent = "    ".repeat(depth);
    match directive {
        Directive::Simple(name, args) => {
            let _ = writeln!(out, "{indent}{};", join(name, args));
        }
        Directive::Block(name, args, body) => {
            let _ = writeln!(out, "{indent}{} {{", join(name, args));
            let mut prev_block = false;
            for (i, child) in body.iter().enumerate() {
                let is_block = matches!(child, Directive::Block(..));
                if i > 0 && (is_block || prev_block) {
                    out.push('\n');
                }
                write_directive(out, child, depth + 1);
                prev_block = is_block;
            }
            let _ = writeln!(out, "{indent}}}");
        }
    }
}

fn join(name: &str, args: &[String]) -> String {
    let mut parts = vec![name.to_string()];
    parts.extend(args.iter().cloned());
    parts.join(" ")
}

fn redirect_server(postiz: &Postiz) -> Directive {
    let api = postiz.api_domain();
    Directive::block(
        "server",
        &[],
        vec![
            Directive::new("listen", &["80"]),
            Directive::new("listen", &["[::]:80"]),
            Directive::new("server_name", &[&postiz.domain, &api]),
            Directive::block(
                "location",
                &["^~", "/.well-known/acme-challenge/"],
                vec![Directive::new("root", &[ACME_WEBROOT])],
            ),
            Directive::block(
                "location",
                &["/"],
                vec![Directive::new("return", &["301", "https://$host$request_uri"])],
            ),
        ],
    )
}

fn https_server(nginx: &Nginx, postiz: &Postiz, server_name: &str, port: u16) -> Directive {
    // Both names share the certificate issued for the main domain.
    let cert_dir = nginx.cert_dir_for(&postiz.domain);
    let fullchain = format!("{cert_dir}/fullchain.pem");
    let privkey = format!("{cert_dir}/privkey.pem");
    let upstream = format!("http://localhost:{port}");
    let timeout = format!("{}s", nginx.proxy_read_timeout_secs);

    let mut body = vec![
        Directive::new("listen", &["443", "ssl", "http2"]),
        Directive::new("listen", &["[::]:443", "ssl", "http2"]),
        Directive::new("server_name", &[server_name]),
        Directive::new("ssl_certificate", &[&fullchain]),
        Directive::new("ssl_certificate_key", &[&privkey]),
        Directive::new("ssl_protocols", &SSL_PROTOCOLS.split(' ').collect::<Vec<_>>()),
        Directive::new("ssl_ciphers", &[SSL_CIPHERS]),
        Directive::new("ssl_prefer_server_ciphers", &["off"]),
        Directive::new("ssl_session_cache", &["shared:SSL:10m"]),
        Directive::new("ssl_session_timeout", &["1d"]),
        Directive::new("client_max_body_size", &[&nginx.client_max_body_size]),
    ];

    if nginx.hsts {
        body.push(Directive::new(
            "add_header",
            &[
                "Strict-Transport-Security",
                "\"max-age=63072000; includeSubDomains\"",
                "always",
            ],
        ));
    }

    body.extend(nginx.extra_directives.iter().map(|d| Directive::raw(d)));

    body.push(Directive::block(
        "location",
        &["/"],
        vec![
            Directive::new("proxy_pass", &[&upstream]),
            Directive::new("proxy_http_version", &["1.1"]),
            Directive::new("proxy_set_header", &["Upgrade", "$http_upgrade"]),
            Directive::new("proxy_set_header", &["Connection", "\"upgrade\""]),
            Directive::new("proxy_set_header", &["Host", "$host"]),
            Directive::new("proxy_set_header", &["X-Real-IP", "$remote_addr"]),
            Directive::new(
                "proxy_set_header",
                &["X-Forwarded-For", "$proxy_add_x_forwarded_for"],
            ),
            Directive::new("proxy_set_header", &["X-Forwarded-Proto", "$scheme"]),
            Directive::new("proxy_cache_bypass", &["$http_upgrade"]),
            Directive::new("proxy_read_timeout", &[&timeout]),
        ],
    ));

    Directive::block("server", &[], body)
}
