mod common;

use std::time::Duration;

use common::FakeRunner;
use postiz_deploy::deploy::Deployer;
use postiz_deploy::error::DeployError;
use postiz_deploy::{EnvFile, Postiz, Secrets, Vps};

fn postiz() -> Postiz {
    Postiz::new("social.example.com", "ops@example.com")
}

fn secrets() -> Secrets {
    Secrets {
        postgres_password: "pgpass".into(),
        redis_password: "redispass".into(),
        jwt_secret: "jwt+secret/==".into(),
    }
}

const COMPOSE: &str = "docker-compose --project-directory /opt/postiz \
                       -f /opt/postiz/docker-compose.yml \
                       --env-file /opt/postiz/.env.production";

#[test]
fn fresh_install_runs_steps_in_order() {
    let runner = FakeRunner::debian();

    Vps::new()
        .deploy(&runner, &postiz(), &secrets())
        .expect("deploy failed");

    let up = format!("{COMPOSE} up -d --build");
    let ps = format!("{COMPOSE} ps");
    let order: [&str; 19] = [
        "apt-get update",
        "apt-get install -y curl git nginx certbot python3-certbot-nginx",
        "sh -c curl -fsSL https://get.docker.com | sh",
        "chmod +x /usr/local/bin/docker-compose",
        "git clone --branch main https://github.com/gitroomhq/postiz-app.git /opt/postiz",
        "write /opt/postiz/.env.production",
        "chmod 600 /opt/postiz/.env.production",
        "systemctl stop nginx",
        "certbot certonly --standalone",
        "write /etc/nginx/sites-available/postiz",
        "ln -sf /etc/nginx/sites-available/postiz /etc/nginx/sites-enabled/postiz",
        "nginx -t",
        "systemctl restart nginx",
        &up,
        "sleep 30s",
        &ps,
        "write /usr/local/bin/postiz-backup",
        "write /etc/cron.d/postiz-backup",
        "write /opt/postiz/update-postiz.sh",
    ];

    let positions: Vec<usize> = order.iter().map(|step| runner.position(step)).collect();
    assert!(
        positions.windows(2).all(|w| w[0] < w[1]),
        "steps out of order: {:#?}",
        runner.calls()
    );
}

#[test]
fn second_install_skips_installed_tools() {
    let runner = FakeRunner::debian()
        .with_commands(&["docker", "docker-compose", "curl", "git", "nginx", "certbot"]);

    Vps::new()
        .deploy(&runner, &postiz(), &secrets())
        .expect("deploy failed");

    assert!(!runner.called("apt-get"));
    assert!(!runner.called("sh -c curl -fsSL https://get.docker.com"));
    assert!(!runner.called("chmod +x /usr/local/bin/docker-compose"));
    assert!(runner.called("git clone"));
}

#[test]
fn partially_installed_host_installs_only_missing_packages() {
    let runner = FakeRunner::debian().with_commands(&["curl", "git", "docker"]);

    Vps::new()
        .deploy(&runner, &postiz(), &secrets())
        .expect("deploy failed");

    assert!(runner.called("apt-get install -y nginx certbot python3-certbot-nginx"));
    assert!(!runner.called("sh -c curl -fsSL https://get.docker.com"));
    assert!(runner.called("chmod +x /usr/local/bin/docker-compose"));
}

#[test]
fn existing_checkout_is_replaced() {
    let runner = FakeRunner::debian().with_path("/opt/postiz");

    Vps::new()
        .deploy(&runner, &postiz(), &secrets())
        .expect("deploy failed");

    assert!(runner.position("rm -rf /opt/postiz") < runner.position("git clone"));
}

#[test]
fn default_site_is_removed() {
    let runner = FakeRunner::debian().with_path("/etc/nginx/sites-enabled/default");

    Vps::new()
        .deploy(&runner, &postiz(), &secrets())
        .expect("deploy failed");

    assert!(runner.position("rm /etc/nginx/sites-enabled/default") < runner.position("nginx -t"));
}

#[test]
fn env_file_holds_generated_secrets() {
    let runner = FakeRunner::debian();

    Vps::new()
        .deploy(&runner, &postiz(), &secrets())
        .expect("deploy failed");

    let content = runner
        .file("/opt/postiz/.env.production")
        .expect("env file not written");
    let env = EnvFile::parse(&content).expect("parse");
    assert_eq!(env.get("POSTGRES_PASSWORD"), Some("pgpass"));
    assert_eq!(env.get("REDIS_PASSWORD"), Some("redispass"));
    assert_eq!(env.get("JWT_SECRET"), Some("jwt+secret/=="));
    assert_eq!(env.get("FRONTEND_URL"), Some("https://social.example.com"));
}

#[test]
fn certificate_covers_both_names() {
    let runner = FakeRunner::debian();

    Vps::new()
        .deploy(&runner, &postiz(), &secrets())
        .expect("deploy failed");

    let certbot = runner
        .calls()
        .into_iter()
        .find(|c| c.starts_with("certbot"))
        .expect("certbot not called");
    assert!(certbot.contains("--email ops@example.com"));
    assert!(certbot.contains("-d social.example.com -d api.social.example.com"));
    assert!(certbot.contains("--agree-tos"));
    assert!(certbot.contains("--non-interactive"));
}

#[test]
fn invalid_nginx_config_aborts_before_containers() {
    let runner = FakeRunner::debian().failing("nginx -t");

    let err = Vps::new()
        .deploy(&runner, &postiz(), &secrets())
        .unwrap_err();

    assert!(err.to_string().contains("Nginx configuration is invalid"));
    assert!(!runner.called("docker-compose"));
    assert!(!runner.called("systemctl restart nginx"));
}

#[test]
fn clone_failure_stops_everything() {
    let runner = FakeRunner::debian().failing("git clone");

    assert!(Vps::new().deploy(&runner, &postiz(), &secrets()).is_err());
    assert!(!runner.called("write /opt/postiz/.env.production"));
    assert!(!runner.called("certbot"));
}

#[test]
fn startup_wait_is_configurable() {
    let runner = FakeRunner::debian();

    Vps::new()
        .startup_wait(Duration::from_secs(5))
        .deploy(&runner, &postiz(), &secrets())
        .expect("deploy failed");

    assert!(runner.called("sleep 5s"));
    assert!(!runner.called("sleep 30s"));
}

#[test]
fn compose_file_detected_in_checkout() {
    let runner = FakeRunner::debian().with_path("/opt/postiz/docker-compose.yaml");

    Vps::new()
        .deploy(&runner, &postiz().install_dir("/opt/postiz"), &secrets())
        .expect("deploy failed");

    assert!(runner.called(
        "docker-compose --project-directory /opt/postiz -f /opt/postiz/docker-compose.yaml"
    ));
}

#[test]
fn prerequisites_require_apt() {
    let runner = FakeRunner::default().with_output("id -u", "0");

    let err = Vps::new().check_prerequisites(&runner).unwrap_err();

    assert!(matches!(err, DeployError::PrerequisiteMissing(_)));
}

#[test]
fn prerequisites_require_root() {
    let runner = FakeRunner::default()
        .with_commands(&["apt-get"])
        .with_output("id -u", "1000");

    let err = Vps::new().check_prerequisites(&runner).unwrap_err();

    assert!(err.to_string().contains("root"));
}

#[test]
fn prerequisites_pass_for_root_on_debian() {
    let runner = FakeRunner::debian();

    Vps::new()
        .check_prerequisites(&runner)
        .expect("prerequisites failed");
}

#[test]
fn plan_lists_every_step() {
    let plan = Vps::new().plan(&postiz());

    assert_eq!(plan.len(), 9);
    assert!(plan[2].contains("/opt/postiz"));
    assert!(plan[4].contains("api.social.example.com"));
    assert!(plan[7].contains("30s"));
}
