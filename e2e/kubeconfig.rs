use anyhow::Context;
use qbert::{
    keystone::{Credentials, Keystone},
    Config, Qbert,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let cluster_name = std::env::args().nth(1).context("usage: kubeconfig <cluster-name>")?;

    let username = env("DU_USERNAME")?;
    let password = env("DU_PASSWORD")?;
    let credentials = Credentials::new(env("DU_FQDN")?, &username, password.clone(), env("DU_PROJECT")?);
    let mut keystone = Keystone::new(credentials)?;
    let token = keystone.authenticate().await?;

    let qbert = Qbert::with_config(Config::from_url(&env("QBERT_API_URL")?)?.apply_env()?.with_token(token)?)?;

    info!("Fetching kubeconfig for {}", cluster_name);
    let bearer = qbert.get_kubeconfig_by_name(&cluster_name, None, None).await?;
    let basic = qbert
        .get_kubeconfig_by_name(&cluster_name, Some(&username), Some(&password))
        .await?;
    assert!(!bearer.contains(qbert::core::kubeconfig::TOKEN_PLACEHOLDER));
    assert_ne!(bearer, basic, "credential strategies embed different tokens");

    let master_ip = qbert.get_master_ip_by_name(&cluster_name).await?;
    info!("Cluster {} serves its API on {}", cluster_name, master_ip);
    Ok(())
}
