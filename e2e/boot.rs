use anyhow::Context;
use qbert::{
    keystone::{Credentials, Keystone},
    Config, Qbert,
};
use tracing_subscriber::EnvFilter;

fn env(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let fqdn = env("DU_FQDN")?;
    let mut credentials = Credentials::new(&fqdn, env("DU_USERNAME")?, env("DU_PASSWORD")?, env("DU_PROJECT")?);
    if let Ok(passcode) = std::env::var("DU_MFA_TOKEN") {
        credentials = credentials.with_mfa_token(passcode);
    }

    let keystone_config = Config::from_url(&credentials.keystone_url())?.apply_env()?;
    let mut keystone = Keystone::with_config(credentials.clone(), keystone_config)?;
    let token = keystone.authenticate().await?;
    let project_id = keystone
        .resolve_project_id(&credentials.project_name)
        .await?
        .with_context(|| format!("project {} is not visible", credentials.project_name))?;
    tracing::info!("Authenticated against project {}", project_id);

    let api_url = std::env::var("QBERT_API_URL").unwrap_or_else(|_| format!("https://{fqdn}/qbert/v4/{project_id}"));
    let config = Config::from_url(&api_url)?.apply_env()?.with_token(token)?;
    let qbert = Qbert::with_config(config)?;
    for (name, cluster) in qbert.list_clusters_by_name().await? {
        tracing::info!("Found cluster {} ({})", name, cluster["uuid"]);
    }
    for (name, node) in qbert.list_nodes_by_name().await? {
        tracing::info!("Found node {} ({})", name, node["uuid"]);
    }
    Ok(())
}
