//! Session commands: login, logout, whoami

use dominus_sdk::ApiClient;

use crate::output::{self, OutputFormat};

pub async fn login(client: &ApiClient, username: &str, password: &str) -> anyhow::Result<()> {
    let session = client.login(username, password).await?;
    let display_name = session
        .user
        .as_ref()
        .and_then(|u| u.user_name.clone().or_else(|| u.name.clone()))
        .unwrap_or_else(|| username.to_string());
    output::success(&format!("logged in as {display_name}"));
    Ok(())
}

pub fn logout(client: &ApiClient) -> anyhow::Result<()> {
    client.logout();
    output::success("logged out");
    Ok(())
}

pub async fn whoami(client: &ApiClient, format: OutputFormat) -> anyhow::Result<()> {
    let user = client.userinfo().await?;
    output::print(&serde_json::to_value(&user)?, format);
    Ok(())
}
