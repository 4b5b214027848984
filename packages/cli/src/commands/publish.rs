use crate::commands::open_session;
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::DocumentKey;

#[derive(Debug, Args)]
pub struct PublishArgs {}

pub async fn publish(_args: PublishArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = open_session(&config, DocumentKey::Draft).await?;

    println!("{}", "🚀 Publishing draft...".bright_blue().bold());
    let result = store
        .publish_config()
        .await
        .with_context(|| format!("Publish to {} failed", config.server_url));
    store.dispose();
    result?;

    println!("{}", "✅ Site published!".green().bold());
    Ok(())
}
