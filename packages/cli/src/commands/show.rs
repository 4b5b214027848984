use crate::commands::open_session;
use crate::config::Config;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{Device, DocumentKey};

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Document to read (draft, published)
    #[arg(short, long, default_value = "draft")]
    pub key: DocumentKey,

    /// Resolve overrides for this device (desktop, tablet, mobile)
    #[arg(short, long, default_value = "desktop")]
    pub device: Device,

    /// Only print one section, e.g. `hero`
    #[arg(short, long)]
    pub section: Option<String>,
}

pub async fn show(args: ShowArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = open_session(&config, args.key).await?;

    let effective = store.get_effective_config(args.device);
    store.dispose();

    let output = match &args.section {
        Some(name) => effective
            .section(name)
            .cloned()
            .ok_or_else(|| anyhow!("No section named '{}'", name))?,
        None => effective.into_value(),
    };

    eprintln!(
        "{} {} as seen on {}",
        "📄".bright_blue(),
        args.key.as_str().bright_white(),
        args.device.as_str().bright_white()
    );
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
