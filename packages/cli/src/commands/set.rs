use crate::commands::open_session;
use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use clap::Args;
use colored::Colorize;
use folio_editor::{overrides::set_override, ConfigDocument, Device, DocumentKey};
use serde_json::Value;

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Dotted path, e.g. `hero.title`
    pub path: String,

    /// New value: any JSON literal, otherwise taken as a string
    pub value: String,

    /// Write a device override instead of the base value
    #[arg(short, long, default_value = "desktop")]
    pub device: Device,
}

/// `42`, `true`, `[1,2]` and `"quoted"` are JSON; anything else is a plain string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn apply(document: &ConfigDocument, path: &str, value: Value, device: Device) -> Result<ConfigDocument> {
    if device == Device::Desktop {
        let mut next = document.clone();
        next.set_path(path, value)?;
        return Ok(next);
    }

    let (section, property) = path
        .split_once('.')
        .filter(|(_, property)| !property.is_empty() && !property.contains('.'))
        .ok_or_else(|| anyhow!("Device overrides take a `section.property` path, got '{}'", path))?;

    Ok(set_override(document, section, device, property, value)?)
}

pub async fn set(args: SetArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let store = open_session(&config, DocumentKey::Draft).await?;

    let value = parse_value(&args.value);
    let next = apply(&store.get_config(), &args.path, value, args.device)?;

    if !store.set_config(next)? {
        println!("{} {} unchanged", "•".dimmed(), args.path);
        store.dispose();
        return Ok(());
    }

    store
        .save_config()
        .await
        .with_context(|| format!("Could not save draft to {}", config.server_url))?;
    store.dispose();

    println!(
        "{} Set {} ({}) and saved draft",
        "✓".green(),
        args.path.bright_white(),
        args.device
    );
    Ok(())
}
