use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Backend URL
    #[arg(short, long)]
    pub server_url: Option<String>,

    /// Milliseconds of inactivity before a draft is saved
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Folio project...".bright_blue().bold());

    let mut config = Config::default();
    if let Some(url) = args.server_url {
        config.server_url = url;
    }
    if let Some(ms) = args.debounce_ms {
        config.editor.debounce = std::time::Duration::from_millis(ms);
    }

    // Write config file
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Start the backend: folio-server --token <TOKEN>");
    println!("  2. export FOLIO_TOKEN=<TOKEN>");
    println!("  3. Run: folio set hero.title \"Hello\"");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(dir: &TempDir, server_url: &str, force: bool) {
        let args = InitArgs {
            server_url: Some(server_url.to_string()),
            debounce_ms: Some(1000),
            force,
        };
        init(args, dir.path().to_str().unwrap()).unwrap();
    }

    fn written(dir: &TempDir) -> Config {
        let content = fs::read_to_string(dir.path().join(DEFAULT_CONFIG_NAME)).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    #[test]
    fn test_init_writes_config() {
        let dir = TempDir::new().unwrap();
        run(&dir, "http://cms.local", false);

        let config = written(&dir);
        assert_eq!(config.server_url, "http://cms.local");
        assert_eq!(config.editor.debounce.as_millis(), 1000);
        assert_eq!(config.token, None);
    }

    #[test]
    fn test_init_keeps_existing_without_force() {
        let dir = TempDir::new().unwrap();
        run(&dir, "http://first", false);
        run(&dir, "http://second", false);
        assert_eq!(written(&dir).server_url, "http://first");

        run(&dir, "http://second", true);
        assert_eq!(written(&dir).server_url, "http://second");
    }
}
