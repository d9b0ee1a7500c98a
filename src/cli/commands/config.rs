//! Config command - Configuration management

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use super::super::output::color;
use crate::config::default_path;
use crate::ProjectConfig;

/// Config file management
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Action to perform
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the default config file path
    Path,

    /// Show a config file (default: the default config)
    Show {
        /// Config file
        #[arg(value_name = "PATH")]
        path: Option<String>,
    },

    /// Write a starter config
    Init {
        /// Where to write (default: the default config path)
        #[arg(value_name = "PATH")]
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn target(path: Option<String>) -> Result<PathBuf, String> {
    match path {
        Some(p) => Ok(PathBuf::from(p)),
        None => default_path().map_err(|e| e.to_string()),
    }
}

pub fn run(args: ConfigArgs) -> Result<(), String> {
    match args.action {
        ConfigAction::Path => {
            println!("{}", target(None)?.display());
        }
        ConfigAction::Show { path } => {
            let path = target(path)?;
            if !path.exists() {
                return Err(format!(
                    "Config {} not found (create one with `concord config init`)",
                    path.display()
                ));
            }
            let config = ProjectConfig::load(&path).map_err(|e| e.to_string())?;
            let text = config.to_toml().map_err(|e| e.to_string())?;
            println!("# {}", path.display());
            print!("{}", text);
        }
        ConfigAction::Init { path, force } => {
            let path = target(path)?;
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create config directory: {}", e))?;
            }
            let text = ProjectConfig::sample().to_toml().map_err(|e| e.to_string())?;
            fs::write(&path, text).map_err(|e| format!("Failed to write config: {}", e))?;
            println!("{} Wrote config: {}", color("32", "✓"), path.display());
        }
    }
    Ok(())
}
