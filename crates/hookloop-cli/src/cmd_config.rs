use clap::Subcommand;
use hookloop_bridge::Settings;
use hookloop_store::{config_value, parse_value, read_config, write_config, ProjectPaths};

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Set a config value
    Set {
        /// Config key (e.g. loop.max_iterations)
        key: String,
        /// Config value (true/false/number/string)
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List stored values and the effective settings
    List,
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd, paths: &ProjectPaths) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Set { key, value } => set(paths, &key, &value),
        ConfigCmd::Get { key } => get(paths, &key),
        ConfigCmd::List => list(paths),
    }
}

// ── Command Implementations ──

/// `hookloop config set <key> <value>`
pub fn set(paths: &ProjectPaths, key: &str, value: &str) -> anyhow::Result<()> {
    if key.trim().is_empty() {
        anyhow::bail!("Config key must not be empty");
    }
    let mut config = read_config(&paths.config_json)?;
    config.insert(key.to_string(), parse_value(value));
    write_config(&paths.config_json, &config)?;
    println!("{key} = {value}");
    Ok(())
}

/// `hookloop config get <key>`
pub fn get(paths: &ProjectPaths, key: &str) -> anyhow::Result<()> {
    match config_value(paths, key) {
        Some(val) => println!("{val}"),
        None => println!("(not set)"),
    }
    Ok(())
}

/// `hookloop config list`
pub fn list(paths: &ProjectPaths) -> anyhow::Result<()> {
    let config = read_config(&paths.config_json)?;
    if config.is_empty() {
        println!("(no config set)");
    } else {
        for (k, v) in &config {
            println!("{k} = {v}");
        }
    }
    let effective = Settings::resolve(paths);
    println!(
        "effective: max_iterations={} task_chars={}",
        effective.max_iterations, effective.task_chars
    );
    Ok(())
}
