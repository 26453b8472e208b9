//! Config commands.

use crate::cli::{host, output};
use crate::core::config::{Config, ConfigKey};
use crate::error::{ConfigError, Result};

/// Set a configuration value.
pub fn set(key: &str, value: &str) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    host::require_root()?;

    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    output::success(&format!("{} = {}", key, value.trim()));
    if key == ConfigKey::SshKeyPath {
        if let Err(e) = config.validate() {
            output::warn(&e.to_string());
        }
    }
    Ok(())
}

/// Print a configuration value. Unset keys fail.
pub fn get(key: &str) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    let config = Config::load()?;

    match (config.get(key), key) {
        (Some(value), _) => output::data(&value),
        (None, ConfigKey::GitBranch) => output::data(config.branch()),
        (None, _) => return Err(ConfigError::MissingValue(key.as_str()).into()),
    }
    Ok(())
}

/// Clear a configuration value.
pub fn unset(key: &str) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    host::require_root()?;

    let mut config = Config::load()?;
    if config.unset(key) {
        config.save()?;
        output::success(&format!("{} unset", key));
    } else {
        output::dimmed(&format!("{} was not set", key));
    }
    Ok(())
}

/// Print every configured value.
pub fn list() -> Result<()> {
    let config = Config::load()?;
    let entries = config.list();

    if entries.is_empty() {
        output::dimmed("no configuration");
        output::hint(&format!("run: {}", output::cmd("addy config set git-repo <url>")));
        return Ok(());
    }

    for (key, value) in entries {
        output::data(&format!("{} = {}", key, value));
    }
    Ok(())
}
