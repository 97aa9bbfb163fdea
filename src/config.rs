use anyhow::Result;
use anyhow::bail;

/// Fallback branch name when a remote has no branches at all.
pub const DEFAULT_BRANCH: &str = "main";

#[derive(Debug, Clone)]
pub struct Config {
    /// Retry a rejected push as a force push.
    pub allow_force_push: bool,
    /// Branch used when a remote declares none, and the base synthesized for new branches.
    pub default_branch: String,
}

impl Config {
    /// Load config from git config, falling back to defaults for unset keys
    pub fn load() -> Result<Self> {
        let allow_force_push = match read_key("stagepush.allowForcePush")? {
            Some(value) => parse_bool(&value)?,
            None => true,
        };
        let default_branch =
            read_key("stagepush.defaultBranch")?.unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        Ok(Self {
            allow_force_push,
            default_branch,
        })
    }

    /// Create a new config with explicit values (useful for tests)
    pub fn new(allow_force_push: bool, default_branch: String) -> Self {
        Self {
            allow_force_push,
            default_branch,
        }
    }

    /// Default config for tests
    pub fn default_for_tests() -> Self {
        Self {
            allow_force_push: true,
            default_branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

fn read_key(key: &str) -> Result<Option<String>> {
    let output = std::process::Command::new("git")
        .args(["config", "--get", key])
        .output()?;

    // Exit code 1 means the key is not set
    match output.status.code() {
        Some(0) => Ok(Some(String::from_utf8(output.stdout)?.trim().to_string())),
        Some(1) => Ok(None),
        _ => bail!(
            "git config --get {} failed: {}",
            key,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
    }
}

/// Parse a boolean the way git config spells them.
fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        other => bail!("Invalid boolean value in git config: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for_tests() {
        let config = Config::default_for_tests();
        assert!(config.allow_force_push);
        assert_eq!(config.default_branch, "main");
    }

    #[test]
    fn test_new() {
        let config = Config::new(false, "trunk".to_string());
        assert!(!config.allow_force_push);
        assert_eq!(config.default_branch, "trunk");
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("Yes").unwrap());
        assert!(!parse_bool("off").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
