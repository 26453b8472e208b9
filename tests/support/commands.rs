//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create an addy command with correct environment variables.
    ///
    /// Returns a Command configured with:
    /// - ADDY_CONFIG_DIR and ADDY_REPO_DIR inside the temp dir
    /// - the root check disabled
    /// - colors and logging off
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("addy").expect("failed to find addy binary");
        cmd.env("ADDY_CONFIG_DIR", self.config_dir());
        cmd.env("ADDY_REPO_DIR", self.repo_dir());
        cmd.env("ADDY_SKIP_ROOT_CHECK", "1");
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("ADDY_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Same as `cmd`, with the root check left on.
    pub fn cmd_as_user(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env_remove("ADDY_SKIP_ROOT_CHECK");
        cmd
    }

    /// Shortcut for `addy config set`.
    pub fn config_set(&self, key: &str, value: &str) -> Output {
        self.cmd()
            .args(["config", "set", key, value])
            .output()
            .expect("failed to run addy config set")
    }

    /// Shortcut for `addy config get`.
    pub fn config_get(&self, key: &str) -> Output {
        self.cmd()
            .args(["config", "get", key])
            .output()
            .expect("failed to run addy config get")
    }

    /// Shortcut for `addy config unset`.
    pub fn config_unset(&self, key: &str) -> Output {
        self.cmd()
            .args(["config", "unset", key])
            .output()
            .expect("failed to run addy config unset")
    }

    /// Shortcut for `addy config list`.
    pub fn config_list(&self) -> Output {
        self.cmd()
            .args(["config", "list"])
            .output()
            .expect("failed to run addy config list")
    }

    /// Shortcut for `addy sync`.
    pub fn sync(&self) -> Output {
        self.cmd()
            .arg("sync")
            .output()
            .expect("failed to run addy sync")
    }

    /// Shortcut for `addy list`.
    pub fn list(&self) -> Output {
        self.cmd()
            .arg("list")
            .output()
            .expect("failed to run addy list")
    }

    /// Shortcut for `addy list --json`.
    pub fn list_json(&self) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["list", "--json"])
            .output()
            .expect("failed to run addy list --json");
        assert!(
            output.status.success(),
            "list --json failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("list --json printed invalid JSON")
    }

    /// Shortcut for `addy status`.
    pub fn status(&self, name: &str) -> Output {
        self.cmd()
            .args(["status", name])
            .output()
            .expect("failed to run addy status")
    }

    /// Shortcut for `addy install`.
    pub fn install(&self, packages: &[&str]) -> Output {
        self.cmd()
            .arg("install")
            .args(packages)
            .output()
            .expect("failed to run addy install")
    }

    /// Shortcut for `addy remove`.
    pub fn remove(&self, args: &[&str]) -> Output {
        self.cmd()
            .arg("remove")
            .args(args)
            .output()
            .expect("failed to run addy remove")
    }
}
