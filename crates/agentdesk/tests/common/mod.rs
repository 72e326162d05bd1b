//! Common test utilities for agentdesk integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated home directory for one test
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".agentdesk");

        Ok(Self { temp_dir, data_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn session_file(&self, name: &str) -> PathBuf {
        self.data_dir.join("interactions").join(format!("{}.jsonl", name))
    }

    /// Command running offline against this home directory
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_agentdesk"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("OPENAI_API_KEY");
        cmd.env_remove("OPENAI_BASE_URL");
        cmd.env_remove("AGENTDESK_MODEL");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Write a config file with the given JSON
    pub fn write_config(&self, json: &str) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::write(self.config_file(), json)?;
        Ok(())
    }
}
