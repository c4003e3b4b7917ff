use serde::Deserialize;

use super::load_toml;
use crate::errors::ConfigResult;

/// `board.toml`: board identity, table sizes, streaming and host link settings
#[derive(Debug, Clone, Deserialize)]
pub struct BoardConfig {
    pub board: BoardSection,
    #[serde(default)]
    pub stream: StreamSection,
    pub link: LinkSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BoardSection {
    pub name: String,
    /// Motion table size; the number of motion sensors when absent
    pub motion_instances: Option<usize>,
    /// Env table size; the number of env sensors when absent
    pub env_instances: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamSection {
    pub period_ms: u64,
}

impl Default for StreamSection {
    fn default() -> Self {
        Self { period_ms: 100 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Serial,
    Stdio,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkSection {
    #[serde(rename = "type")]
    pub kind: LinkKind,
    pub path: Option<String>,
    pub baud: Option<u32>,
}

pub fn load_board_config(path: &str) -> ConfigResult<BoardConfig> {
    load_toml(path)
}
