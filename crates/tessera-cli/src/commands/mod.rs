pub mod init;
pub mod resolve;
pub mod status;
pub mod verify;

use anyhow::Context;
use serde_json::Value;
use std::path::Path;

pub(crate) fn read_json(path: &Path) -> anyhow::Result<Value> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

pub(crate) fn write_json(path: &Path, value: &Value) -> anyhow::Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("writing {}", path.display()))
}
