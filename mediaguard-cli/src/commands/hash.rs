//! Hash command implementation.

use std::path::PathBuf;

use anyhow::Result;
use mediaguard_core::ContentHash;
use tracing::debug;

use crate::utils::read_input;

/// Print `<sha3-256 hex>  <path>` for each file, like `sha3sum`.
pub fn execute(files: Vec<PathBuf>) -> Result<()> {
    for file in files {
        let content = read_input(&file)?;
        let hash = ContentHash::from_bytes(&content);
        debug!(path = %file.display(), bytes = content.len(), "Hashed file");
        println!("{}  {}", hash.to_hex(), file.display());
    }
    Ok(())
}
