//! Theme and cursor assets, fetched as shallow git clones.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Shallow-clones `url` into `dest`. A destination that already exists is
/// taken as "already fetched" and skipped, so re-runs stay cheap and never
/// clobber a theme the user has modified.
pub fn clone_theme(url: &str, dest: &Path) -> Result<()> {
    if dest.exists() {
        println!("   ℹ️  {} already present, skipping clone.", dest.display());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let status = Command::new("git")
        .args(["clone", "--depth=1", url])
        .arg(dest)
        .status()
        .context("Failed to execute git")?;
    if !status.success() {
        bail!("Failed to clone {}", url);
    }
    Ok(())
}

/// Recursively copies `src` into `dest`. Used to install a single cursor
/// variant out of a clone that carries several.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read {}", src.display()))?
    {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}
