//! Package installation through the system package manager.

use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};

// Const for auditing and immutability

const PACMAN_PACKAGES: &[&str] = &[
    // Panel plugins
    "xfce4-whiskermenu-plugin", "xfce4-pulseaudio-plugin", "xfce4-notifyd",
    // Appearance
    "papirus-icon-theme", "inter-font", "ttf-jetbrains-mono",
    // Launcher targets
    "firefox", "thunar", "xfce4-terminal",
    // Asset fetching
    "git",
];

const APT_PACKAGES: &[&str] = &[
    "xfce4-whiskermenu-plugin", "xfce4-pulseaudio-plugin", "xfce4-notifyd",
    "papirus-icon-theme", "fonts-inter", "fonts-jetbrains-mono",
    "firefox-esr", "thunar", "xfce4-terminal",
    "git",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Pacman,
    Apt,
}

impl PackageManager {
    pub fn detect() -> Result<Self> {
        if command_exists("pacman") {
            Ok(PackageManager::Pacman)
        } else if command_exists("apt-get") {
            Ok(PackageManager::Apt)
        } else {
            bail!("No supported package manager found (need pacman or apt-get)")
        }
    }

    pub fn packages(self) -> &'static [&'static str] {
        match self {
            PackageManager::Pacman => PACMAN_PACKAGES,
            PackageManager::Apt => APT_PACKAGES,
        }
    }

    /// Installs `packages`, skipping ones already present. Failure is fatal:
    /// a half-provisioned desktop is worse than an untouched one.
    pub fn ensure_installed(self, packages: &[&str]) -> Result<()> {
        if packages.is_empty() {
            return Ok(());
        }
        let status = match self {
            PackageManager::Pacman => Command::new("sudo")
                .args(["pacman", "-S", "--needed", "--noconfirm"])
                .args(packages)
                .status(),
            PackageManager::Apt => Command::new("sudo")
                .args(["apt-get", "install", "-y"])
                .args(packages)
                .status(),
        }
        .context("Failed to execute the package manager")?;

        if !status.success() {
            bail!("Package installation failed");
        }
        Ok(())
    }
}

fn command_exists(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
