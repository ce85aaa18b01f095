//! XFCE Desktop Provisioning Wizard
//!
//! A one-shot tool that takes a stock XFCE session and turns it into a
//! themed desktop with a curated panel layout.
//!
//! Core Responsibilities:
//! 1. **Package Management:** Installs panel plugins, themes, and fonts via
//!    pacman or apt (auto-detected).
//! 2. **Asset Fetching:** Shallow-clones the GTK and cursor themes into the
//!    user's ~/.themes and ~/.icons.
//! 3. **Channel Patching:** Edits the xfconf per-channel XML documents
//!    (xsettings, xfwm4, xfce4-panel) through an in-memory batch that lands
//!    in one atomic replace per channel - a run either fully patches a
//!    channel or leaves it untouched.
//! 4. **Safety:** Fail fast. Any failed step aborts the run with a non-zero
//!    exit naming the step; the panel is restarted even on the failure path.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use colored::*;
use inquire::Confirm;

mod assets;
mod daemon;
mod packages;
mod panel;
mod xfconf;

use xfconf::{ChannelPatcher, Property, Scalar};

const GTK_THEME: &str = "Nordic";
const GTK_THEME_REPO: &str = "https://github.com/EliverLara/Nordic.git";
const CURSOR_THEME: &str = "Nordzy-cursors";
const CURSOR_REPO: &str = "https://github.com/alvatip/Nordzy-cursors.git";
const ICON_THEME: &str = "Papirus-Dark";
const UI_FONT: &str = "Inter 10";
const MONO_FONT: &str = "JetBrains Mono 10";

fn main() -> Result<()> {
    println!("{}", "🧙 XFCE Desktop Provisioning Wizard".green().bold());
    println!("Theme: {GTK_THEME} / {ICON_THEME} icons / {CURSOR_THEME} cursor / {UI_FONT}");

    let proceed = Confirm::new("This will reconfigure your XFCE appearance and panel. Continue?")
        .with_default(false)
        .prompt()
        .unwrap_or(false);
    if !proceed {
        println!("Aborted. Nothing was changed.");
        return Ok(());
    }

    // Check sudo access early; 'sudo -v' refreshes the credentials cache so
    // the package step doesn't stall on a password prompt mid-run.
    let status = Command::new("sudo")
        .arg("-v")
        .status()
        .context("Failed to execute sudo")?;
    if !status.success() {
        bail!("Sudo privileges are required.");
    }

    println!("\n{}", "📦 Installing Packages...".blue().bold());
    let pm = packages::PackageManager::detect()?;
    pm.ensure_installed(pm.packages())
        .context("Package installation step failed")?;

    println!("\n{}", "🎨 Fetching Themes...".blue().bold());
    fetch_assets().context("Theme fetch step failed")?;

    let home = dirs::home_dir().context("Cannot find home dir")?;

    println!("\n{}", "🚀 Writing Launcher Entries...".blue().bold());
    panel::write_launcher_entries(&home.join(".config"))
        .context("Launcher entry step failed")?;

    println!("\n{}", "⚙️  Patching XFCE Channels...".blue().bold());
    let channel_dir = home.join(".config/xfce4/xfconf/xfce-perchannel-xml");
    {
        let _hold = daemon::PanelHold::acquire();
        configure_appearance(&channel_dir).context("xsettings patch step failed")?;
        configure_window_manager(&channel_dir).context("xfwm4 patch step failed")?;
        configure_panel(&channel_dir).context("xfce4-panel patch step failed")?;
    }

    println!("\n{}", "✅ Provisioning Complete!".green().bold());
    let should_reboot = Confirm::new("Reboot now to pick everything up cleanly?")
        .with_default(true)
        .prompt()
        .unwrap_or(false);
    if should_reboot {
        let _ = Command::new("sudo").arg("reboot").status();
    }
    Ok(())
}

// --- Main Steps ---

fn fetch_assets() -> Result<()> {
    let home = dirs::home_dir().context("Cannot find home dir")?;

    assets::clone_theme(GTK_THEME_REPO, &home.join(".themes").join(GTK_THEME))?;

    // The cursor repo carries several prebuilt variants; clone it to the
    // cache and install just the one we use.
    let cursor_clone = home.join(".cache/xfce-wizard").join(CURSOR_THEME);
    assets::clone_theme(CURSOR_REPO, &cursor_clone)?;
    let installed = home.join(".icons").join(CURSOR_THEME);
    if !installed.exists() {
        assets::copy_dir(&cursor_clone.join(CURSOR_THEME), &installed)?;
    }
    Ok(())
}

/// xsettings.xml: GTK theme, icon theme, fonts, cursor, font rendering.
fn configure_appearance(channel_dir: &Path) -> Result<()> {
    println!("   🖌️  xsettings...");
    let mut patcher = ChannelPatcher::load(channel_dir.join("xsettings.xml"))?;

    patcher.ensure_scalar("/Net", "ThemeName", Scalar::String(GTK_THEME.into()))?;
    patcher.ensure_scalar("/Net", "IconThemeName", Scalar::String(ICON_THEME.into()))?;

    patcher.ensure_scalar("/Gtk", "FontName", Scalar::String(UI_FONT.into()))?;
    patcher.ensure_scalar("/Gtk", "MonospaceFontName", Scalar::String(MONO_FONT.into()))?;
    patcher.ensure_scalar("/Gtk", "CursorThemeName", Scalar::String(CURSOR_THEME.into()))?;
    patcher.ensure_scalar("/Gtk", "CursorThemeSize", Scalar::Int(24))?;

    // Stock xsettings.xml ships without an Xft section.
    if !patcher.contains("/Xft") {
        patcher.inject_subtree("/", Property::parse_fragment(r#"<property name="Xft" type="empty"/>"#)?)?;
    }
    patcher.ensure_scalar("/Xft", "Antialias", Scalar::Int(1))?;
    patcher.ensure_scalar("/Xft", "HintStyle", Scalar::String("hintslight".into()))?;
    patcher.ensure_scalar("/Xft", "RGBA", Scalar::String("rgb".into()))?;

    patcher.commit()?;
    Ok(())
}

/// xfwm4.xml: window decorations and titlebar font.
fn configure_window_manager(channel_dir: &Path) -> Result<()> {
    println!("   🪟 xfwm4...");
    let mut patcher = ChannelPatcher::load(channel_dir.join("xfwm4.xml"))?;

    patcher.ensure_scalar("/general", "theme", Scalar::String(GTK_THEME.into()))?;
    patcher.ensure_scalar("/general", "title_font", Scalar::String(UI_FONT.into()))?;

    patcher.commit()?;
    Ok(())
}

/// xfce4-panel.xml: panel geometry, the plugin-ids ordering, and one
/// definition fragment per plugin. Injection follows the roster order in
/// panel::PLUGINS, which is the final left-to-right layout.
fn configure_panel(channel_dir: &Path) -> Result<()> {
    println!("   🧰 xfce4-panel...");
    let mut patcher = ChannelPatcher::load(channel_dir.join("xfce4-panel.xml"))?;

    patcher.ensure_scalar("/panels", "dark-mode", Scalar::Bool(true))?;

    let panel_path = format!("/panels/panel-{}", panel::PANEL_ID);
    patcher.ensure_scalar(&panel_path, "position", Scalar::String("p=8;x=0;y=0".into()))?;
    patcher.ensure_scalar(&panel_path, "position-locked", Scalar::Bool(true))?;
    patcher.ensure_scalar(&panel_path, "size", Scalar::Uint(36))?;
    patcher.ensure_scalar(&panel_path, "icon-size", Scalar::Uint(22))?;
    patcher.ensure_scalar(&panel_path, "background-style", Scalar::Uint(1))?;

    // background-rgba is a positional four-double tuple; appending it twice
    // would double the entries, so guard the re-run case.
    if !patcher.contains(&format!("{panel_path}/background-rgba")) {
        patcher.append_array_values(
            &panel_path,
            "background-rgba",
            &[
                Scalar::Double(0.18),
                Scalar::Double(0.2),
                Scalar::Double(0.25),
                Scalar::Double(0.95),
            ],
        )?;
    }

    patcher.replace_list_entries(&format!("{panel_path}/plugin-ids"), &panel::plugin_ids())?;

    for (id, kind) in panel::PLUGINS {
        let slot = format!("/plugins/plugin-{id}");
        if patcher.contains(&slot) {
            // Already defined by an earlier run; keep the user's settings.
            continue;
        }
        let fragment = match panel::launcher_for(*id) {
            Some(launcher) => panel::launcher_fragment(launcher)?,
            None => panel::plugin_fragment(*id, kind)?,
        };
        patcher.inject_subtree("/plugins", fragment)?;
    }

    patcher.commit()?;
    Ok(())
}
