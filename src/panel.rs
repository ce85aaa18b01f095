//! The panel layout this wizard installs: plugin roster, launcher entries,
//! and the XML fragments that define each plugin inside xfce4-panel.xml.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::xfconf::{PatchError, Property, Scalar};

pub const PANEL_ID: u32 = 1;

/// Left-to-right plugin roster. Plugin ids are caller-assigned and must stay
/// unique across the whole channel; launchers use the 3000 range so their
/// item directories under ~/.config/xfce4/panel are easy to spot.
/// Fragments must be injected in this order.
pub const PLUGINS: &[(u32, &str)] = &[
    (1, "whiskermenu"),
    (2, "separator"),
    (3001, "launcher"),
    (3002, "launcher"),
    (3003, "launcher"),
    (4, "separator"),
    (5, "tasklist"),
    (6, "separator"),
    (7, "systray"),
    (8, "pulseaudio"),
    (9, "clock"),
    (10, "actions"),
];

/// A launcher plugin: one clickable panel icon backed by a .desktop entry
/// file. Only the reference is recorded in the channel; the entry body is
/// written separately by [`write_launcher_entries`].
pub struct Launcher {
    pub id: u32,
    pub entry_file: &'static str,
    pub entry_body: &'static str,
}

pub const LAUNCHERS: &[Launcher] = &[
    Launcher { id: 3001, entry_file: "firefox.desktop", entry_body: FIREFOX_ENTRY },
    Launcher { id: 3002, entry_file: "thunar.desktop", entry_body: THUNAR_ENTRY },
    Launcher { id: 3003, entry_file: "xfce4-terminal.desktop", entry_body: TERMINAL_ENTRY },
];

const FIREFOX_ENTRY: &str = "\
[Desktop Entry]
Version=1.0
Type=Application
Name=Firefox
Exec=firefox %u
Icon=firefox
Categories=Network;WebBrowser;
";

const THUNAR_ENTRY: &str = "\
[Desktop Entry]
Version=1.0
Type=Application
Name=File Manager
Exec=thunar %F
Icon=org.xfce.filemanager
Categories=System;FileManager;
";

const TERMINAL_ENTRY: &str = "\
[Desktop Entry]
Version=1.0
Type=Application
Name=Terminal
Exec=xfce4-terminal
Icon=org.xfce.terminal
Categories=System;TerminalEmulator;
";

pub fn launcher_for(id: u32) -> Option<&'static Launcher> {
    LAUNCHERS.iter().find(|l| l.id == id)
}

/// The plugin-ids list in roster order.
pub fn plugin_ids() -> Vec<Scalar> {
    PLUGINS.iter().map(|(id, _)| Scalar::Int(*id as i64)).collect()
}

/// Definition fragment for a launcher plugin: the plugin node plus its
/// ordered items array referencing the entry file.
pub fn launcher_fragment(launcher: &Launcher) -> Result<Property, PatchError> {
    let xml = format!(
        r#"<property name="plugin-{id}" type="string" value="launcher">
  <property name="items" type="array">
    <value type="string" value="{entry}"/>
  </property>
</property>"#,
        id = launcher.id,
        entry = launcher.entry_file,
    );
    Property::parse_fragment(&xml)
}

/// Definition fragment for a non-launcher plugin. Kinds without settings of
/// their own get a bare plugin node.
pub fn plugin_fragment(id: u32, kind: &str) -> Result<Property, PatchError> {
    let xml = match kind {
        "whiskermenu" => format!(
            r#"<property name="plugin-{id}" type="string" value="whiskermenu">
  <property name="button-title" type="string" value="Applications"/>
  <property name="show-button-icon" type="bool" value="true"/>
  <property name="menu-width" type="int" value="450"/>
  <property name="menu-height" type="int" value="500"/>
</property>"#
        ),
        "separator" => format!(
            r#"<property name="plugin-{id}" type="string" value="separator">
  <property name="style" type="uint" value="0"/>
  <property name="expand" type="bool" value="false"/>
</property>"#
        ),
        "tasklist" => format!(
            r#"<property name="plugin-{id}" type="string" value="tasklist">
  <property name="grouping" type="uint" value="1"/>
  <property name="flat-buttons" type="bool" value="true"/>
  <property name="show-labels" type="bool" value="true"/>
</property>"#
        ),
        "clock" => format!(
            r#"<property name="plugin-{id}" type="string" value="clock">
  <property name="mode" type="uint" value="2"/>
  <property name="digital-time-format" type="string" value="%a %d %b  %H:%M"/>
</property>"#
        ),
        "actions" => format!(
            r#"<property name="plugin-{id}" type="string" value="actions">
  <property name="appearance" type="uint" value="0"/>
</property>"#
        ),
        other => format!(r#"<property name="plugin-{id}" type="string" value="{other}"/>"#),
    };
    Property::parse_fragment(&xml)
}

/// Writes the .desktop entry files the launcher plugins reference, under
/// ~/.config/xfce4/panel/launcher-<id>/. Existing entries are left alone so
/// user edits survive a re-run.
pub fn write_launcher_entries(config_dir: &Path) -> Result<()> {
    for launcher in LAUNCHERS {
        let dir = config_dir.join(format!("xfce4/panel/launcher-{}", launcher.id));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create launcher dir {}", dir.display()))?;
        let entry = dir.join(launcher.entry_file);
        if !entry.exists() {
            fs::write(&entry, launcher.entry_body)
                .with_context(|| format!("Failed to write {}", entry.display()))?;
        }
    }
    Ok(())
}
