//! Scoped hold on the processes that own the channel files.
//!
//! xfconfd writes channels back on its own schedule and xfce4-panel keeps
//! its channel open, so editing the files while either runs means one side's
//! writes get lost. Both are stopped for the duration of the patch run; the
//! panel is restarted when the hold drops, on success and failure paths
//! alike, so a failed run never leaves the desktop without its panel.

use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

pub struct PanelHold {
    restart_panel: bool,
}

impl PanelHold {
    pub fn acquire() -> Self {
        println!("   ⏸️  Stopping xfce4-panel and xfconfd...");
        // --quit fails when no panel is running (e.g. provisioning over SSH);
        // in that case there is nothing to restart either.
        let panel_was_running = Command::new("xfce4-panel")
            .arg("--quit")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        let _ = Command::new("pkill")
            .arg("xfconfd")
            .stderr(Stdio::null())
            .status();

        // Let both processes flush and exit before their files are edited.
        thread::sleep(Duration::from_millis(500));

        PanelHold { restart_panel: panel_was_running }
    }
}

impl Drop for PanelHold {
    fn drop(&mut self) {
        // xfconfd is D-Bus activated and comes back on its own.
        if self.restart_panel {
            println!("   ▶️  Restarting xfce4-panel...");
            let _ = Command::new("xfce4-panel")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
        }
    }
}
