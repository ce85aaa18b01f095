//! Typed access to XFCE's per-channel xfconf XML documents.
//!
//! xfconf stores each channel (xsettings, xfwm4, xfce4-panel, ...) as one
//! XML file under ~/.config/xfce4/xfconf/xfce-perchannel-xml. The files are
//! trees of named, typed properties; child order is significant for the
//! panel channel because it decides the on-screen left-to-right layout.
//!
//! [`ChannelPatcher`] is the write path: load a channel file, apply a batch
//! of edits in memory, then replace the file in a single atomic commit. The
//! consuming processes (xfconfd, xfce4-panel) must not be running while a
//! commit happens; see `daemon::PanelHold`.

mod doc;
mod error;
mod patcher;

pub use doc::{ArrayValue, ChannelDoc, Property, Scalar, ValueType};
pub use error::PatchError;
pub use patcher::ChannelPatcher;
