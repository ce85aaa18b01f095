use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::doc::{ArrayValue, ChannelDoc, Property, Scalar, ValueType};
use super::error::PatchError;

/// Applies a batch of structural edits to one channel document.
///
/// All edits happen on the in-memory tree; nothing touches the disk until
/// [`commit`](ChannelPatcher::commit), which replaces the target atomically.
/// The file is therefore either left exactly as it was or swapped wholesale
/// for the fully edited version, never something in between. Edits apply in
/// call order, and for plugin definitions call order is the final
/// left-to-right panel order.
#[derive(Debug)]
pub struct ChannelPatcher {
    target: PathBuf,
    doc: ChannelDoc,
}

impl ChannelPatcher {
    /// Loads the channel file at `target`. The file must already exist and
    /// be well-formed; the patcher never creates a channel from scratch.
    pub fn load(target: impl Into<PathBuf>) -> Result<Self, PatchError> {
        let target = target.into();
        let xml = fs::read_to_string(&target).map_err(PatchError::Read)?;
        let doc = ChannelDoc::parse(&xml)?;
        Ok(ChannelPatcher { target, doc })
    }

    /// Whether a property exists at `path`. Lets callers guard the
    /// non-idempotent edits ([`append_array_values`](Self::append_array_values),
    /// repeated subtree injection) so a whole provisioning run can be
    /// re-executed safely.
    pub fn contains(&self, path: &str) -> bool {
        self.doc.resolve(path).is_some()
    }

    /// Creates or overwrites the scalar child `name` under the node at
    /// `path`. Existing children keep their position; a new child is
    /// appended after its siblings. Idempotent for fixed arguments.
    pub fn ensure_scalar(&mut self, path: &str, name: &str, value: Scalar) -> Result<(), PatchError> {
        let node = self.resolve_mut(path)?;
        match node.child_mut(name) {
            Some(existing) => {
                existing.ty = value.ty();
                existing.value = Some(value.render());
            }
            None => node.children.push(Property::scalar(name, &value)),
        }
        Ok(())
    }

    /// Appends positional `<value>` entries to the array child `name` under
    /// `path`, creating the array property if it does not exist. Used for
    /// fixed-arity tuples such as an RGBA color expressed as four doubles:
    /// the store has no named slots for tuple elements, so this is a raw
    /// append and NOT idempotent. Re-running it doubles the entries; callers
    /// must guard with [`contains`](Self::contains).
    pub fn append_array_values(
        &mut self,
        path: &str,
        name: &str,
        values: &[Scalar],
    ) -> Result<(), PatchError> {
        let node = self.resolve_mut(path)?;
        let idx = match node.children.iter().position(|c| c.name == name) {
            Some(idx) => idx,
            None => {
                node.children.push(Property::new(name, ValueType::Array, None));
                node.children.len() - 1
            }
        };
        let array = &mut node.children[idx];
        for value in values {
            array.values.push(ArrayValue { ty: value.ty(), value: value.render() });
        }
        Ok(())
    }

    /// Replaces the `<value>` entries of the array property at `path` with
    /// `entries`, in order. Destructive-then-rebuild: the old list is
    /// discarded entirely, so the final state depends only on `entries`.
    pub fn replace_list_entries(&mut self, path: &str, entries: &[Scalar]) -> Result<(), PatchError> {
        let node = self.resolve_mut(path)?;
        node.values.clear();
        node.values
            .extend(entries.iter().map(|v| ArrayValue { ty: v.ty(), value: v.render() }));
        Ok(())
    }

    /// Appends a pre-built fragment as the last child of the node at `path`.
    /// Prior siblings keep their order and content untouched.
    pub fn inject_subtree(&mut self, path: &str, fragment: Property) -> Result<(), PatchError> {
        let node = self.resolve_mut(path)?;
        node.children.push(fragment);
        Ok(())
    }

    /// Serializes the edited tree next to the target and atomically renames
    /// it over the original. On any failure the original file is untouched.
    pub fn commit(self) -> Result<(), PatchError> {
        let serialized = self.doc.to_xml()?;
        let dir = self.target.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = NamedTempFile::new_in(dir.unwrap_or_else(|| Path::new(".")))
            .map_err(PatchError::WriteFailure)?;
        tmp.write_all(&serialized).map_err(PatchError::WriteFailure)?;
        tmp.as_file().sync_all().map_err(PatchError::WriteFailure)?;
        tmp.persist(&self.target).map_err(|e| PatchError::WriteFailure(e.error))?;
        Ok(())
    }

    fn resolve_mut(&mut self, path: &str) -> Result<&mut Property, PatchError> {
        self.doc
            .resolve_mut(path)
            .ok_or_else(|| PatchError::PathNotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STOCK_PANEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<channel name="xfce4-panel" version="1.0">
  <property name="panels" type="array">
    <value type="int" value="1"/>
    <property name="panel-1" type="empty">
      <property name="size" type="uint" value="30"/>
      <property name="plugin-ids" type="array">
        <value type="int" value="1"/>
        <value type="int" value="9"/>
      </property>
    </property>
  </property>
  <property name="plugins" type="empty">
    <property name="plugin-1" type="string" value="tasklist"/>
  </property>
</channel>
"#;

    fn stock_file(dir: &Path) -> PathBuf {
        let path = dir.join("xfce4-panel.xml");
        fs::write(&path, STOCK_PANEL).unwrap();
        path
    }

    #[test]
    fn ensure_scalar_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = stock_file(dir.path());

        let mut patcher = ChannelPatcher::load(&path).unwrap();
        patcher
            .ensure_scalar("/panels/panel-1", "size", Scalar::Uint(36))
            .unwrap();
        let once = patcher.doc.to_xml().unwrap();

        patcher
            .ensure_scalar("/panels/panel-1", "size", Scalar::Uint(36))
            .unwrap();
        let twice = patcher.doc.to_xml().unwrap();

        assert_eq!(once, twice);
        let size = patcher.doc.resolve("/panels/panel-1/size").unwrap();
        assert_eq!(size.value.as_deref(), Some("36"));
        assert_eq!(size.ty, ValueType::Uint);
    }

    #[test]
    fn ensure_scalar_creates_missing_child() {
        let dir = tempdir().unwrap();
        let mut patcher = ChannelPatcher::load(stock_file(dir.path())).unwrap();

        patcher
            .ensure_scalar("/panels/panel-1", "position-locked", Scalar::Bool(true))
            .unwrap();
        let prop = patcher.doc.resolve("/panels/panel-1/position-locked").unwrap();
        assert_eq!(prop.ty, ValueType::Bool);
        assert_eq!(prop.value.as_deref(), Some("true"));
        // New children land after existing siblings.
        let panel = patcher.doc.resolve("/panels/panel-1").unwrap();
        assert_eq!(panel.children.last().unwrap().name, "position-locked");
    }

    #[test]
    fn ensure_scalar_overwrites_type_and_value() {
        let dir = tempdir().unwrap();
        let mut patcher = ChannelPatcher::load(stock_file(dir.path())).unwrap();

        patcher
            .ensure_scalar("/panels/panel-1", "size", Scalar::String("not-a-size".into()))
            .unwrap();
        let size = patcher.doc.resolve("/panels/panel-1/size").unwrap();
        assert_eq!(size.ty, ValueType::String);
        assert_eq!(size.value.as_deref(), Some("not-a-size"));
    }

    #[test]
    fn tuple_append_is_not_idempotent() {
        let dir = tempdir().unwrap();
        let mut patcher = ChannelPatcher::load(stock_file(dir.path())).unwrap();

        let rgba = [
            Scalar::Double(0.18),
            Scalar::Double(0.2),
            Scalar::Double(0.25),
            Scalar::Double(0.95),
        ];
        patcher
            .append_array_values("/panels/panel-1", "background-rgba", &rgba)
            .unwrap();
        assert_eq!(
            patcher.doc.resolve("/panels/panel-1/background-rgba").unwrap().values.len(),
            4
        );

        // Applying the same tuple again doubles the entries; the caller is
        // expected to guard with contains().
        patcher
            .append_array_values("/panels/panel-1", "background-rgba", &rgba)
            .unwrap();
        assert_eq!(
            patcher.doc.resolve("/panels/panel-1/background-rgba").unwrap().values.len(),
            8
        );
        assert!(patcher.contains("/panels/panel-1/background-rgba"));
    }

    #[test]
    fn replace_list_entries_has_replace_semantics() {
        let dir = tempdir().unwrap();
        let mut patcher = ChannelPatcher::load(stock_file(dir.path())).unwrap();

        let entries = [Scalar::Int(1), Scalar::Int(3001), Scalar::Int(3002)];
        patcher
            .replace_list_entries("/panels/panel-1/plugin-ids", &entries)
            .unwrap();

        let ids = patcher.doc.resolve("/panels/panel-1/plugin-ids").unwrap();
        let rendered: Vec<&str> = ids.values.iter().map(|v| v.value.as_str()).collect();
        // Old [1, 9] is gone, not merged.
        assert_eq!(rendered, vec!["1", "3001", "3002"]);
        assert!(ids.values.iter().all(|v| v.ty == ValueType::Int));

        // A second replacement depends only on its own input.
        patcher
            .replace_list_entries("/panels/panel-1/plugin-ids", &[Scalar::Int(7)])
            .unwrap();
        let ids = patcher.doc.resolve("/panels/panel-1/plugin-ids").unwrap();
        assert_eq!(ids.values.len(), 1);
        assert_eq!(ids.values[0].value, "7");
    }

    #[test]
    fn inject_subtree_appends_after_existing_siblings() {
        let dir = tempdir().unwrap();
        let mut patcher = ChannelPatcher::load(stock_file(dir.path())).unwrap();

        let fragment = Property::parse_fragment(
            r#"<property name="plugin-9" type="string" value="clock"/>"#,
        )
        .unwrap();
        patcher.inject_subtree("/plugins", fragment).unwrap();

        let plugins = patcher.doc.resolve("/plugins").unwrap();
        let names: Vec<&str> = plugins.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["plugin-1", "plugin-9"]);
        // The prior sibling is untouched.
        assert_eq!(plugins.children[0].value.as_deref(), Some("tasklist"));
    }

    #[test]
    fn path_not_found_aborts_without_touching_disk() {
        let dir = tempdir().unwrap();
        let path = stock_file(dir.path());
        let before = fs::read(&path).unwrap();

        let mut patcher = ChannelPatcher::load(&path).unwrap();
        let err = patcher
            .ensure_scalar("/panels/panel-2", "size", Scalar::Uint(36))
            .unwrap_err();
        assert!(matches!(err, PatchError::PathNotFound(_)));

        // The failed edit never reached the file.
        drop(patcher);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn commit_replaces_file_with_serialized_tree() {
        let dir = tempdir().unwrap();
        let path = stock_file(dir.path());

        let mut patcher = ChannelPatcher::load(&path).unwrap();
        patcher
            .ensure_scalar("/panels/panel-1", "size", Scalar::Uint(36))
            .unwrap();
        let expected = patcher.doc.to_xml().unwrap();
        patcher.commit().unwrap();

        assert_eq!(fs::read(&path).unwrap(), expected);
        let reloaded = ChannelPatcher::load(&path).unwrap();
        assert_eq!(
            reloaded.doc.resolve("/panels/panel-1/size").unwrap().value.as_deref(),
            Some("36")
        );
    }

    #[test]
    fn edits_do_not_touch_disk_before_commit() {
        let dir = tempdir().unwrap();
        let path = stock_file(dir.path());
        let before = fs::read(&path).unwrap();

        let mut patcher = ChannelPatcher::load(&path).unwrap();
        patcher
            .ensure_scalar("/panels/panel-1", "size", Scalar::Uint(48))
            .unwrap();
        patcher
            .replace_list_entries("/panels/panel-1/plugin-ids", &[Scalar::Int(2)])
            .unwrap();

        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn minimal_document_inject_scenario() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("min.xml");
        fs::write(&path, r#"<channel name="test"><property name="panels" type="empty"/></channel>"#)
            .unwrap();

        let mut patcher = ChannelPatcher::load(&path).unwrap();
        let fragment = Property::parse_fragment(
            r#"<property name="plugin-1" type="string" value="x"/>"#,
        )
        .unwrap();
        patcher.inject_subtree("/panels", fragment).unwrap();
        patcher.commit().unwrap();

        let reloaded = ChannelPatcher::load(&path).unwrap();
        let plugin = reloaded.doc.resolve("/panels/plugin-1").unwrap();
        assert_eq!(plugin.ty, ValueType::String);
        assert_eq!(plugin.value.as_deref(), Some("x"));
    }

    #[test]
    fn load_fails_on_missing_file() {
        let dir = tempdir().unwrap();
        let err = ChannelPatcher::load(dir.path().join("absent.xml")).unwrap_err();
        assert!(matches!(err, PatchError::Read(_)));
    }
}
