use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use super::error::PatchError;

/// The value types xfconf knows about. `Array` properties carry their
/// entries as `<value>` children instead of a `value` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Int,
    Uint,
    Double,
    Bool,
    Empty,
    Array,
}

impl ValueType {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "int",
            ValueType::Uint => "uint",
            ValueType::Double => "double",
            ValueType::Bool => "bool",
            ValueType::Empty => "empty",
            ValueType::Array => "array",
        }
    }

    fn parse(s: &str) -> Result<Self, PatchError> {
        match s {
            "string" => Ok(ValueType::String),
            "int" => Ok(ValueType::Int),
            "uint" => Ok(ValueType::Uint),
            "double" => Ok(ValueType::Double),
            "bool" => Ok(ValueType::Bool),
            "empty" => Ok(ValueType::Empty),
            "array" => Ok(ValueType::Array),
            other => Err(PatchError::Malformed(format!("unknown value type: {}", other))),
        }
    }
}

/// A typed scalar headed for the document, rendered to xfconf's textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int(i64),
    Uint(u64),
    Double(f64),
    Bool(bool),
}

impl Scalar {
    pub fn ty(&self) -> ValueType {
        match self {
            Scalar::String(_) => ValueType::String,
            Scalar::Int(_) => ValueType::Int,
            Scalar::Uint(_) => ValueType::Uint,
            Scalar::Double(_) => ValueType::Double,
            Scalar::Bool(_) => ValueType::Bool,
        }
    }

    pub fn render(&self) -> String {
        match self {
            Scalar::String(s) => s.clone(),
            Scalar::Int(v) => v.to_string(),
            Scalar::Uint(v) => v.to_string(),
            Scalar::Double(v) => v.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// One `<value type=".." value=".."/>` entry of an array property.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub ty: ValueType,
    pub value: String,
}

/// One node of the channel tree. `name` is unique among siblings; the order
/// of `children` and `values` is preserved byte-for-byte across a
/// load/serialize cycle, because for the panel channel it is the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub ty: ValueType,
    pub value: Option<String>,
    pub values: Vec<ArrayValue>,
    pub children: Vec<Property>,
}

impl Property {
    pub fn new(name: &str, ty: ValueType, value: Option<String>) -> Self {
        Property {
            name: name.to_string(),
            ty,
            value,
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn scalar(name: &str, value: &Scalar) -> Self {
        Property::new(name, value.ty(), Some(value.render()))
    }

    pub fn child(&self, name: &str) -> Option<&Property> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Parses a pre-authored fragment (one `<property>` element, possibly
    /// nested) into a tree ready for `ChannelPatcher::inject_subtree`.
    /// Plugin and launcher definitions are easier to author as whole
    /// fragments than to build node by node.
    pub fn parse_fragment(xml: &str) -> Result<Property, PatchError> {
        let (channel, mut props) = parse_nodes(xml)?;
        if channel.is_some() {
            return Err(PatchError::Malformed(
                "fragment must not contain a <channel> element".to_string(),
            ));
        }
        match props.len() {
            1 => Ok(props.remove(0)),
            0 => Err(PatchError::Malformed("fragment contains no property".to_string())),
            n => Err(PatchError::Malformed(format!(
                "fragment must have a single root property, found {}",
                n
            ))),
        }
    }
}

/// In-memory mirror of one xfce-perchannel-xml file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDoc {
    pub channel: String,
    pub version: String,
    // Synthetic unnamed root; its children are the channel's top-level
    // properties. Lets path resolution treat "/" like any other node.
    root: Property,
}

impl ChannelDoc {
    pub fn parse(xml: &str) -> Result<Self, PatchError> {
        let (channel, props) = parse_nodes(xml)?;
        let (channel, version) =
            channel.ok_or_else(|| PatchError::Malformed("missing <channel> root element".to_string()))?;
        let mut root = Property::new("", ValueType::Empty, None);
        root.children = props;
        Ok(ChannelDoc { channel, version, root })
    }

    /// Resolves a slash-separated property path ("/panels/panel-1").
    /// "/" is the channel root itself.
    pub fn resolve(&self, path: &str) -> Option<&Property> {
        let mut node = &self.root;
        for seg in segments(path) {
            node = node.child(seg)?;
        }
        Some(node)
    }

    pub fn resolve_mut(&mut self, path: &str) -> Option<&mut Property> {
        let mut node = &mut self.root;
        for seg in segments(path) {
            node = node.child_mut(seg)?;
        }
        Some(node)
    }

    pub fn to_xml(&self) -> Result<Vec<u8>, PatchError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut el = BytesStart::new("channel");
        el.push_attribute(("name", self.channel.as_str()));
        el.push_attribute(("version", self.version.as_str()));

        if self.root.children.is_empty() {
            writer.write_event(Event::Empty(el))?;
        } else {
            writer.write_event(Event::Start(el))?;
            for child in &self.root.children {
                write_property(&mut writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new("channel")))?;
        }

        let mut out = writer.into_inner();
        out.push(b'\n');
        Ok(out)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn write_property(writer: &mut Writer<Vec<u8>>, prop: &Property) -> Result<(), PatchError> {
    let mut el = BytesStart::new("property");
    el.push_attribute(("name", prop.name.as_str()));
    el.push_attribute(("type", prop.ty.as_str()));
    if let Some(value) = &prop.value {
        el.push_attribute(("value", value.as_str()));
    }

    if prop.values.is_empty() && prop.children.is_empty() {
        writer.write_event(Event::Empty(el))?;
        return Ok(());
    }

    writer.write_event(Event::Start(el))?;
    for entry in &prop.values {
        let mut ve = BytesStart::new("value");
        ve.push_attribute(("type", entry.ty.as_str()));
        ve.push_attribute(("value", entry.value.as_str()));
        writer.write_event(Event::Empty(ve))?;
    }
    for child in &prop.children {
        write_property(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new("property")))?;
    Ok(())
}

/// Shared event-stream parser for whole channel files and bare fragments.
/// Returns the channel attributes (if a <channel> element was seen) and the
/// top-level properties in document order.
fn parse_nodes(xml: &str) -> Result<(Option<(String, String)>, Vec<Property>), PatchError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut channel: Option<(String, String)> = None;
    let mut top: Vec<Property> = Vec::new();
    let mut stack: Vec<Property> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => match e.name().as_ref() {
                b"channel" => channel = Some(channel_attrs(e)?),
                b"property" => stack.push(property_from_attrs(e)?),
                b"value" => attach_value(e, &mut stack)?,
                other => {
                    return Err(PatchError::Malformed(format!(
                        "unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::Empty(ref e) => match e.name().as_ref() {
                b"channel" => channel = Some(channel_attrs(e)?),
                b"property" => {
                    let prop = property_from_attrs(e)?;
                    attach_property(prop, &mut stack, &mut top);
                }
                b"value" => attach_value(e, &mut stack)?,
                other => {
                    return Err(PatchError::Malformed(format!(
                        "unexpected element <{}>",
                        String::from_utf8_lossy(other)
                    )));
                }
            },
            Event::End(ref e) => {
                if e.name().as_ref() == b"property" {
                    let prop = stack
                        .pop()
                        .ok_or_else(|| PatchError::Malformed("unbalanced </property>".to_string()))?;
                    attach_property(prop, &mut stack, &mut top);
                }
            }
            Event::Eof => break,
            // Declaration, whitespace text, comments.
            _ => {}
        }
        buf.clear();
    }

    if !stack.is_empty() {
        return Err(PatchError::Malformed("unclosed <property> element".to_string()));
    }

    Ok((channel, top))
}

fn attach_property(prop: Property, stack: &mut Vec<Property>, top: &mut Vec<Property>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(prop),
        None => top.push(prop),
    }
}

fn attach_value(e: &BytesStart, stack: &mut Vec<Property>) -> Result<(), PatchError> {
    let mut ty = None;
    let mut value = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| PatchError::Malformed(format!("bad attribute: {}", e)))?;
        let text = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"type" => ty = Some(ValueType::parse(&text)?),
            b"value" => value = Some(text),
            _ => {}
        }
    }
    let entry = match (ty, value) {
        (Some(ty), Some(value)) => ArrayValue { ty, value },
        _ => {
            return Err(PatchError::Malformed(
                "<value> missing type or value attribute".to_string(),
            ));
        }
    };
    match stack.last_mut() {
        Some(parent) => {
            parent.values.push(entry);
            Ok(())
        }
        None => Err(PatchError::Malformed("<value> outside of a property".to_string())),
    }
}

fn property_from_attrs(e: &BytesStart) -> Result<Property, PatchError> {
    let mut name = None;
    let mut ty = None;
    let mut value = None;
    for attr in e.attributes() {
        let attr = attr.map_err(|e| PatchError::Malformed(format!("bad attribute: {}", e)))?;
        let text = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(text),
            b"type" => ty = Some(ValueType::parse(&text)?),
            b"value" => value = Some(text),
            _ => {}
        }
    }
    match (name, ty) {
        (Some(name), Some(ty)) => Ok(Property {
            name,
            ty,
            value,
            values: Vec::new(),
            children: Vec::new(),
        }),
        _ => Err(PatchError::Malformed(
            "<property> missing name or type attribute".to_string(),
        )),
    }
}

fn channel_attrs(e: &BytesStart) -> Result<(String, String), PatchError> {
    let mut name = None;
    let mut version = "1.0".to_string();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| PatchError::Malformed(format!("bad attribute: {}", e)))?;
        let text = attr.unescape_value()?.into_owned();
        match attr.key.as_ref() {
            b"name" => name = Some(text),
            b"version" => version = text,
            _ => {}
        }
    }
    let name = name.ok_or_else(|| PatchError::Malformed("<channel> missing name attribute".to_string()))?;
    Ok((name, version))
}
