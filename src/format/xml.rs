use super::{Format, FormatError};
use crate::inflector::singularize;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Number, Value};

/// Rails-style XML codec (`text/xml`).
///
/// Element names are dasherized on encode and undasherized on decode.
/// Integers, floats and booleans carry a `type` attribute so they decode
/// back to the same JSON type; `null` is written as `nil="true"`.
#[derive(Clone, Copy, Debug, Default)]
pub struct XmlFormat;

impl Format for XmlFormat {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn extension(&self) -> &'static str {
        "xml"
    }

    fn mime_type(&self) -> &'static str {
        "text/xml"
    }

    fn encode(&self, data: &Value, root: Option<&str>) -> Result<String, FormatError> {
        if let Value::String(encoded) = data {
            return Ok(encoded.clone());
        }
        let root = root.unwrap_or(if data.is_array() { "objects" } else { "hash" });

        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(FormatError::xml)?;
        write_element(&mut writer, root, data)?;

        String::from_utf8(writer.into_inner()).map_err(FormatError::xml)
    }

    fn decode(&self, body: &str) -> Result<Value, FormatError> {
        let root = parse_document(body)?;
        let mut document = Map::with_capacity(1);
        document.insert(undasherize(&root.name), typecast(&root));
        Ok(Value::Object(document))
    }
}

fn dasherize(name: &str) -> String {
    name.replace('_', "-")
}

fn undasherize(name: &str) -> String {
    name.replace('-', "_")
}

fn write_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &Value,
) -> Result<(), FormatError> {
    let tag = dasherize(name);
    let mut start = BytesStart::new(tag.as_str());

    let text = match value {
        Value::Null => {
            start.push_attribute(("nil", "true"));
            return writer
                .write_event(Event::Empty(start))
                .map_err(FormatError::xml);
        }
        Value::Bool(flag) => {
            start.push_attribute(("type", "boolean"));
            flag.to_string()
        }
        Value::Number(number) => {
            let kind = if number.is_f64() { "float" } else { "integer" };
            start.push_attribute(("type", kind));
            number.to_string()
        }
        Value::String(text) => text.clone(),
        Value::Array(items) => {
            start.push_attribute(("type", "array"));
            writer
                .write_event(Event::Start(start))
                .map_err(FormatError::xml)?;
            let child = singularize(name);
            for item in items {
                write_element(writer, &child, item)?;
            }
            return writer
                .write_event(Event::End(BytesEnd::new(tag.as_str())))
                .map_err(FormatError::xml);
        }
        Value::Object(map) if map.is_empty() => {
            return writer
                .write_event(Event::Empty(start))
                .map_err(FormatError::xml);
        }
        Value::Object(map) => {
            writer
                .write_event(Event::Start(start))
                .map_err(FormatError::xml)?;
            for (key, child) in map {
                write_element(writer, key, child)?;
            }
            return writer
                .write_event(Event::End(BytesEnd::new(tag.as_str())))
                .map_err(FormatError::xml);
        }
    };

    writer
        .write_event(Event::Start(start))
        .map_err(FormatError::xml)?;
    writer
        .write_event(Event::Text(BytesText::new(&text)))
        .map_err(FormatError::xml)?;
    writer
        .write_event(Event::End(BytesEnd::new(tag.as_str())))
        .map_err(FormatError::xml)
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, FormatError> {
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(FormatError::xml)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value().map_err(FormatError::xml)?;
            attributes.push((key, value.into_owned()));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

fn parse_document(body: &str) -> Result<Node, FormatError> {
    let mut reader = Reader::from_str(body);

    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;

    loop {
        match reader.read_event().map_err(FormatError::xml)? {
            Event::Start(start) => stack.push(Node::from_start(&start)?),
            Event::Empty(start) => {
                let node = Node::from_start(&start)?;
                attach(&mut stack, &mut root, node);
            }
            Event::Text(text) => {
                if let Some(node) = stack.last_mut() {
                    let text = text.unescape().map_err(FormatError::xml)?;
                    // Indentation between child elements is not content.
                    if node.children.is_empty() || !text.trim().is_empty() {
                        node.text.push_str(&text);
                    }
                }
            }
            Event::CData(data) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| FormatError::xml("unbalanced closing tag"))?;
                attach(&mut stack, &mut root, node);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(FormatError::xml("unexpected end of document"));
    }
    root.ok_or_else(|| FormatError::xml("document has no root element"))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

fn typecast(node: &Node) -> Value {
    if node.attribute("nil") == Some("true") {
        return Value::Null;
    }
    let kind = node.attribute("type");
    if kind == Some("array") {
        return Value::Array(node.children.iter().map(typecast).collect());
    }
    if !node.children.is_empty() {
        return children_to_object(&node.children);
    }

    let text = node.text.trim();
    match kind {
        Some("integer") => text
            .parse::<i64>()
            .map_or_else(|_| Value::String(text.to_string()), Value::from),
        Some("float" | "decimal" | "double") => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or_else(|| Value::String(text.to_string()), Value::Number),
        Some("boolean") => Value::Bool(matches!(text, "true" | "1")),
        _ if node.text.is_empty() => Value::Null,
        _ => Value::String(node.text.clone()),
    }
}

fn children_to_object(children: &[Node]) -> Value {
    let mut map = Map::new();
    for child in children {
        let key = undasherize(&child.name);
        let value = typecast(child);
        match map.get_mut(&key) {
            Some(Value::Array(existing)) if child.attribute("type") != Some("array") => {
                existing.push(value);
            }
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(key, value);
            }
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_xml_metadata() {
        assert_eq!(XmlFormat.extension(), "xml");
        assert_eq!(XmlFormat.mime_type(), "text/xml");
    }

    #[test]
    fn test_encode_writes_typed_elements() {
        let body = XmlFormat
            .encode(&json!({"id": 1, "name": "Matz", "first_name": "Yukihiro"}), Some("person"))
            .unwrap();
        assert!(body.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(body.contains("<person>"));
        assert!(body.contains(r#"<id type="integer">1</id>"#));
        assert!(body.contains("<name>Matz</name>"));
        assert!(body.contains("<first-name>Yukihiro</first-name>"));
        assert!(body.trim_end().ends_with("</person>"));
    }

    #[test]
    fn test_encode_without_root_uses_hash() {
        let body = XmlFormat.encode(&json!({"id": 1}), None).unwrap();
        assert!(body.contains("<hash>"));
    }

    #[test]
    fn test_decode_keeps_document_root() {
        let decoded = XmlFormat
            .decode(r#"<?xml version="1.0" encoding="UTF-8"?><person><id type="integer">1</id><name>Matz</name></person>"#)
            .unwrap();
        assert_eq!(decoded, json!({"person": {"id": 1, "name": "Matz"}}));
    }

    #[test]
    fn test_decode_collection() {
        let decoded = XmlFormat
            .decode(
                r#"<people type="array">
                     <person><id type="integer">1</id><name>Matz</name></person>
                     <person><id type="integer">2</id><name>David</name></person>
                   </people>"#,
            )
            .unwrap();
        assert_eq!(
            decoded,
            json!({"people": [{"id": 1, "name": "Matz"}, {"id": 2, "name": "David"}]})
        );
    }

    #[test]
    fn test_decode_typed_leaves() {
        let decoded = XmlFormat
            .decode(
                r#"<reading>
                     <temperature type="float">21.5</temperature>
                     <sunny type="boolean">true</sunny>
                     <station-name>Kew</station-name>
                     <note nil="true"/>
                   </reading>"#,
            )
            .unwrap();
        assert_eq!(
            decoded,
            json!({"reading": {"temperature": 21.5, "sunny": true, "station_name": "Kew", "note": null}})
        );
    }

    #[test]
    fn test_decode_repeated_children_become_array() {
        let decoded = XmlFormat
            .decode("<list><item>a</item><item>b</item><item>c</item></list>")
            .unwrap();
        assert_eq!(decoded, json!({"list": {"item": ["a", "b", "c"]}}));
    }

    #[test]
    fn test_nested_round_trip() {
        let data = json!({
            "name": "Rick",
            "address": {"street": "12345 Street", "zip": 27519},
            "friends": [{"name": "JK"}, {"name": "Luis"}]
        });
        let encoded = XmlFormat.encode(&data, Some("customer")).unwrap();
        assert_eq!(
            XmlFormat.decode(&encoded).unwrap(),
            json!({"customer": data})
        );
    }

    #[test]
    fn test_decode_malformed_document_fails() {
        assert!(matches!(
            XmlFormat.decode("<person><name>Matz</person>"),
            Err(FormatError::Xml { .. })
        ));
        assert!(XmlFormat.decode("").is_err());
    }
}
