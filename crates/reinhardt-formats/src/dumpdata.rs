//! The dumpdata XML fixture format.
//!
//! Documents look like:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <django-objects version="1.0"><object pk="1" model="app.racer"><field type="CharField" name="name">Jane</field></object></django-objects>
//! ```
//!
//! Field elements carry the attributes recorded in each entry's
//! [`FieldMeta`]; relation fields have `to`/`rel` attributes and render
//! their value as `<natural>` or `<object pk="..">` children.

use std::io::Write;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use reinhardt_primitives::{
	FieldMeta, Primitive, PrimitiveMap, Scalar, SerializationError, SerializationResult,
};

use crate::renderer::{Parser, RenderOptions, Renderer};
use crate::xml::XmlEmitter;

const ROOT: &str = "django-objects";
const MANY_TO_MANY_REL: &str = "ManyToManyRel";

/// Renders fixture envelopes (`{pk, model, fields}`) as dumpdata XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpDataXmlRenderer;

impl DumpDataXmlRenderer {
	pub fn new() -> Self {
		Self
	}

	fn write_object(&self, xml: &mut XmlEmitter<'_>, data: &Primitive) -> SerializationResult<()> {
		let envelope = data.as_map().ok_or_else(|| {
			SerializationError::Render("dumpdata objects must be mappings".to_string())
		})?;
		let pk = envelope.get("pk").and_then(Primitive::as_scalar);
		let model = envelope
			.get("model")
			.and_then(Primitive::as_scalar)
			.map(Scalar::to_text)
			.unwrap_or_default();

		let pk_text = pk.filter(|pk| !pk.is_null()).map(Scalar::to_text);
		let mut attributes: Vec<(&str, &str)> = Vec::with_capacity(2);
		if let Some(pk_text) = pk_text.as_deref() {
			attributes.push(("pk", pk_text));
		}
		attributes.push(("model", model.as_str()));
		xml.start("object", &attributes)?;

		if let Some(fields) = envelope.get("fields").and_then(Primitive::as_map) {
			for (name, value, meta) in ordered_fields(fields) {
				self.write_field(xml, name, value, meta)?;
			}
		}
		xml.end("object")
	}

	fn write_field(
		&self,
		xml: &mut XmlEmitter<'_>,
		name: &str,
		value: &Primitive,
		meta: Option<&FieldMeta>,
	) -> SerializationResult<()> {
		let attributes = field_attributes(name, meta);
		let attributes: Vec<(&str, &str)> = attributes
			.iter()
			.map(|(key, value)| (key.as_str(), value.as_str()))
			.collect();
		xml.start("field", &attributes)?;

		let many_to_many = meta.and_then(|meta| meta.attribute("rel")) == Some(MANY_TO_MANY_REL);
		let natural_key = meta.is_some_and(|meta| meta.natural_key);
		match value {
			Primitive::Scalar(Scalar::Null) => xml.element("None", &[], "")?,
			Primitive::Seq(seq) if natural_key || many_to_many => {
				write_related(xml, seq.items()?, many_to_many)?
			}
			Primitive::Scalar(scalar) if scalar.is_temporal() => {
				xml.text(&scalar.isoformat().unwrap_or_default())?
			}
			Primitive::Scalar(scalar) => xml.text(&scalar.to_text())?,
			nested => xml.text(&serde_json::to_string(nested)?)?,
		}
		xml.end("field")
	}
}

/// Entries sorted by the producing field's creation order. Entries without
/// metadata keep their relative position after the ordered ones.
fn ordered_fields(fields: &PrimitiveMap) -> Vec<(&str, &Primitive, Option<&FieldMeta>)> {
	let mut entries: Vec<_> = fields.iter_with_meta().collect();
	entries.sort_by_key(|(_, _, meta)| meta.map_or(u64::MAX, |meta| meta.creation_order));
	entries
}

fn field_attributes(name: &str, meta: Option<&FieldMeta>) -> Vec<(String, String)> {
	let declared = meta.map(|meta| meta.attributes.as_slice()).unwrap_or_default();
	let pick = |key: &str| {
		declared
			.iter()
			.find(|(k, _)| k == key)
			.map(|(k, v)| (k.clone(), v.clone()))
	};

	let mut attributes = Vec::with_capacity(declared.len() + 1);
	attributes.extend(pick("type"));
	attributes.extend(pick("to"));
	attributes.push(("name".to_string(), name.to_string()));
	attributes.extend(pick("rel"));
	attributes.extend(
		declared
			.iter()
			.filter(|(key, _)| !matches!(key.as_str(), "type" | "to" | "rel" | "name"))
			.cloned(),
	);
	attributes
}

/// Writes the children of a relation value.
///
/// A foreign-key natural key is a sequence of `<natural>` parts. Each
/// many-to-many item is an `<object>` carrying either a `pk` attribute or,
/// for natural keys, its own `<natural>` parts.
fn write_related(
	xml: &mut XmlEmitter<'_>,
	items: &[Primitive],
	many_to_many: bool,
) -> SerializationResult<()> {
	for item in items {
		match item {
			Primitive::Seq(parts) if many_to_many => {
				xml.start("object", &[])?;
				for part in parts.items()? {
					xml.element("natural", &[], &text_of(part))?;
				}
				xml.end("object")?;
			}
			item if many_to_many => xml.element("object", &[("pk", text_of(item).as_str())], "")?,
			part => xml.element("natural", &[], &text_of(part))?,
		}
	}
	Ok(())
}

fn text_of(value: &Primitive) -> String {
	match value.as_scalar() {
		Some(scalar) if scalar.is_temporal() => scalar.isoformat().unwrap_or_default(),
		Some(scalar) => scalar.to_text(),
		None => String::new(),
	}
}

impl Renderer for DumpDataXmlRenderer {
	fn media_type(&self) -> &str {
		"application/xml"
	}

	fn render(
		&self,
		data: &Primitive,
		out: &mut dyn Write,
		_options: &RenderOptions,
	) -> SerializationResult<()> {
		let mut xml = XmlEmitter::new(out);
		xml.declaration()?;
		xml.start(ROOT, &[("version", "1.0")])?;
		match data {
			Primitive::Seq(seq) => {
				for item in seq.items()? {
					self.write_object(&mut xml, item)?;
				}
			}
			single => self.write_object(&mut xml, single)?,
		}
		xml.end(ROOT)
	}
}

/// Parses dumpdata XML back into a sequence of `{pk, model, fields}`
/// mappings.
///
/// Field text is returned as strings; typed fields coerce it on revert.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpDataXmlParser;

impl DumpDataXmlParser {
	pub fn new() -> Self {
		Self
	}
}

type XmlReader<'a> = Reader<&'a [u8]>;

fn parse_error<E: std::fmt::Display>(error: E) -> SerializationError {
	SerializationError::Parse(error.to_string())
}

fn attribute(element: &BytesStart<'_>, name: &str) -> SerializationResult<Option<String>> {
	match element.try_get_attribute(name).map_err(parse_error)? {
		Some(attr) => Ok(Some(attr.unescape_value().map_err(parse_error)?.into_owned())),
		None => Ok(None),
	}
}

fn unexpected_eof(inside: &str) -> SerializationError {
	SerializationError::Parse(format!("unexpected end of document inside <{}>", inside))
}

/// Collects the text content of an element up to its end tag.
fn read_text(reader: &mut XmlReader<'_>, name: &str) -> SerializationResult<String> {
	let mut text = String::new();
	loop {
		match reader.read_event().map_err(parse_error)? {
			Event::Text(t) => text.push_str(&t.unescape().map_err(parse_error)?),
			Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
			Event::End(e) if e.name().as_ref() == name.as_bytes() => return Ok(text),
			Event::Eof => return Err(unexpected_eof(name)),
			_ => {}
		}
	}
}

fn parse_field(reader: &mut XmlReader<'_>, many_to_many: bool) -> SerializationResult<Primitive> {
	let mut text = String::new();
	let mut naturals = Vec::new();
	let mut items = Vec::new();
	let mut none = false;

	loop {
		match reader.read_event().map_err(parse_error)? {
			Event::Text(t) => text.push_str(&t.unescape().map_err(parse_error)?),
			Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
			Event::Empty(e) if e.name().as_ref() == b"None" => none = true,
			Event::Start(e) if e.name().as_ref() == b"None" => {
				read_text(reader, "None")?;
				none = true;
			}
			Event::Start(e) if e.name().as_ref() == b"natural" => {
				naturals.push(Primitive::from(read_text(reader, "natural")?));
			}
			Event::Empty(e) if e.name().as_ref() == b"natural" => {
				naturals.push(Primitive::from(""));
			}
			Event::Empty(e) if e.name().as_ref() == b"object" => {
				items.push(Primitive::from(attribute(&e, "pk")?.unwrap_or_default()));
			}
			Event::Start(e) if e.name().as_ref() == b"object" => match attribute(&e, "pk")? {
				Some(pk) => {
					read_text(reader, "object")?;
					items.push(Primitive::from(pk));
				}
				None => items.push(parse_natural_object(reader)?),
			},
			Event::End(e) if e.name().as_ref() == b"field" => break,
			Event::Eof => return Err(unexpected_eof("field")),
			_ => {}
		}
	}

	Ok(if none {
		Primitive::null()
	} else if many_to_many || !items.is_empty() {
		Primitive::from(items)
	} else if !naturals.is_empty() {
		Primitive::from(naturals)
	} else {
		Primitive::from(text)
	})
}

fn parse_natural_object(reader: &mut XmlReader<'_>) -> SerializationResult<Primitive> {
	let mut parts = Vec::new();
	loop {
		match reader.read_event().map_err(parse_error)? {
			Event::Start(e) if e.name().as_ref() == b"natural" => {
				parts.push(Primitive::from(read_text(reader, "natural")?));
			}
			Event::Empty(e) if e.name().as_ref() == b"natural" => parts.push(Primitive::from("")),
			Event::End(e) if e.name().as_ref() == b"object" => return Ok(Primitive::from(parts)),
			Event::Eof => return Err(unexpected_eof("object")),
			_ => {}
		}
	}
}

fn parse_object(
	reader: &mut XmlReader<'_>,
	element: &BytesStart<'_>,
) -> SerializationResult<Primitive> {
	let pk = attribute(element, "pk")?.map_or_else(Primitive::null, Primitive::from);
	let model = attribute(element, "model")?.ok_or_else(|| {
		SerializationError::Parse("<object> element is missing the model attribute".to_string())
	})?;

	let mut fields = PrimitiveMap::new();
	loop {
		match reader.read_event().map_err(parse_error)? {
			Event::Start(e) if e.name().as_ref() == b"field" => {
				let name = required_name(&e)?;
				let many_to_many = attribute(&e, "rel")?.as_deref() == Some(MANY_TO_MANY_REL);
				fields.insert(name, parse_field(reader, many_to_many)?);
			}
			Event::Empty(e) if e.name().as_ref() == b"field" => {
				let name = required_name(&e)?;
				let many_to_many = attribute(&e, "rel")?.as_deref() == Some(MANY_TO_MANY_REL);
				let value = if many_to_many {
					Primitive::from(Vec::new())
				} else {
					Primitive::from("")
				};
				fields.insert(name, value);
			}
			Event::End(e) if e.name().as_ref() == b"object" => break,
			Event::Eof => return Err(unexpected_eof("object")),
			_ => {}
		}
	}

	let mut envelope = PrimitiveMap::new();
	envelope.insert("pk", pk);
	envelope.insert("model", model);
	envelope.insert("fields", fields);
	Ok(Primitive::Map(envelope))
}

fn required_name(element: &BytesStart<'_>) -> SerializationResult<String> {
	attribute(element, "name")?.ok_or_else(|| {
		SerializationError::Parse("<field> element is missing the name attribute".to_string())
	})
}

impl Parser for DumpDataXmlParser {
	fn media_type(&self) -> &str {
		"application/xml"
	}

	fn parse(&self, input: &[u8]) -> SerializationResult<Primitive> {
		let mut reader = Reader::from_reader(input);
		reader.config_mut().trim_text(true);

		let mut objects = Vec::new();
		loop {
			match reader.read_event().map_err(parse_error)? {
				Event::Start(e) if e.name().as_ref() == b"object" => {
					objects.push(parse_object(&mut reader, &e)?);
				}
				Event::Eof => break,
				_ => {}
			}
		}
		Ok(Primitive::from(objects))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn meta(order: u64, attributes: &[(&str, &str)]) -> FieldMeta {
		FieldMeta::new(order).with_attributes(
			attributes
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
		)
	}

	fn envelope(pk: Primitive, fields: PrimitiveMap) -> Primitive {
		let mut map = PrimitiveMap::new();
		map.insert("pk", pk);
		map.insert("model", "races.raceentry");
		map.insert("fields", fields);
		Primitive::Map(map)
	}

	fn render(data: &Primitive) -> String {
		DumpDataXmlRenderer::new()
			.render_to_string(data, &RenderOptions::new())
			.unwrap()
	}

	#[rstest]
	fn test_fields_are_ordered_by_creation_order() {
		let mut fields = PrimitiveMap::new();
		fields.insert_with_meta("runner", "Mike", meta(2, &[("type", "CharField")]));
		fields.insert_with_meta("name", "Jane", meta(1, &[("type", "CharField")]));
		let output = render(&Primitive::from(vec![envelope(Primitive::from(1i64), fields)]));
		assert_eq!(
			output,
			"<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<django-objects version=\"1.0\"><object pk=\"1\" model=\"races.raceentry\"><field type=\"CharField\" name=\"name\">Jane</field><field type=\"CharField\" name=\"runner\">Mike</field></object></django-objects>"
		);
	}

	#[rstest]
	fn test_null_pk_is_omitted_and_null_value_renders_none() {
		let mut fields = PrimitiveMap::new();
		fields.insert_with_meta("finished", Primitive::null(), meta(1, &[("type", "DateTimeField")]));
		let output = render(&envelope(Primitive::null(), fields));
		assert!(output.contains("<object model=\"races.raceentry\">"));
		assert!(output.contains("<field type=\"DateTimeField\" name=\"finished\"><None></None></field>"));
	}

	#[rstest]
	fn test_relations_render_children() {
		let mut fields = PrimitiveMap::new();
		fields.insert_with_meta(
			"owner",
			Primitive::from(vec![Primitive::from("john"), Primitive::from("doe")]),
			meta(1, &[("to", "pets.owner"), ("rel", "ManyToOneRel")]).with_natural_key(true),
		);
		fields.insert_with_meta(
			"tags",
			Primitive::from(vec![Primitive::from(1i64), Primitive::from(2i64)]),
			meta(2, &[("to", "pets.tag"), ("rel", "ManyToManyRel")]),
		);
		let output = render(&envelope(Primitive::from(3i64), fields));
		assert!(output.contains(
			"<field to=\"pets.owner\" name=\"owner\" rel=\"ManyToOneRel\"><natural>john</natural><natural>doe</natural></field>"
		));
		assert!(output.contains(
			"<field to=\"pets.tag\" name=\"tags\" rel=\"ManyToManyRel\"><object pk=\"1\"></object><object pk=\"2\"></object></field>"
		));
	}

	#[rstest]
	fn test_parse_inverts_render() {
		let mut fields = PrimitiveMap::new();
		fields.insert_with_meta("name", "Jane & co", meta(1, &[("type", "CharField")]));
		fields.insert_with_meta("finished", Primitive::null(), meta(2, &[("type", "DateTimeField")]));
		fields.insert_with_meta(
			"tags",
			Primitive::from(vec![Primitive::from(1i64)]),
			meta(3, &[("to", "pets.tag"), ("rel", "ManyToManyRel")]),
		);
		fields.insert_with_meta(
			"owner",
			Primitive::from(vec![Primitive::from("john")]),
			meta(4, &[("to", "pets.owner"), ("rel", "ManyToOneRel")]).with_natural_key(true),
		);
		let output = render(&Primitive::from(vec![envelope(Primitive::from(1i64), fields)]));

		let parsed = DumpDataXmlParser::new().parse(output.as_bytes()).unwrap();
		assert_eq!(
			parsed,
			Primitive::from(json!([{
				"pk": "1",
				"model": "races.raceentry",
				"fields": {
					"name": "Jane & co",
					"finished": null,
					"tags": ["1"],
					"owner": ["john"],
				}
			}]))
		);
	}

	#[rstest]
	fn test_parse_natural_many_to_many_and_empty_fields() {
		let document = r#"<?xml version="1.0" encoding="utf-8"?>
<django-objects version="1.0">
  <object model="pets.pet">
    <field type="CharField" name="nickname"></field>
    <field to="pets.tag" name="tags" rel="ManyToManyRel">
      <object><natural>red</natural></object>
      <object><natural>blue</natural></object>
    </field>
    <field to="pets.toy" name="toys" rel="ManyToManyRel"/>
  </object>
</django-objects>"#;
		let parsed = DumpDataXmlParser::new().parse(document.as_bytes()).unwrap();
		assert_eq!(
			parsed,
			Primitive::from(json!([{
				"pk": null,
				"model": "pets.pet",
				"fields": {"nickname": "", "tags": [["red"], ["blue"]], "toys": []}
			}]))
		);
	}

	#[rstest]
	fn test_parse_rejects_truncated_document() {
		let result = DumpDataXmlParser::new()
			.parse(b"<django-objects version=\"1.0\"><object pk=\"1\" model=\"a.b\"><field name=\"x\">");
		assert!(matches!(result, Err(SerializationError::Parse(_))));
	}
}
