//! Generic XML renderer and the shared XML emitter.

use std::borrow::Cow;
use std::io::Write;

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use reinhardt_primitives::{Primitive, SerializationError, SerializationResult};

use crate::renderer::{RenderOptions, Renderer};

/// Escapes character data (`&`, `<`, `>`).
pub(crate) fn escape_text(text: &str) -> Cow<'_, str> {
	partial_escape(text)
}

/// Escapes a double-quoted attribute value.
pub(crate) fn escape_attribute(value: &str) -> String {
	partial_escape(value).replace('"', "&quot;")
}

fn render_error<E: std::fmt::Display>(error: E) -> SerializationError {
	SerializationError::Render(error.to_string())
}

/// Thin event writer producing SAX-style output: no self-closing tags and no
/// whitespace between elements.
pub(crate) struct XmlEmitter<'a> {
	writer: Writer<&'a mut dyn Write>,
}

impl<'a> XmlEmitter<'a> {
	pub(crate) fn new(out: &'a mut dyn Write) -> Self {
		Self {
			writer: Writer::new(out),
		}
	}

	/// Writes `<?xml version="1.0" encoding="utf-8"?>` and a newline.
	pub(crate) fn declaration(&mut self) -> SerializationResult<()> {
		self.writer
			.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
			.map_err(render_error)?;
		self.writer.get_mut().write_all(b"\n")?;
		Ok(())
	}

	pub(crate) fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> SerializationResult<()> {
		let mut element = BytesStart::new(name);
		for (key, value) in attributes {
			element.push_attribute(Attribute {
				key: QName(key.as_bytes()),
				value: Cow::Owned(escape_attribute(value).into_bytes()),
			});
		}
		self.writer
			.write_event(Event::Start(element))
			.map_err(render_error)
	}

	pub(crate) fn end(&mut self, name: &str) -> SerializationResult<()> {
		self.writer
			.write_event(Event::End(BytesEnd::new(name)))
			.map_err(render_error)
	}

	pub(crate) fn text(&mut self, text: &str) -> SerializationResult<()> {
		if text.is_empty() {
			return Ok(());
		}
		self.writer
			.write_event(Event::Text(BytesText::from_escaped(escape_text(text))))
			.map_err(render_error)
	}

	/// Writes `<name attrs>text</name>`.
	pub(crate) fn element(
		&mut self,
		name: &str,
		attributes: &[(&str, &str)],
		text: &str,
	) -> SerializationResult<()> {
		self.start(name, attributes)?;
		self.text(text)?;
		self.end(name)
	}
}

/// Renders primitive trees as generic XML.
///
/// Mappings become `<object>` elements with one child per key, sequences
/// become `<list>` elements with `<item>` children and scalars become text.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlRenderer;

impl XmlRenderer {
	/// Creates a generic XML renderer.
	pub fn new() -> Self {
		Self
	}

	fn write_node(&self, xml: &mut XmlEmitter<'_>, data: &Primitive) -> SerializationResult<()> {
		match data {
			Primitive::Map(map) => {
				xml.start("object", &[])?;
				for (key, value) in map.iter() {
					xml.start(key, &[])?;
					self.write_node(xml, value)?;
					xml.end(key)?;
				}
				xml.end("object")
			}
			Primitive::Seq(seq) => {
				xml.start("list", &[])?;
				for item in seq.items().map_err(render_error)? {
					xml.start("item", &[])?;
					self.write_node(xml, item)?;
					xml.end("item")?;
				}
				xml.end("list")
			}
			Primitive::Scalar(scalar) => xml.text(&scalar.to_text()),
		}
	}
}

impl Renderer for XmlRenderer {
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
		self.write_node(&mut xml, data)
	}
}
