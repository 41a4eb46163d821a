//! JSON renderer and parser.

use std::io::{self, Write};

use reinhardt_primitives::{Primitive, SerializationResult};
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};

use crate::renderer::{Parser, RenderOptions, Renderer, SortedKeys};

/// Compact formatter writing `", "` between items and `": "` after keys.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
	fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
	where
		W: ?Sized + Write,
	{
		if first { Ok(()) } else { writer.write_all(b", ") }
	}

	fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
	where
		W: ?Sized + Write,
	{
		if first { Ok(()) } else { writer.write_all(b", ") }
	}

	fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
	where
		W: ?Sized + Write,
	{
		writer.write_all(b": ")
	}
}

/// Renders primitive trees as JSON.
///
/// Without an indent the output is a single line such as
/// `{"a": 1, "b": "foo", "c": true}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl JsonRenderer {
	/// Creates a JSON renderer.
	pub fn new() -> Self {
		Self
	}
}

fn write_with<F: Formatter>(
	data: &Primitive,
	out: &mut dyn Write,
	formatter: F,
	sort_keys: bool,
) -> SerializationResult<()> {
	let mut serializer = serde_json::Serializer::with_formatter(out, formatter);
	if sort_keys {
		SortedKeys(data).serialize(&mut serializer)?;
	} else {
		data.serialize(&mut serializer)?;
	}
	Ok(())
}

impl Renderer for JsonRenderer {
	fn media_type(&self) -> &str {
		"application/json"
	}

	fn render(
		&self,
		data: &Primitive,
		out: &mut dyn Write,
		options: &RenderOptions,
	) -> SerializationResult<()> {
		match options.indent {
			Some(width) => {
				let indent = vec![b' '; width];
				write_with(
					data,
					out,
					PrettyFormatter::with_indent(&indent),
					options.sort_keys,
				)
			}
			None => write_with(data, out, SpacedFormatter, options.sort_keys),
		}
	}
}

/// Parses JSON documents into primitive trees, keeping key order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl JsonParser {
	/// Creates a JSON parser.
	pub fn new() -> Self {
		Self
	}
}

impl Parser for JsonParser {
	fn media_type(&self) -> &str {
		"application/json"
	}

	fn parse(&self, input: &[u8]) -> SerializationResult<Primitive> {
		let value: serde_json::Value = serde_json::from_slice(input)?;
		Ok(Primitive::from(value))
	}
}
