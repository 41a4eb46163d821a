//! YAML renderer and parser.

use std::io::Write;

use reinhardt_primitives::{Primitive, PrimitiveMap, SerializationError, SerializationResult};

use crate::renderer::{Parser, RenderOptions, Renderer, SortedKeys};

/// Renders primitive trees as block-style YAML.
///
/// `indent` is ignored; the emitter always uses two spaces.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlRenderer;

impl YamlRenderer {
	/// Creates a YAML renderer.
	pub fn new() -> Self {
		Self
	}
}

impl Renderer for YamlRenderer {
	fn media_type(&self) -> &str {
		"application/x-yaml"
	}

	fn render(
		&self,
		data: &Primitive,
		out: &mut dyn Write,
		options: &RenderOptions,
	) -> SerializationResult<()> {
		let result = if options.sort_keys {
			serde_yaml::to_writer(out, &SortedKeys(data))
		} else {
			serde_yaml::to_writer(out, data)
		};
		result.map_err(|e| SerializationError::Render(e.to_string()))
	}
}

/// Parses YAML documents into primitive trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl YamlParser {
	/// Creates a YAML parser.
	pub fn new() -> Self {
		Self
	}
}

impl Parser for YamlParser {
	fn media_type(&self) -> &str {
		"application/x-yaml"
	}

	fn parse(&self, input: &[u8]) -> SerializationResult<Primitive> {
		let value: serde_yaml::Value =
			serde_yaml::from_slice(input).map_err(|e| SerializationError::Parse(e.to_string()))?;
		Ok(from_yaml(value))
	}
}

fn from_yaml(value: serde_yaml::Value) -> Primitive {
	use serde_yaml::Value;

	match value {
		Value::Null => Primitive::null(),
		Value::Bool(b) => Primitive::from(b),
		Value::Number(n) => match n.as_i64() {
			Some(i) => Primitive::from(i),
			None => Primitive::from(n.as_f64().unwrap_or(f64::NAN)),
		},
		Value::String(s) => Primitive::from(s),
		Value::Sequence(items) => {
			Primitive::from(items.into_iter().map(from_yaml).collect::<Vec<_>>())
		}
		Value::Mapping(mapping) => {
			let mut map = PrimitiveMap::new();
			for (key, value) in mapping {
				map.insert(yaml_key(key), from_yaml(value));
			}
			Primitive::Map(map)
		}
		Value::Tagged(tagged) => from_yaml(tagged.value),
	}
}

fn yaml_key(key: serde_yaml::Value) -> String {
	use serde_yaml::Value;

	match key {
		Value::String(s) => s,
		Value::Bool(b) => b.to_string(),
		Value::Number(n) => n.to_string(),
		Value::Null => "null".to_string(),
		other => serde_yaml::to_string(&other)
			.map(|s| s.trim_end().to_string())
			.unwrap_or_default(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	fn test_render_block_mapping() {
		let data = Primitive::from(json!({"a": 1, "b": "foo", "c": true}));
		let output = YamlRenderer::new()
			.render_to_string(&data, &RenderOptions::new())
			.unwrap();
		assert_eq!(output, "a: 1\nb: foo\nc: true\n");
	}

	#[rstest]
	fn test_parse_round_trip() {
		let data = Primitive::from(json!([{"pk": 1, "model": "app.pet", "fields": {"name": "Rex"}}]));
		let output = YamlRenderer::new()
			.render_to_string(&data, &RenderOptions::new())
			.unwrap();
		let parsed = YamlParser::new().parse(output.as_bytes()).unwrap();
		assert_eq!(parsed, data);
	}

	#[rstest]
	fn test_parse_invalid_yaml() {
		let result = YamlParser::new().parse(b"a: [1, 2");
		assert!(matches!(result, Err(SerializationError::Parse(_))));
	}
}
