//! CSV rendering.

use std::io::Write;

use reinhardt_primitives::{Primitive, PrimitiveMap, Scalar, SerializationError, SerializationResult};

use crate::renderer::{RenderOptions, Renderer};

/// CSV renderer for flat records.
///
/// The top-level value is either a sequence of mappings or a single mapping.
/// The header row comes from the first record's keys; later records are
/// written in header order with missing keys left empty.
#[derive(Debug, Clone)]
pub struct CsvRenderer {
	/// Field delimiter (default: `,`)
	pub delimiter: u8,
}

impl Default for CsvRenderer {
	fn default() -> Self {
		Self { delimiter: b',' }
	}
}

impl CsvRenderer {
	/// Creates a new CSV renderer
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_formats::CsvRenderer;
	///
	/// let renderer = CsvRenderer::new();
	/// assert_eq!(renderer.delimiter, b',');
	/// ```
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the delimiter character
	pub fn with_delimiter(mut self, delimiter: u8) -> Self {
		self.delimiter = delimiter;
		self
	}
}

fn cell(value: Option<&Primitive>) -> SerializationResult<String> {
	Ok(match value {
		None | Some(Primitive::Scalar(Scalar::Null)) => String::new(),
		Some(Primitive::Scalar(scalar)) => scalar.to_text(),
		Some(nested) => serde_json::to_string(nested)?,
	})
}

fn as_record(item: &Primitive) -> SerializationResult<&PrimitiveMap> {
	item.as_map()
		.ok_or_else(|| SerializationError::Render("CSV rows must be mappings".to_string()))
}

fn records(data: &Primitive) -> SerializationResult<Vec<&PrimitiveMap>> {
	match data {
		Primitive::Seq(seq) => seq.items()?.iter().map(as_record).collect(),
		single => Ok(vec![as_record(single)?]),
	}
}

impl Renderer for CsvRenderer {
	fn media_type(&self) -> &str {
		"text/csv; charset=utf-8"
	}

	fn render(
		&self,
		data: &Primitive,
		out: &mut dyn Write,
		_options: &RenderOptions,
	) -> SerializationResult<()> {
		let rows = records(data)?;
		let mut wtr = ::csv::WriterBuilder::new()
			.delimiter(self.delimiter)
			.terminator(::csv::Terminator::CRLF)
			.from_writer(out);

		let Some(first) = rows.first() else {
			return Ok(());
		};
		let headers: Vec<&str> = first.keys().collect();
		wtr.write_record(&headers)
			.map_err(|e| SerializationError::Render(e.to_string()))?;

		for row in rows {
			let values = headers
				.iter()
				.map(|key| cell(row.get(key)))
				.collect::<SerializationResult<Vec<_>>>()?;
			wtr.write_record(&values)
				.map_err(|e| SerializationError::Render(e.to_string()))?;
		}
		wtr.flush()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serde_json::json;

	fn render(data: serde_json::Value) -> String {
		CsvRenderer::new()
			.render_to_string(&Primitive::from(data), &RenderOptions::new())
			.unwrap()
	}

	#[rstest]
	fn test_sequence_of_records() {
		assert_eq!(
			render(json!([
				{"name": "Jane", "age": 30, "member": true},
				{"name": "Mike, Jr.", "age": null},
			])),
			"name,age,member\r\nJane,30,True\r\n\"Mike, Jr.\",,\r\n"
		);
	}

	#[rstest]
	fn test_single_mapping_is_one_row() {
		assert_eq!(render(json!({"a": 1, "b": "foo"})), "a,b\r\n1,foo\r\n");
	}

	#[rstest]
	fn test_nested_values_are_json_text() {
		assert_eq!(
			render(json!({"tags": ["x", "y"]})),
			"tags\r\n\"[\"\"x\"\",\"\"y\"\"]\"\r\n"
		);
	}

	#[rstest]
	fn test_empty_sequence_renders_nothing() {
		assert_eq!(render(json!([])), "");
	}

	#[rstest]
	fn test_rows_must_be_mappings() {
		let result = CsvRenderer::new().render_to_string(
			&Primitive::from(json!([1, 2])),
			&RenderOptions::new(),
		);
		assert!(matches!(result, Err(SerializationError::Render(_))));
	}
}
