//! Top-level serialize and deserialize entry points.

use std::fs;
use std::io::Write;
use std::path::Path;

use reinhardt_formats::Format;
use reinhardt_primitives::{Primitive, SerializationError, SerializationResult};

use crate::deserialized::Deserialized;
use crate::options::{DeserializeOptions, SerializeOptions};
use crate::serializer::Serializer;
use crate::value::Value;

/// Output of a serialize call.
#[derive(Debug)]
pub enum Serialized {
	/// Rendered text.
	Rendered(String),
	/// The primitive tree, for the `python` format.
	Primitive(Primitive),
}

impl Serialized {
	/// The rendered text, if any.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Serialized::Rendered(text) => Some(text),
			Serialized::Primitive(_) => None,
		}
	}

	pub fn into_string(self) -> Option<String> {
		match self {
			Serialized::Rendered(text) => Some(text),
			Serialized::Primitive(_) => None,
		}
	}

	/// The primitive tree, if the call did not render.
	pub fn into_primitive(self) -> Option<Primitive> {
		match self {
			Serialized::Primitive(data) => Some(data),
			Serialized::Rendered(_) => None,
		}
	}
}

/// Input to a deserialize call.
#[derive(Debug)]
pub enum Input {
	Text(String),
	Bytes(Vec<u8>),
	/// An already parsed tree. Parsing is skipped.
	Primitive(Primitive),
}

impl From<&str> for Input {
	fn from(text: &str) -> Self {
		Input::Text(text.to_string())
	}
}

impl From<String> for Input {
	fn from(text: String) -> Self {
		Input::Text(text)
	}
}

impl From<&[u8]> for Input {
	fn from(bytes: &[u8]) -> Self {
		Input::Bytes(bytes.to_vec())
	}
}

impl From<Vec<u8>> for Input {
	fn from(bytes: Vec<u8>) -> Self {
		Input::Bytes(bytes)
	}
}

impl From<Primitive> for Input {
	fn from(data: Primitive) -> Self {
		Input::Primitive(data)
	}
}

/// Serializes `obj` with `serializer` into `format`.
///
/// `python` returns the primitive tree itself.
///
/// # Examples
///
/// ```
/// use reinhardt_serializers::{ObjectSerializer, PlainObject, SerializeOptions, Value, serialize};
///
/// let obj = Value::object(PlainObject::new("ExampleObject").with("a", 1i64).with("b", "foo"));
/// let json = serialize("json", obj, &ObjectSerializer::new(), &SerializeOptions::new()).unwrap();
/// assert_eq!(json.as_str(), Some(r#"{"a": 1, "b": "foo"}"#));
/// ```
pub fn serialize(
	format: &str,
	obj: impl Into<Value>,
	serializer: &Serializer,
	options: &SerializeOptions,
) -> SerializationResult<Serialized> {
	tracing::debug!(format, "serializing");
	serializer.serialize(obj, Some(format), options)
}

/// Serializes `obj` straight into `out`.
pub fn serialize_to_writer(
	format: &str,
	obj: impl Into<Value>,
	serializer: &Serializer,
	options: &SerializeOptions,
	out: &mut dyn Write,
) -> SerializationResult<()> {
	tracing::debug!(format, "serializing to writer");
	serializer.serialize_to_writer(obj, Some(format), options, out)
}

/// Parses `input` as `format` and reverts it with `serializer`.
///
/// `python` expects [`Input::Primitive`] and skips parsing.
pub fn deserialize(
	format: &str,
	input: impl Into<Input>,
	serializer: &Serializer,
	options: &DeserializeOptions,
) -> SerializationResult<Deserialized> {
	tracing::debug!(format, "deserializing");
	serializer.deserialize(input, Some(format), options)
}

fn file_format(path: &Path) -> SerializationResult<Format> {
	Format::from_path(path).ok_or_else(|| {
		SerializationError::UnknownFormat(
			path.extension()
				.and_then(|ext| ext.to_str())
				.unwrap_or("(none)")
				.to_string(),
		)
	})
}

/// Writes a fixture file, choosing the format from the file extension.
///
/// # Errors
///
/// Returns an error if:
/// - The extension is not `json`, `yaml`/`yml` or `xml`
/// - Conversion or rendering fails
/// - The file cannot be written
pub fn serialize_to_file(
	path: impl AsRef<Path>,
	obj: impl Into<Value>,
	serializer: &Serializer,
	options: &SerializeOptions,
) -> SerializationResult<()> {
	let path = path.as_ref();
	let format = file_format(path)?;
	tracing::info!(path = %path.display(), %format, "writing fixture");
	let mut file = fs::File::create(path)?;
	serializer.serialize_to_writer(obj, Some(format.name()), options, &mut file)?;
	file.flush()?;
	Ok(())
}

/// Reads a fixture file, choosing the format from the file extension.
///
/// The whole file is parsed up front; entries revert lazily as the result
/// is iterated.
pub fn deserialize_file(
	path: impl AsRef<Path>,
	serializer: &Serializer,
	options: &DeserializeOptions,
) -> SerializationResult<Deserialized> {
	let path = path.as_ref();
	let format = file_format(path)?;
	tracing::info!(path = %path.display(), %format, "loading fixture");
	let contents = fs::read(path)?;
	serializer.deserialize(contents, Some(format.name()), options)
}
