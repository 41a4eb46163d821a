//! Fixture file formats.

use std::fmt;
use std::path::Path;

/// Formats the file helpers can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Format {
	/// JSON format (default).
	#[default]
	Json,

	/// YAML format (requires `yaml` feature).
	Yaml,

	/// Dumpdata XML format.
	Xml,
}

impl Format {
	/// Determines the format from a file extension.
	///
	/// # Example
	///
	/// ```
	/// # use reinhardt_formats::Format;
	/// assert_eq!(Format::from_extension("json"), Some(Format::Json));
	/// assert_eq!(Format::from_extension("YML"), Some(Format::Yaml));
	/// assert_eq!(Format::from_extension("xml"), Some(Format::Xml));
	/// assert_eq!(Format::from_extension("csv"), None);
	/// ```
	pub fn from_extension(ext: &str) -> Option<Self> {
		match ext.to_lowercase().as_str() {
			"json" => Some(Self::Json),
			"yaml" | "yml" => Some(Self::Yaml),
			"xml" => Some(Self::Xml),
			_ => None,
		}
	}

	/// Determines the format from a file path.
	///
	/// Returns `None` when the path has no recognized extension.
	pub fn from_path(path: &Path) -> Option<Self> {
		path.extension()
			.and_then(|ext| ext.to_str())
			.and_then(Self::from_extension)
	}

	/// The format name used to look up renderers and parsers.
	pub fn name(&self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Yaml => "yaml",
			Self::Xml => "xml",
		}
	}

	/// Returns the default file extension for this format.
	pub fn extension(&self) -> &'static str {
		self.name()
	}

	/// Returns the MIME type for this format.
	pub fn media_type(&self) -> &'static str {
		match self {
			Self::Json => "application/json",
			Self::Yaml => "application/x-yaml",
			Self::Xml => "application/xml",
		}
	}
}

impl fmt::Display for Format {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::path::PathBuf;

	#[rstest]
	#[case("fixtures/users.json", Some(Format::Json))]
	#[case("fixtures/users.yaml", Some(Format::Yaml))]
	#[case("data.XML", Some(Format::Xml))]
	#[case("README", None)]
	fn test_from_path(#[case] path: &str, #[case] expected: Option<Format>) {
		assert_eq!(Format::from_path(&PathBuf::from(path)), expected);
	}

	#[rstest]
	fn test_display_matches_extension() {
		assert_eq!(Format::Yaml.to_string(), "yaml");
		assert_eq!(Format::Xml.media_type(), "application/xml");
	}
}
