//! Error types for the serialization crates.
//!
//! Every stage of the pipeline (conversion, reversion, rendering and parsing)
//! reports failures through [`SerializationError`].

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

/// Machine-distinguishable reason attached to a [`ValidationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
	/// The value could not be coerced to the target type.
	Invalid,
	/// The value looked like a date but is not a valid calendar date.
	InvalidDate,
	/// The value looked like a datetime but is not a valid one.
	InvalidDatetime,
	/// The value is longer than the declared maximum length.
	MaxLength,
}

impl ErrorCode {
	/// Returns the stable string form of the code.
	pub fn as_str(&self) -> &'static str {
		match self {
			ErrorCode::Invalid => "invalid",
			ErrorCode::InvalidDate => "invalid_date",
			ErrorCode::InvalidDatetime => "invalid_datetime",
			ErrorCode::MaxLength => "max_length",
		}
	}
}

impl fmt::Display for ErrorCode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// A single scalar failed type coercion or validation during reversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
	/// Reason code.
	pub code: ErrorCode,
	/// Textual form of the offending value.
	pub value: String,
	/// Human readable message.
	pub message: String,
}

impl ValidationError {
	/// Creates a validation error.
	pub fn new(code: ErrorCode, value: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			code,
			value: value.into(),
			message: message.into(),
		}
	}

	/// Creates an `invalid` validation error.
	pub fn invalid(value: impl Into<String>, message: impl Into<String>) -> Self {
		Self::new(ErrorCode::Invalid, value, message)
	}
}

/// Validation errors collected per field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
	errors: IndexMap<String, Vec<ValidationError>>,
}

impl ValidationErrors {
	/// Creates an empty report.
	pub fn new() -> Self {
		Self::default()
	}

	/// Records an error against a field.
	pub fn add(&mut self, field: impl Into<String>, error: ValidationError) {
		self.errors.entry(field.into()).or_default().push(error);
	}

	/// Merges another report, prefixing its field names with `prefix.`.
	pub fn merge(&mut self, prefix: &str, other: ValidationErrors) {
		for (field, errors) in other.errors {
			let key = if prefix.is_empty() {
				field
			} else {
				format!("{}.{}", prefix, field)
			};
			self.errors.entry(key).or_default().extend(errors);
		}
	}

	/// Returns the errors recorded for `field`.
	pub fn get(&self, field: &str) -> Option<&[ValidationError]> {
		self.errors.get(field).map(Vec::as_slice)
	}

	/// Iterates over `(field, errors)` in the order fields failed.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[ValidationError])> {
		self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
	}

	/// Number of fields with errors.
	pub fn len(&self) -> usize {
		self.errors.len()
	}

	/// Returns true if no errors were recorded.
	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}
}

impl fmt::Display for ValidationErrors {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for (field, errors) in &self.errors {
			for error in errors {
				if !first {
					f.write_str("; ")?;
				}
				first = false;
				write!(f, "{}: {}", field, error)?;
			}
		}
		Ok(())
	}
}

/// Errors that can occur while serializing or deserializing.
#[derive(Debug, Error)]
pub enum SerializationError {
	/// A scalar failed coercion during reversion.
	#[error("Validation error: {0}")]
	Validation(#[from] ValidationError),

	/// Field errors collected in validate-all mode.
	#[error("Validation failed: {0}")]
	Invalid(ValidationErrors),

	/// A declared field has no matching attribute on the object.
	#[error("'{type_name}' object has no attribute '{attribute}'")]
	MissingAttribute {
		/// Type of the object being converted.
		type_name: String,
		/// Name of the missing attribute.
		attribute: String,
	},

	/// The target type lacks a capability needed for reversion.
	#[error("Model '{model}' does not support {capability}")]
	CapabilityMissing {
		/// Label of the model type.
		model: String,
		/// The missing capability.
		capability: &'static str,
	},

	/// Format name not present in the active registry.
	#[error("Unknown serialization format: {0}")]
	UnknownFormat(String),

	/// The data does not resolve to a known composite type.
	#[error("Deserialization error: {0}")]
	Deserialization(String),

	/// A renderer could not produce output.
	#[error("Render error: {0}")]
	Render(String),

	/// A parser rejected its input.
	#[error("Parse error: {0}")]
	Parse(String),

	/// I/O operation failed.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON encoding or decoding failed.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl SerializationError {
	/// Creates a [`SerializationError::MissingAttribute`].
	pub fn missing_attribute(type_name: impl Into<String>, attribute: impl Into<String>) -> Self {
		Self::MissingAttribute {
			type_name: type_name.into(),
			attribute: attribute.into(),
		}
	}

	/// Returns the validation error if this is a single-field failure.
	pub fn as_validation(&self) -> Option<&ValidationError> {
		match self {
			SerializationError::Validation(err) => Some(err),
			_ => None,
		}
	}

	/// Returns the collected field errors of a validate-all run.
	pub fn as_invalid(&self) -> Option<&ValidationErrors> {
		match self {
			SerializationError::Invalid(errors) => Some(errors),
			_ => None,
		}
	}
}

/// Result type alias for serialization operations.
pub type SerializationResult<T> = Result<T, SerializationError>;
