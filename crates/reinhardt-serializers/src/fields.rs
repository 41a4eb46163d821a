//! Typed model fields and the coercions they apply on reversion.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use reinhardt_primitives::{
	ErrorCode, Primitive, PrimitiveMap, Scalar, SerializationError, SerializationResult,
	ValidationError,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::context::{ConvertContext, RevertContext};
use crate::field::{FieldCore, SerializerField};
use crate::model::{FieldDescriptor, ModelFieldType};
use crate::settings::Settings;
use crate::value::{ObjectRef, Value};

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(r"^(?P<year>\d{4})-(?P<month>\d{1,2})-(?P<day>\d{1,2})$")
		.expect("date pattern is valid")
});

static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
	Regex::new(
		r"^(?P<year>\d{4})-(?P<month>\d{1,2})-(?P<day>\d{1,2})[T ](?P<hour>\d{1,2}):(?P<minute>\d{1,2})(?::(?P<second>\d{1,2})(?:\.(?P<microsecond>\d{1,6})\d{0,6})?)?(?P<tzinfo>Z|[+-]\d{2}:?\d{2})?$",
	)
	.expect("datetime pattern is valid")
});

/// Short textual form of a primitive for error messages.
fn describe(value: &Primitive) -> String {
	match value {
		Primitive::Scalar(scalar) => scalar.to_text(),
		Primitive::Seq(seq) => match seq.as_slice() {
			Some(items) => format!(
				"[{}]",
				items.iter().map(describe).collect::<Vec<_>>().join(", ")
			),
			None => "[...]".to_string(),
		},
		Primitive::Map(map) => format!(
			"{{{}}}",
			map.iter()
				.map(|(key, value)| format!("{}: {}", key, describe(value)))
				.collect::<Vec<_>>()
				.join(", ")
		),
	}
}

/// Null, `""`, an empty sequence or an empty mapping.
pub(crate) fn is_empty_value(value: &Primitive) -> bool {
	match value {
		Primitive::Scalar(Scalar::Null) => true,
		Primitive::Scalar(Scalar::Str(s)) => s.is_empty(),
		Primitive::Seq(seq) => seq.as_slice().is_some_and(<[Primitive]>::is_empty),
		Primitive::Map(map) => map.is_empty(),
		_ => false,
	}
}

fn invalid(value: &Primitive, message: &str) -> SerializationError {
	let text = describe(value);
	ValidationError::invalid(text.clone(), format!("'{}' {}", text, message)).into()
}

/// Coerces to a boolean.
///
/// Accepts booleans, `1`/`0` and the strings `t`, `True`, `1`, `f`, `False`
/// and `0`.
pub fn coerce_boolean(value: &Primitive) -> SerializationResult<Value> {
	let parsed = match value.as_scalar() {
		Some(Scalar::Bool(b)) => Some(*b),
		Some(Scalar::Int(1)) => Some(true),
		Some(Scalar::Int(0)) => Some(false),
		Some(Scalar::Float(f)) if *f == 1.0 => Some(true),
		Some(Scalar::Float(f)) if *f == 0.0 => Some(false),
		Some(Scalar::Decimal(d)) if *d == Decimal::ONE => Some(true),
		Some(Scalar::Decimal(d)) if d.is_zero() => Some(false),
		Some(Scalar::Str(s)) => match s.as_str() {
			"t" | "True" | "1" => Some(true),
			"f" | "False" | "0" => Some(false),
			_ => None,
		},
		_ => None,
	};
	parsed
		.map(Value::from)
		.ok_or_else(|| invalid(value, "value must be either True or False."))
}

/// Coerces to an integer. Empty values become null.
pub fn coerce_integer(value: &Primitive) -> SerializationResult<Value> {
	if is_empty_value(value) {
		return Ok(Value::null());
	}
	let parsed = match value.as_scalar() {
		Some(Scalar::Int(i)) => Some(*i),
		Some(Scalar::Bool(b)) => Some(i64::from(*b)),
		Some(Scalar::Float(f)) if f.is_finite() => Some(f.trunc() as i64),
		Some(Scalar::Decimal(d)) => d.trunc().to_i64(),
		Some(Scalar::Str(s)) => s.trim().parse::<i64>().ok(),
		_ => None,
	};
	parsed
		.map(Value::from)
		.ok_or_else(|| invalid(value, "value must be an integer."))
}

/// Coerces to a decimal number. Empty values become null.
pub fn coerce_decimal(value: &Primitive) -> SerializationResult<Value> {
	if is_empty_value(value) {
		return Ok(Value::null());
	}
	let parsed = match value.as_scalar() {
		Some(Scalar::Decimal(d)) => Some(*d),
		Some(Scalar::Int(i)) => Some(Decimal::from(*i)),
		Some(Scalar::Float(f)) => Decimal::try_from(*f).ok(),
		Some(Scalar::Str(s)) => Decimal::from_str(s.trim()).ok(),
		_ => None,
	};
	parsed
		.map(Value::from)
		.ok_or_else(|| invalid(value, "value must be a decimal number."))
}

/// Coerces to a float. Empty values become null.
pub fn coerce_float(value: &Primitive) -> SerializationResult<Value> {
	if is_empty_value(value) {
		return Ok(Value::null());
	}
	let parsed = match value.as_scalar() {
		Some(Scalar::Float(f)) => Some(*f),
		Some(Scalar::Int(i)) => Some(*i as f64),
		Some(Scalar::Decimal(d)) => d.to_f64(),
		Some(Scalar::Str(s)) => s.trim().parse::<f64>().ok(),
		_ => None,
	};
	parsed
		.map(Value::from)
		.ok_or_else(|| invalid(value, "value must be a float."))
}

/// Coerces to text, enforcing `max_length` when given.
pub fn coerce_text(value: &Primitive, max_length: Option<usize>) -> SerializationResult<Value> {
	let text = match value {
		Primitive::Scalar(Scalar::Null) => return Ok(Value::null()),
		Primitive::Scalar(Scalar::Str(s)) => s.clone(),
		Primitive::Scalar(scalar) => scalar.to_text(),
		other => return Value::from_primitive(other),
	};
	if let Some(max_length) = max_length {
		let length = text.chars().count();
		if length > max_length {
			return Err(ValidationError::new(
				ErrorCode::MaxLength,
				text,
				format!(
					"Ensure this value has at most {} characters (it has {}).",
					max_length, length
				),
			)
			.into());
		}
	}
	Ok(Value::from(text))
}

fn capture<T: FromStr + Default>(captures: &regex::Captures<'_>, name: &str) -> T {
	captures
		.name(name)
		.and_then(|m| m.as_str().parse().ok())
		.unwrap_or_default()
}

/// Parses `YYYY-MM-DD`. `Ok(None)` means the text does not have that shape;
/// an error means it has the shape but names no calendar date.
fn parse_date(text: &str) -> Result<Option<NaiveDate>, ()> {
	let Some(captures) = DATE_RE.captures(text) else {
		return Ok(None);
	};
	calendar_date(&captures).map(Some).ok_or(())
}

/// Calendar years start at 1; chrono's proleptic year 0 is rejected.
fn calendar_date(captures: &regex::Captures<'_>) -> Option<NaiveDate> {
	let year: i32 = capture(captures, "year");
	if year < 1 {
		return None;
	}
	NaiveDate::from_ymd_opt(year, capture(captures, "month"), capture(captures, "day"))
}

enum ParsedDateTime {
	Naive(NaiveDateTime),
	Aware(DateTime<FixedOffset>),
}

fn parse_offset(tzinfo: &str) -> Option<FixedOffset> {
	if tzinfo == "Z" {
		return FixedOffset::east_opt(0);
	}
	let sign = if tzinfo.starts_with('-') { -1 } else { 1 };
	let digits: String = tzinfo[1..].chars().filter(char::is_ascii_digit).collect();
	let hours: i32 = digits.get(..2)?.parse().ok()?;
	let minutes: i32 = digits.get(2..)?.parse().ok()?;
	FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses a datetime in the forms accepted by the datetime fields.
fn parse_datetime(text: &str) -> Result<Option<ParsedDateTime>, ()> {
	let Some(captures) = DATETIME_RE.captures(text) else {
		return Ok(None);
	};
	let date = calendar_date(&captures).ok_or(())?;
	let micros: u32 = captures
		.name("microsecond")
		.map(|m| format!("{:0<6}", m.as_str()))
		.and_then(|padded| padded.parse().ok())
		.unwrap_or_default();
	let time = NaiveTime::from_hms_micro_opt(
		capture(&captures, "hour"),
		capture(&captures, "minute"),
		capture(&captures, "second"),
		micros,
	)
	.ok_or(())?;
	let naive = date.and_time(time);
	match captures.name("tzinfo") {
		Some(tzinfo) => {
			let offset = parse_offset(tzinfo.as_str()).ok_or(())?;
			offset
				.from_local_datetime(&naive)
				.single()
				.map(|dt| Some(ParsedDateTime::Aware(dt)))
				.ok_or(())
		}
		None => Ok(Some(ParsedDateTime::Naive(naive))),
	}
}

const DATE_INVALID: &str = "value has an invalid date format. It must be in YYYY-MM-DD format.";
const DATE_INVALID_DATE: &str =
	"value has the correct format (YYYY-MM-DD) but it is an invalid date.";
const DATETIME_INVALID: &str =
	"value has an invalid format. It must be in YYYY-MM-DD HH:MM[:ss[.uuuuuu]][TZ] format.";
const DATETIME_INVALID_DATETIME: &str = "value has the correct format (YYYY-MM-DD HH:MM[:ss[.uuuuuu]][TZ]) but it is an invalid date/time.";

fn validation(code: ErrorCode, text: &str, message: &str) -> SerializationError {
	ValidationError::new(code, text, format!("'{}' {}", text, message)).into()
}

/// Coerces to a date.
///
/// Datetimes are cut to their date part. With timezone support active, an
/// aware datetime is first converted to the configured zone.
pub fn coerce_date(value: &Primitive, settings: &Settings) -> SerializationResult<Value> {
	match value.as_scalar() {
		Some(Scalar::Null) => Ok(Value::null()),
		Some(Scalar::Date(date)) => Ok(Value::from(*date)),
		Some(Scalar::DateTime(dt)) => Ok(Value::from(dt.date())),
		Some(Scalar::DateTimeTz(dt)) if settings.use_tz => {
			Ok(Value::from(dt.with_timezone(&settings.time_zone).date_naive()))
		}
		Some(Scalar::DateTimeTz(dt)) => Ok(Value::from(dt.date_naive())),
		Some(Scalar::Str(text)) => match parse_date(text) {
			Ok(Some(date)) => Ok(Value::from(date)),
			Ok(None) => Err(validation(ErrorCode::Invalid, text, DATE_INVALID)),
			Err(()) => Err(validation(ErrorCode::InvalidDate, text, DATE_INVALID_DATE)),
		},
		_ => Err(validation(ErrorCode::Invalid, &describe(value), DATE_INVALID)),
	}
}

/// Makes a naive datetime aware when timezone support is active.
fn reconcile(naive: NaiveDateTime, settings: &Settings) -> SerializationResult<Value> {
	if !settings.use_tz {
		return Ok(Value::from(naive));
	}
	tracing::warn!(
		value = %naive,
		"DateTimeField received a naive datetime while time zone support is active"
	);
	settings
		.time_zone
		.from_local_datetime(&naive)
		.earliest()
		.map(|aware| Value::from(aware.fixed_offset()))
		.ok_or_else(|| {
			let text = naive.to_string();
			validation(ErrorCode::InvalidDatetime, &text, DATETIME_INVALID_DATETIME)
		})
}

/// Coerces to a datetime.
///
/// Dates become midnight. Naive results are localised to the configured
/// zone when timezone support is active.
pub fn coerce_datetime(value: &Primitive, settings: &Settings) -> SerializationResult<Value> {
	match value.as_scalar() {
		Some(Scalar::Null) => Ok(Value::null()),
		Some(Scalar::DateTimeTz(dt)) => Ok(Value::from(*dt)),
		Some(Scalar::DateTime(dt)) => reconcile(*dt, settings),
		Some(Scalar::Date(date)) => reconcile(date.and_time(NaiveTime::MIN), settings),
		Some(Scalar::Str(text)) => {
			match parse_datetime(text) {
				Ok(Some(ParsedDateTime::Aware(dt))) => return Ok(Value::from(dt)),
				Ok(Some(ParsedDateTime::Naive(dt))) => return reconcile(dt, settings),
				Ok(None) => {}
				Err(()) => {
					return Err(validation(
						ErrorCode::InvalidDatetime,
						text,
						DATETIME_INVALID_DATETIME,
					));
				}
			}
			match parse_date(text) {
				Ok(Some(date)) => reconcile(date.and_time(NaiveTime::MIN), settings),
				Ok(None) => Err(validation(ErrorCode::Invalid, text, DATETIME_INVALID)),
				Err(()) => Err(validation(ErrorCode::InvalidDate, text, DATE_INVALID_DATE)),
			}
		}
		_ => Err(validation(ErrorCode::Invalid, &describe(value), DATETIME_INVALID)),
	}
}

/// Applies the coercion of a model field type. Relation types are coerced
/// like the primary key of the related model.
pub(crate) fn coerce_for_type(
	field_type: &ModelFieldType,
	value: &Primitive,
	settings: &Settings,
) -> SerializationResult<Value> {
	match field_type {
		ModelFieldType::Auto
		| ModelFieldType::Integer
		| ModelFieldType::PositiveInteger
		| ModelFieldType::ForeignKey
		| ModelFieldType::OneToOne => coerce_integer(value),
		ModelFieldType::Boolean => coerce_boolean(value),
		ModelFieldType::Char { .. } | ModelFieldType::Text => coerce_text(value, None),
		ModelFieldType::Date => coerce_date(value, settings),
		ModelFieldType::DateTime => coerce_datetime(value, settings),
		ModelFieldType::Decimal => coerce_decimal(value),
		ModelFieldType::Float => coerce_float(value),
		ModelFieldType::ManyToMany => Value::from_primitive(value),
	}
}

/// The field type keys of the model `descriptor` points at are stored as.
pub(crate) fn key_type(descriptor: &FieldDescriptor, ctx: &RevertContext) -> ModelFieldType {
	descriptor
		.relation
		.as_ref()
		.and_then(|relation| ctx.registry().get(&relation.to))
		.map(|model| model.meta().root_pk().field_type.clone())
		.filter(|field_type| !matches!(field_type, ModelFieldType::ManyToMany))
		.unwrap_or(ModelFieldType::Integer)
}

/// Coerces `value` the way the model field `descriptor` stores it.
pub(crate) fn coerce_for_descriptor(
	descriptor: &FieldDescriptor,
	value: &Primitive,
	ctx: &RevertContext,
) -> SerializationResult<Value> {
	if descriptor.is_relation() {
		let key_type = key_type(descriptor, ctx);
		if let Primitive::Seq(seq) = value {
			return Ok(Value::List(
				seq.items()?
					.iter()
					.map(|item| coerce_for_type(&key_type, item, ctx.settings()))
					.collect::<SerializationResult<_>>()?,
			));
		}
		return coerce_for_type(&key_type, value, ctx.settings());
	}
	coerce_for_type(&descriptor.field_type, value, ctx.settings())
}

fn type_attribute(descriptor: Option<&FieldDescriptor>, own: &str) -> Vec<(String, String)> {
	let internal_type = descriptor.map_or(own, |d| d.field_type.internal_type());
	vec![("type".to_string(), internal_type.to_string())]
}

/// A field bound to a model field; reports its storage type to adapters.
#[derive(Debug, Clone, Default)]
pub struct ModelField {
	core: FieldCore,
}

impl ModelField {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SerializerField for ModelField {
	fn core(&self) -> &FieldCore {
		&self.core
	}

	fn attributes(&self, descriptor: Option<&FieldDescriptor>) -> Vec<(String, String)> {
		descriptor
			.map(|d| type_attribute(Some(d), ""))
			.unwrap_or_default()
	}
}

macro_rules! typed_field {
	($(#[$doc:meta])* $name:ident, $internal_type:literal, |$value:ident, $ctx:ident| $coerce:expr) => {
		$(#[$doc])*
		#[derive(Debug, Clone, Default)]
		pub struct $name {
			core: FieldCore,
		}

		impl $name {
			pub fn new() -> Self {
				Self::default()
			}

			pub fn label(label: impl Into<String>) -> Self {
				Self {
					core: FieldCore::new().with_label(label),
				}
			}
		}

		impl SerializerField for $name {
			fn core(&self) -> &FieldCore {
				&self.core
			}

			fn revert(&self, $value: &Primitive, $ctx: &RevertContext) -> SerializationResult<Value> {
				$coerce
			}

			fn attributes(&self, descriptor: Option<&FieldDescriptor>) -> Vec<(String, String)> {
				type_attribute(descriptor, $internal_type)
			}
		}
	};
}

typed_field!(
	/// Reverts `True`/`False` and their textual forms.
	BooleanField,
	"BooleanField",
	|value, _ctx| coerce_boolean(value)
);

typed_field!(
	/// Reverts integers; empty values become null.
	IntegerField,
	"IntegerField",
	|value, _ctx| coerce_integer(value)
);

typed_field!(
	/// Reverts `YYYY-MM-DD` dates.
	DateField,
	"DateField",
	|value, ctx| coerce_date(value, ctx.settings())
);

typed_field!(
	/// Reverts datetimes, reconciling them with the timezone settings.
	DateTimeField,
	"DateTimeField",
	|value, ctx| coerce_datetime(value, ctx.settings())
);

typed_field!(DecimalField, "DecimalField", |value, _ctx| coerce_decimal(value));

typed_field!(FloatField, "FloatField", |value, _ctx| coerce_float(value));

/// Reverts text, optionally bounded in length.
///
/// # Examples
///
/// ```
/// use reinhardt_serializers::CharField;
///
/// let content = CharField::new().with_max_length(20);
/// # let _ = content;
/// ```
#[derive(Debug, Clone, Default)]
pub struct CharField {
	core: FieldCore,
	max_length: Option<usize>,
}

impl CharField {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_max_length(mut self, max_length: usize) -> Self {
		self.max_length = Some(max_length);
		self
	}

	pub fn with_label(mut self, label: impl Into<String>) -> Self {
		self.core = self.core.with_label(label);
		self
	}
}

impl SerializerField for CharField {
	fn core(&self) -> &FieldCore {
		&self.core
	}

	fn revert(&self, value: &Primitive, _ctx: &RevertContext) -> SerializationResult<Value> {
		coerce_text(value, self.max_length)
	}

	fn attributes(&self, descriptor: Option<&FieldDescriptor>) -> Vec<(String, String)> {
		type_attribute(descriptor, "CharField")
	}
}

/// The typed field used for a non-relation model field.
pub fn field_for_descriptor(descriptor: &FieldDescriptor) -> Arc<dyn SerializerField> {
	match descriptor.field_type {
		ModelFieldType::Auto | ModelFieldType::Integer | ModelFieldType::PositiveInteger => {
			Arc::new(IntegerField::new())
		}
		ModelFieldType::Boolean => Arc::new(BooleanField::new()),
		ModelFieldType::Char { .. } | ModelFieldType::Text => Arc::new(CharField::new()),
		ModelFieldType::DateTime => Arc::new(DateTimeField::new()),
		ModelFieldType::Date => Arc::new(DateField::new()),
		ModelFieldType::Decimal => Arc::new(DecimalField::new()),
		ModelFieldType::Float => Arc::new(FloatField::new()),
		ModelFieldType::ForeignKey | ModelFieldType::OneToOne | ModelFieldType::ManyToMany => {
			Arc::new(ModelField::new())
		}
	}
}

/// Writes the owner's model label, e.g. `races.raceentry`.
///
/// Reverting does nothing: the label is envelope metadata, not an attribute.
#[derive(Debug, Clone, Default)]
pub struct ModelNameField {
	core: FieldCore,
}

impl ModelNameField {
	pub fn new() -> Self {
		Self::default()
	}
}

impl SerializerField for ModelNameField {
	fn core(&self) -> &FieldCore {
		&self.core
	}

	fn convert_field(
		&self,
		obj: &ObjectRef,
		_name: &str,
		_ctx: &ConvertContext,
	) -> SerializationResult<Primitive> {
		obj.model_meta()
			.map(|meta| Primitive::from(meta.label()))
			.ok_or_else(|| SerializationError::missing_attribute(obj.type_name(), "_meta"))
	}

	fn revert_field(
		&self,
		_data: &PrimitiveMap,
		_name: &str,
		_into: &mut IndexMap<String, Value>,
		_ctx: &RevertContext,
	) -> SerializationResult<()> {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Timelike;
	use rstest::rstest;

	fn settings() -> Settings {
		Settings::default()
	}

	#[rstest]
	#[case(Primitive::from(true), true)]
	#[case(Primitive::from(0i64), false)]
	#[case(Primitive::from("t"), true)]
	#[case(Primitive::from("True"), true)]
	#[case(Primitive::from("1"), true)]
	#[case(Primitive::from("f"), false)]
	#[case(Primitive::from("False"), false)]
	#[case(Primitive::from("0"), false)]
	fn test_boolean_accepts(#[case] input: Primitive, #[case] expected: bool) {
		assert_eq!(coerce_boolean(&input).unwrap(), Value::from(expected));
	}

	#[rstest]
	fn test_boolean_rejects() {
		let err = coerce_boolean(&Primitive::from("yes")).unwrap_err();
		let err = err.as_validation().unwrap();
		assert_eq!(err.code, ErrorCode::Invalid);
		assert_eq!(err.message, "'yes' value must be either True or False.");
	}

	#[rstest]
	#[case(Primitive::null())]
	#[case(Primitive::from(""))]
	#[case(Primitive::from(Vec::new()))]
	#[case(Primitive::Map(PrimitiveMap::new()))]
	fn test_integer_empty_values_are_null(#[case] input: Primitive) {
		assert!(coerce_integer(&input).unwrap().is_null());
	}

	#[rstest]
	#[case(Primitive::from("42"), 42)]
	#[case(Primitive::from(" 7 "), 7)]
	#[case(Primitive::from(3.9), 3)]
	#[case(Primitive::from(true), 1)]
	fn test_integer_parses(#[case] input: Primitive, #[case] expected: i64) {
		assert_eq!(coerce_integer(&input).unwrap(), Value::from(expected));
	}

	#[rstest]
	fn test_integer_rejects_text() {
		let err = coerce_integer(&Primitive::from("abc")).unwrap_err();
		assert_eq!(
			err.as_validation().unwrap().message,
			"'abc' value must be an integer."
		);
	}

	#[rstest]
	fn test_max_length() {
		let value = Primitive::from("x".repeat(100));
		let err = coerce_text(&value, Some(20)).unwrap_err();
		let err = err.as_validation().unwrap();
		assert_eq!(err.code, ErrorCode::MaxLength);
		assert_eq!(
			err.message,
			"Ensure this value has at most 20 characters (it has 100)."
		);
		assert!(coerce_text(&value, Some(100)).is_ok());
	}

	#[rstest]
	fn test_text_stringifies_scalars() {
		assert_eq!(coerce_text(&Primitive::from(5i64), None).unwrap(), Value::from("5"));
		assert!(coerce_text(&Primitive::null(), Some(1)).unwrap().is_null());
	}

	#[rstest]
	fn test_date_errors() {
		let settings = settings();
		let bad_shape = coerce_date(&Primitive::from("2012/01/01"), &settings).unwrap_err();
		assert_eq!(bad_shape.as_validation().unwrap().code, ErrorCode::Invalid);

		let bad_date = coerce_date(&Primitive::from("2012-02-30"), &settings).unwrap_err();
		let bad_date = bad_date.as_validation().unwrap();
		assert_eq!(bad_date.code, ErrorCode::InvalidDate);
		assert_eq!(
			bad_date.message,
			"'2012-02-30' value has the correct format (YYYY-MM-DD) but it is an invalid date."
		);
	}

	#[rstest]
	#[case("0000-01-01")]
	#[case("0000-12-31")]
	fn test_date_before_year_one_is_invalid(#[case] text: &str) {
		let err = coerce_date(&Primitive::from(text), &settings()).unwrap_err();
		assert_eq!(err.as_validation().unwrap().code, ErrorCode::InvalidDate);
	}

	#[rstest]
	fn test_date_from_datetime() {
		let dt = NaiveDate::from_ymd_opt(2012, 4, 30)
			.unwrap()
			.and_hms_opt(9, 0, 0)
			.unwrap();
		assert_eq!(
			coerce_date(&Primitive::from(dt), &settings()).unwrap(),
			Value::from(dt.date())
		);
	}

	#[rstest]
	#[case("2012-04-30 09:00:00", 9, 0)]
	#[case("2012-04-30T09:30", 9, 30)]
	fn test_datetime_parses(#[case] text: &str, #[case] hour: u32, #[case] minute: u32) {
		let value = coerce_datetime(&Primitive::from(text), &settings()).unwrap();
		match value.as_scalar() {
			Some(Scalar::DateTime(dt)) => {
				assert_eq!(dt.hour(), hour);
				assert_eq!(dt.minute(), minute);
			}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[rstest]
	fn test_datetime_microseconds_are_right_padded() {
		let value = coerce_datetime(&Primitive::from("2012-04-30 09:00:00.12"), &settings()).unwrap();
		match value.as_scalar() {
			Some(Scalar::DateTime(dt)) => assert_eq!(dt.nanosecond(), 120_000_000),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[rstest]
	fn test_datetime_with_offset_is_aware() {
		let value = coerce_datetime(&Primitive::from("2012-04-30T09:00:00+02:00"), &settings()).unwrap();
		match value.as_scalar() {
			Some(Scalar::DateTimeTz(dt)) => assert_eq!(dt.offset().local_minus_utc(), 7200),
			other => panic!("unexpected {:?}", other),
		}
	}

	#[rstest]
	fn test_datetime_date_only_is_midnight() {
		let value = coerce_datetime(&Primitive::from("2012-04-30"), &settings()).unwrap();
		let expected = NaiveDate::from_ymd_opt(2012, 4, 30)
			.unwrap()
			.and_time(NaiveTime::MIN);
		assert_eq!(value, Value::from(expected));
	}

	#[rstest]
	#[case("2012-04-31 09:00", ErrorCode::InvalidDatetime)]
	#[case("2012-04-31", ErrorCode::InvalidDate)]
	#[case("0000-01-01 10:00", ErrorCode::InvalidDatetime)]
	#[case("0000-01-01", ErrorCode::InvalidDate)]
	#[case("tomorrow", ErrorCode::Invalid)]
	fn test_datetime_error_codes(#[case] text: &str, #[case] code: ErrorCode) {
		let err = coerce_datetime(&Primitive::from(text), &settings()).unwrap_err();
		assert_eq!(err.as_validation().unwrap().code, code);
	}

	#[rstest]
	fn test_naive_datetime_is_localised_when_tz_active() {
		let settings = Settings::default()
			.with_use_tz(true)
			.with_time_zone(chrono_tz::Europe::London);
		let value = coerce_datetime(&Primitive::from("2012-07-01 12:00:00"), &settings).unwrap();
		match value.as_scalar() {
			Some(Scalar::DateTimeTz(dt)) => {
				assert_eq!(dt.offset().local_minus_utc(), 3600);
				assert_eq!(dt.hour(), 12);
			}
			other => panic!("unexpected {:?}", other),
		}
	}

	#[rstest]
	fn test_field_for_descriptor_attributes() {
		let descriptor = FieldDescriptor::char("name", 10);
		let field = field_for_descriptor(&descriptor);
		assert_eq!(
			field.attributes(Some(&descriptor)),
			vec![("type".to_string(), "CharField".to_string())]
		);
		assert_eq!(
			ModelField::new().attributes(Some(&FieldDescriptor::text("bio"))),
			vec![("type".to_string(), "TextField".to_string())]
		);
		assert!(ModelField::new().attributes(None).is_empty());
	}
}
