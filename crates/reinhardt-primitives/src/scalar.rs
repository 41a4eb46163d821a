//! Protected scalar values.
//!
//! Scalars pass through conversion unchanged. They are the leaves of every
//! primitive tree and of every native value graph.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};

/// A leaf value that conversion never decomposes.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
	Null,
	Bool(bool),
	Int(i64),
	Float(f64),
	Decimal(Decimal),
	Str(String),
	Date(NaiveDate),
	Time(NaiveTime),
	/// Naive (timezone-less) datetime.
	DateTime(NaiveDateTime),
	/// Timezone-aware datetime.
	DateTimeTz(DateTime<FixedOffset>),
}

impl Scalar {
	/// Returns true for [`Scalar::Null`].
	pub fn is_null(&self) -> bool {
		matches!(self, Scalar::Null)
	}

	/// Returns true for dates, times and datetimes.
	pub fn is_temporal(&self) -> bool {
		matches!(
			self,
			Scalar::Date(_) | Scalar::Time(_) | Scalar::DateTime(_) | Scalar::DateTimeTz(_)
		)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Scalar::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Scalar::Int(i) => Some(*i),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Scalar::Bool(b) => Some(*b),
			_ => None,
		}
	}

	/// Textual form used by text-oriented renderers.
	///
	/// Booleans render as `True`/`False`, null as `None` and datetimes with a
	/// space between the date and time parts.
	pub fn to_text(&self) -> String {
		match self {
			Scalar::Null => "None".to_string(),
			Scalar::Bool(true) => "True".to_string(),
			Scalar::Bool(false) => "False".to_string(),
			Scalar::Int(i) => i.to_string(),
			Scalar::Float(f) => format!("{:?}", f),
			Scalar::Decimal(d) => d.to_string(),
			Scalar::Str(s) => s.clone(),
			Scalar::Date(d) => d.format("%Y-%m-%d").to_string(),
			Scalar::Time(t) => format_time(t),
			Scalar::DateTime(dt) => format_datetime(dt, ' '),
			Scalar::DateTimeTz(dt) => {
				format!("{}{}", format_datetime(&dt.naive_local(), ' '), dt.offset())
			}
		}
	}

	/// ISO-8601 text for temporal values, `None` for everything else.
	pub fn isoformat(&self) -> Option<String> {
		match self {
			Scalar::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
			Scalar::Time(t) => Some(format_time(t)),
			Scalar::DateTime(dt) => Some(format_datetime(dt, 'T')),
			Scalar::DateTimeTz(dt) => Some(format!(
				"{}{}",
				format_datetime(&dt.naive_local(), 'T'),
				dt.offset()
			)),
			_ => None,
		}
	}

	/// Text written by the JSON-style encoders.
	///
	/// Sub-second precision is cut to milliseconds and a zero UTC offset is
	/// written as `Z`.
	fn encoder_text(&self) -> Option<String> {
		let iso = self.isoformat()?;
		let iso = match self {
			Scalar::Time(t) if t.nanosecond() / 1_000 != 0 => truncate_micros(&iso),
			Scalar::DateTime(dt) if dt.nanosecond() / 1_000 != 0 => truncate_micros(&iso),
			Scalar::DateTimeTz(dt) if dt.nanosecond() / 1_000 != 0 => truncate_micros(&iso),
			_ => iso,
		};
		match iso.strip_suffix("+00:00") {
			Some(stripped) => Some(format!("{}Z", stripped)),
			None => Some(iso),
		}
	}
}

fn format_time(t: &NaiveTime) -> String {
	let micros = t.nanosecond() / 1_000;
	if micros == 0 {
		t.format("%H:%M:%S").to_string()
	} else {
		format!("{}.{:06}", t.format("%H:%M:%S"), micros)
	}
}

fn format_datetime(dt: &NaiveDateTime, sep: char) -> String {
	format!("{}{}{}", dt.format("%Y-%m-%d"), sep, format_time(&dt.time()))
}

// Drops the last three digits of a six digit fraction: `.123456` -> `.123`.
fn truncate_micros(iso: &str) -> String {
	match iso.find('.') {
		Some(dot) if iso.len() >= dot + 7 => format!("{}{}", &iso[..dot + 4], &iso[dot + 7..]),
		_ => iso.to_string(),
	}
}

impl Serialize for Scalar {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Scalar::Null => serializer.serialize_unit(),
			Scalar::Bool(b) => serializer.serialize_bool(*b),
			Scalar::Int(i) => serializer.serialize_i64(*i),
			Scalar::Float(f) => serializer.serialize_f64(*f),
			Scalar::Decimal(d) => serializer.serialize_str(&d.to_string()),
			Scalar::Str(s) => serializer.serialize_str(s),
			temporal => match temporal.encoder_text() {
				Some(text) => serializer.serialize_str(&text),
				None => serializer.serialize_unit(),
			},
		}
	}
}

impl From<bool> for Scalar {
	fn from(value: bool) -> Self {
		Scalar::Bool(value)
	}
}

impl From<i64> for Scalar {
	fn from(value: i64) -> Self {
		Scalar::Int(value)
	}
}

impl From<i32> for Scalar {
	fn from(value: i32) -> Self {
		Scalar::Int(value.into())
	}
}

impl From<u32> for Scalar {
	fn from(value: u32) -> Self {
		Scalar::Int(value.into())
	}
}

impl From<f64> for Scalar {
	fn from(value: f64) -> Self {
		Scalar::Float(value)
	}
}

impl From<Decimal> for Scalar {
	fn from(value: Decimal) -> Self {
		Scalar::Decimal(value)
	}
}

impl From<&str> for Scalar {
	fn from(value: &str) -> Self {
		Scalar::Str(value.to_string())
	}
}

impl From<String> for Scalar {
	fn from(value: String) -> Self {
		Scalar::Str(value)
	}
}

impl From<NaiveDate> for Scalar {
	fn from(value: NaiveDate) -> Self {
		Scalar::Date(value)
	}
}

impl From<NaiveTime> for Scalar {
	fn from(value: NaiveTime) -> Self {
		Scalar::Time(value)
	}
}

impl From<NaiveDateTime> for Scalar {
	fn from(value: NaiveDateTime) -> Self {
		Scalar::DateTime(value)
	}
}

impl From<DateTime<FixedOffset>> for Scalar {
	fn from(value: DateTime<FixedOffset>) -> Self {
		Scalar::DateTimeTz(value)
	}
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
	fn from(value: Option<T>) -> Self {
		value.map_or(Scalar::Null, Into::into)
	}
}
