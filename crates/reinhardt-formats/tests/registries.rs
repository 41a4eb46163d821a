//! Round trips through the registered renderers and parsers.

use reinhardt_formats::{ParserRegistry, RenderOptions, RendererRegistry};
use reinhardt_primitives::{FieldMeta, Primitive, PrimitiveMap};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn records() -> Primitive {
	Primitive::from(json!([
		{"pk": 1, "model": "races.racer", "fields": {"name": "Jane", "age": 30}},
		{"pk": 2, "model": "races.racer", "fields": {"name": "Mike", "age": null}},
	]))
}

#[rstest]
#[case("json")]
#[cfg_attr(feature = "yaml", case("yaml"))]
fn test_structured_formats_round_trip(records: Primitive, #[case] format: &str) {
	let text = RendererRegistry::dumpdata()
		.get(format)
		.unwrap()
		.render_to_string(&records, &RenderOptions::new())
		.unwrap();
	let parsed = ParserRegistry::dumpdata()
		.get(format)
		.unwrap()
		.parse(text.as_bytes())
		.unwrap();
	assert_eq!(parsed, records);
}

#[rstest]
fn test_dumpdata_xml_round_trip_keeps_text() {
	let mut fields = PrimitiveMap::new();
	fields.insert_with_meta(
		"name",
		"Jane",
		FieldMeta::new(1).with_attributes(vec![("type".into(), "CharField".into())]),
	);
	fields.insert_with_meta(
		"age",
		30i64,
		FieldMeta::new(2).with_attributes(vec![("type".into(), "IntegerField".into())]),
	);
	let mut envelope = PrimitiveMap::new();
	envelope.insert("pk", 1i64);
	envelope.insert("model", "races.racer");
	envelope.insert("fields", fields);
	let data = Primitive::from(vec![Primitive::Map(envelope)]);

	let text = RendererRegistry::dumpdata()
		.get("xml")
		.unwrap()
		.render_to_string(&data, &RenderOptions::new())
		.unwrap();
	let parsed = ParserRegistry::dumpdata()
		.get("xml")
		.unwrap()
		.parse(text.as_bytes())
		.unwrap();

	assert_eq!(
		parsed,
		Primitive::from(json!([
			{"pk": "1", "model": "races.racer", "fields": {"name": "Jane", "age": "30"}}
		]))
	);
}

#[rstest]
fn test_json_sort_keys_and_indent() {
	let data = Primitive::from(json!({"b": 1, "a": {"d": 2, "c": 3}}));
	let renderer = RendererRegistry::default().get("json").unwrap();

	let sorted = renderer
		.render_to_string(&data, &RenderOptions::new().with_sort_keys(true))
		.unwrap();
	assert_eq!(sorted, r#"{"a": {"c": 3, "d": 2}, "b": 1}"#);

	let pretty = renderer
		.render_to_string(&data, &RenderOptions::new().with_indent(2))
		.unwrap();
	assert!(pretty.starts_with("{\n  \"b\": 1,\n"));
}
