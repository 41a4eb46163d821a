//! Serializing plain objects: attribute discovery, field declarations,
//! nesting and recursion.

mod common;

use std::sync::Arc;

use common::{Person, objects, person};
use reinhardt_serializers::{
	Field, Object, ObjectRef, ObjectSerializer, PlainObject, Primitive, SerializationError,
	SerializeOptions, Serializer, Value, serialize,
};
use rstest::{fixture, rstest};
use serde_json::json;

#[fixture]
fn example() -> Value {
	Value::object(
		PlainObject::new("ExampleObject")
			.with("a", 1i64)
			.with("b", "foo")
			.with("c", true)
			.with("_hidden", "other"),
	)
}

#[fixture]
fn john() -> Value {
	Value::object(Person::new("john", "doe", 42))
}

fn python(serializer: &Serializer, obj: Value) -> Primitive {
	python_with(serializer, obj, &SerializeOptions::new())
}

fn python_with(serializer: &Serializer, obj: Value, options: &SerializeOptions) -> Primitive {
	serialize("python", obj, serializer, options)
		.unwrap()
		.into_primitive()
		.unwrap()
		.materialize()
		.unwrap()
}

fn keys(data: &Primitive) -> Vec<&str> {
	data.as_map().unwrap().keys().collect()
}

#[rstest]
#[case::list(Value::List(Vec::new()), "[]")]
#[case::map(Value::Map(Default::default()), "{}")]
fn test_empty_containers(#[case] obj: Value, #[case] expected: &str) {
	let output = serialize("json", obj, &ObjectSerializer::new(), &SerializeOptions::new()).unwrap();
	assert_eq!(output.as_str(), Some(expected));
}

#[rstest]
#[case::json("json", r#"{"a": 1, "b": "foo", "c": true}"#)]
#[case::xml(
	"xml",
	"<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<object><a>1</a><b>foo</b><c>True</c></object>"
)]
#[case::yaml("yaml", "a: 1\nb: foo\nc: true\n")]
fn test_encoders(example: Value, #[case] format: &str, #[case] expected: &str) {
	let output = serialize(format, example, &ObjectSerializer::new(), &SerializeOptions::new())
		.unwrap();
	assert_eq!(output.as_str(), Some(expected));
}

#[rstest]
fn test_serialize_basic_object(example: Value) {
	assert_eq!(
		python(&ObjectSerializer::new(), example),
		Primitive::from(json!({"a": 1, "b": "foo", "c": true}))
	);
}

#[rstest]
fn test_allow_list(example: Value) {
	let serializer = ObjectSerializer::builder().fields(["a", "c"]).build();
	assert_eq!(
		python(&serializer, example),
		Primitive::from(json!({"a": 1, "c": true}))
	);
}

#[rstest]
fn test_deny_list(example: Value) {
	let serializer = ObjectSerializer::builder().exclude(["b"]).build();
	assert_eq!(
		python(&serializer, example),
		Primitive::from(json!({"a": 1, "c": true}))
	);
}

#[rstest]
fn test_call_options_override_declared_lists(example: Value) {
	let serializer = ObjectSerializer::builder().fields(["a", "c"]).build();
	let data = python_with(
		&serializer,
		example,
		&SerializeOptions::new().with_fields(["b"]),
	);
	assert_eq!(data, Primitive::from(json!({"b": "foo"})));
}

#[rstest]
fn test_only_listed_attributes_by_default(john: Value) {
	assert_eq!(
		python(&ObjectSerializer::new(), john),
		Primitive::from(json!({"first_name": "john", "last_name": "doe", "age": 42}))
	);
}

#[rstest]
fn test_properties_can_be_included(john: Value) {
	let serializer = ObjectSerializer::builder()
		.field("full_name", Field::new())
		.fields(["full_name", "age"])
		.build();
	let data = python(&serializer, john);
	assert_eq!(keys(&data), vec!["full_name", "age"]);
	assert_eq!(data, Primitive::from(json!({"full_name": "john doe", "age": 42})));
}

#[rstest]
fn test_accessors_are_invoked(john: Value) {
	let serializer = ObjectSerializer::builder()
		.field("full_name", Field::new())
		.field("is_child", Field::new())
		.fields(["full_name", "is_child"])
		.build();
	assert_eq!(
		python(&serializer, john),
		Primitive::from(json!({"full_name": "john doe", "is_child": false}))
	);
}

#[rstest]
fn test_explicit_fields_replace_defaults(john: Value) {
	let serializer = Serializer::builder()
		.field("full_name", ObjectSerializer::new())
		.build();
	assert_eq!(
		python(&serializer, john),
		Primitive::from(json!({"full_name": "john doe"}))
	);
}

#[rstest]
fn test_declared_fields_come_before_defaults(john: Value) {
	let serializer = ObjectSerializer::builder()
		.field("full_name", ObjectSerializer::new())
		.build();
	let data = python(&serializer, john);
	assert_eq!(keys(&data), vec!["full_name", "first_name", "last_name", "age"]);
}

#[rstest]
fn test_declaration_order_is_preserved(john: Value) {
	let serializer = ObjectSerializer::builder()
		.field("first_name", Field::new())
		.field("full_name", Field::new())
		.field("age", Field::new())
		.field("last_name", Field::new())
		.build();
	assert_eq!(
		keys(&python(&serializer, john)),
		vec!["first_name", "full_name", "age", "last_name"]
	);
}

#[rstest]
fn test_root_field_serializes_the_owner(john: Value) {
	let serializer = ObjectSerializer::builder()
		.field("full_name", ObjectSerializer::new())
		.field("details", ObjectSerializer::builder().is_root(true).build())
		.fields(["full_name", "details"])
		.build();
	assert_eq!(
		python(&serializer, john),
		Primitive::from(json!({
			"full_name": "john doe",
			"details": {"first_name": "john", "last_name": "doe", "age": 42}
		}))
	);
}

#[rstest]
fn test_root_field_with_its_own_allow_list(john: Value) {
	let details = ObjectSerializer::builder()
		.field("first_name", ObjectSerializer::new())
		.field("last_name", ObjectSerializer::new())
		.fields(["first_name", "last_name"])
		.is_root(true)
		.build();
	let serializer = ObjectSerializer::builder()
		.field("full_name", ObjectSerializer::new())
		.field("details", details)
		.fields(["full_name", "details"])
		.build();
	assert_eq!(
		python(&serializer, john),
		Primitive::from(json!({
			"full_name": "john doe",
			"details": {"first_name": "john", "last_name": "doe"}
		}))
	);
}

#[rstest]
fn test_labels(john: Value) {
	let serializer = ObjectSerializer::builder()
		.field("full_name", Field::label("Full name"))
		.field("age", Field::label("Age"))
		.fields(["full_name", "age"])
		.build();
	assert_eq!(
		python(&serializer, john),
		Primitive::from(json!({"Full name": "john doe", "Age": 42}))
	);
}

#[fixture]
fn family() -> Value {
	let fred = person("fred", "bloggs", 41);
	let emily = person("emily", "doe", 37);
	let jane = Arc::new(Person::new("jane", "doe", 44).with("partner", Value::from(fred)));
	Value::object(Person::new("john", "doe", 42).with("siblings", objects(vec![jane, emily])))
}

#[rstest]
fn test_nested_serialization(family: Value) {
	let serializer = ObjectSerializer::builder().nested(true).build();
	assert_eq!(
		python(&serializer, family),
		Primitive::from(json!({
			"first_name": "john",
			"last_name": "doe",
			"age": 42,
			"siblings": [
				{
					"first_name": "jane",
					"last_name": "doe",
					"age": 44,
					"partner": {"first_name": "fred", "last_name": "bloggs", "age": 41}
				},
				{"first_name": "emily", "last_name": "doe", "age": 37}
			]
		}))
	);
}

#[rstest]
fn test_nested_serializer_with_its_own_options(family: Value) {
	let serializer = Serializer::builder()
		.field("full_name", Field::new())
		.field(
			"siblings",
			ObjectSerializer::builder()
				.field("full_name", Field::new())
				.fields(["full_name"])
				.build(),
		)
		.build();
	assert_eq!(
		python(&serializer, family),
		Primitive::from(json!({
			"full_name": "john doe",
			"siblings": [{"full_name": "jane doe"}, {"full_name": "emily doe"}]
		}))
	);
}

#[rstest]
fn test_flat_serialization_uses_display_text(family: Value) {
	let data = python(&ObjectSerializer::new(), family);
	assert_eq!(
		data.as_map().unwrap().get("siblings"),
		Some(&Primitive::from(json!(["jane doe", "emily doe"])))
	);
}

#[rstest]
fn test_depth_one_serialization(family: Value) {
	let serializer = ObjectSerializer::builder().nested(1u32).build();
	assert_eq!(
		python(&serializer, family),
		Primitive::from(json!({
			"first_name": "john",
			"last_name": "doe",
			"age": 42,
			"siblings": [
				{"first_name": "jane", "last_name": "doe", "age": 44, "partner": "fred bloggs"},
				{"first_name": "emily", "last_name": "doe", "age": 37}
			]
		}))
	);
}

#[rstest]
fn test_depth_passed_per_call(family: Value) {
	let data = python_with(
		&ObjectSerializer::new(),
		family,
		&SerializeOptions::new().with_nested(1u32),
	);
	let siblings = data.as_map().unwrap().get("siblings").unwrap();
	let jane = &siblings.as_seq().unwrap().as_slice().unwrap()[0];
	assert_eq!(jane.as_map().unwrap().get("partner"), Some(&Primitive::from("fred bloggs")));
}

#[rstest]
fn test_recursion_falls_back_to_flat_values() {
	let emily = person("emily", "doe", 37);
	let john = Arc::new(Person::new("john", "doe", 42).with("daughter", Value::from(emily.clone())));
	let john_ref: ObjectRef = john.clone();
	emily.set_attribute("father", Value::Object(john_ref)).unwrap();

	let serializer = ObjectSerializer::builder().nested(true).build();
	assert_eq!(
		python(&serializer, Value::from(john)),
		Primitive::from(json!({
			"first_name": "john",
			"last_name": "doe",
			"age": 42,
			"daughter": {
				"first_name": "emily",
				"last_name": "doe",
				"age": 37,
				"father": "john doe"
			}
		}))
	);
}

#[rstest]
fn test_missing_declared_attribute_is_an_error(john: Value) {
	let serializer = ObjectSerializer::builder()
		.field("nickname", Field::new())
		.build();
	let err = serialize("python", john, &serializer, &SerializeOptions::new()).unwrap_err();
	assert!(matches!(err, SerializationError::MissingAttribute { .. }));
	assert_eq!(err.to_string(), "'Person' object has no attribute 'nickname'");
}

#[rstest]
fn test_sorted_and_indented_json(example: Value) {
	let output = serialize(
		"json",
		example,
		&ObjectSerializer::builder().fields(["c", "a"]).build(),
		&SerializeOptions::new().with_sort_keys(true).with_indent(2),
	)
	.unwrap();
	assert_eq!(output.as_str(), Some("{\n  \"a\": 1,\n  \"c\": true\n}"));
}
