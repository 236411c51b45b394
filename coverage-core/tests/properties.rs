use coverage_core::extraction::{extract, parse_json};
use coverage_core::report::{ReportSchema, StructuredReport};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

const KEY: &str = "[a-z_]{1,8}";

// Includes brackets, commas, quotes and backticks so string contents can look like structure.
const TEXT: &str = r#"[a-zA-Z0-9 ,:\[\]{}"\\`]{0,16}"#;

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        TEXT.prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(KEY, inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn report_fields() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map(KEY, json_value(), 1..5).prop_map(|m| m.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_serialized_object_is_its_own_slice(fields in report_fields()) {
        let value = Value::Object(fields);
        let compact = serde_json::to_string(&value).unwrap();
        let pretty = serde_json::to_string_pretty(&value).unwrap();

        prop_assert_eq!(extract(&compact), Some(compact.as_str()));
        prop_assert_eq!(extract(&pretty), Some(pretty.as_str()));
    }

    #[test]
    fn prop_json_fence_yields_interior(
        fields in report_fields(),
        tag in prop_oneof![Just("json"), Just("JSON"), Just("Json")],
        pad in " {0,3}",
    ) {
        let pretty = serde_json::to_string_pretty(&Value::Object(fields)).unwrap();
        let raw = format!("```{pad}{tag}\n{pretty}\n```");

        prop_assert_eq!(extract(&raw), Some(pretty.as_str()));
    }

    #[test]
    fn prop_trailing_comma_parses_to_same_value(
        fields in report_fields(),
        gap in "[ \t\n]{0,3}",
    ) {
        let value = Value::Object(fields);
        let compact = serde_json::to_string(&value).unwrap();
        let broken = format!("{},{gap}}}", &compact[..compact.len() - 1]);

        let (parsed, repaired) = parse_json(&broken).unwrap();
        prop_assert_eq!(parsed, value);
        prop_assert!(repaired);
    }

    #[test]
    fn prop_default_fill_adds_only_missing_keys(
        fields in report_fields(),
        keys in prop::collection::vec(KEY, 0..6),
    ) {
        let schema = ReportSchema::new(keys);
        let report = StructuredReport::from_fields(fields.clone(), &schema);

        for key in schema.keys() {
            match fields.get(key) {
                Some(original) => prop_assert_eq!(report.get(key), Some(original)),
                None => prop_assert_eq!(report.get(key), Some(&json!([]))),
            }
        }
        for (key, original) in &fields {
            prop_assert_eq!(report.get(key), Some(original));
        }

        let absent = schema.keys().iter().filter(|k| !fields.contains_key(*k)).count();
        prop_assert_eq!(report.fields().len(), fields.len() + absent);
    }
}
