//! Property-based tests for coercion, constraints and the guard walk.

use metaguard_core::{
    apply_schema, Guard, GuardConfig, Locals, ParamSource, ParameterSchema, ParameterSpec,
    RequestParts,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

// Strategy for JSON scalars a body field might carry
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,20}".prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(|f| json!(f)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // A field without schema or validator is a pure pass-through.
    #[test]
    fn unschematized_values_pass_through(value in scalar_strategy()) {
        let guard = Guard::new(GuardConfig::new().param("field", ParameterSpec::body())).unwrap();
        let ctx = RequestParts::builder().body("field", value.clone()).build();

        let inputs = block_on(guard.validate(&ctx)).unwrap().unwrap();
        prop_assert_eq!(inputs.get("field"), Some(&value));
    }

    // Guards with no parameters never fail and never publish.
    #[test]
    fn empty_guards_publish_nothing(slot in "[a-z]{1,10}", page in "[0-9a-z]{0,5}") {
        let guard = Guard::new(GuardConfig::new().annotate_locals(slot.clone())).unwrap();
        let ctx = RequestParts::builder().query("page", page).build();
        let mut locals = Locals::new();

        prop_assert!(block_on(guard.handle(&ctx, &mut locals)).is_ok());
        prop_assert!(!locals.contains(&slot));
    }

    // Integer text coerces to the same integer.
    #[test]
    fn integer_text_coerces_to_its_value(n in any::<i64>()) {
        let coerced = apply_schema(
            "n",
            &ParamSource::Query,
            Value::String(n.to_string()),
            &ParameterSchema::integer(),
            None,
        );
        prop_assert_eq!(coerced.unwrap(), json!(n));
    }

    // Anything coerces to a string without failing.
    #[test]
    fn string_coercion_never_fails(value in scalar_strategy()) {
        let coerced = apply_schema("s", &ParamSource::Body, value, &ParameterSchema::string(), None);
        prop_assert!(coerced.unwrap().is_string());
    }

    // At the boundary, inclusive bounds accept and exclusive bounds reject.
    #[test]
    fn boundary_inclusive_vs_exclusive(bound in -10_000i64..10_000) {
        let raw = Value::String(bound.to_string());
        let check = |schema: ParameterSchema| {
            apply_schema("n", &ParamSource::Query, raw.clone(), &schema, None)
        };

        prop_assert!(check(ParameterSchema::integer().minimum(bound)).is_ok());
        prop_assert!(check(ParameterSchema::integer().maximum(bound)).is_ok());

        let err = check(ParameterSchema::integer().exclusive_minimum(bound)).unwrap_err();
        prop_assert_eq!(err.to_string(), format!("Invalid param 'n' in query: must be > {bound}"));
        let err = check(ParameterSchema::integer().exclusive_maximum(bound)).unwrap_err();
        prop_assert_eq!(err.to_string(), format!("Invalid param 'n' in query: must be < {bound}"));
    }

    // Absent required fields report the first missing name in declaration order.
    #[test]
    fn first_missing_field_is_reported(names in prop::collection::btree_set("[a-z]{1,8}", 1..5)) {
        let config = names
            .iter()
            .fold(GuardConfig::new(), |config, name| config.param(name.as_str(), ParameterSpec::query().required()));
        let guard = Guard::new(config).unwrap();

        let err = block_on(guard.validate(&RequestParts::default())).unwrap_err();
        let first = names.iter().next().unwrap();
        prop_assert_eq!(err.to_string(), format!("Missing required param '{first}' in query"));
    }
}
