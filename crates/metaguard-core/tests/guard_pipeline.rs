//! End-to-end guard behavior through `Guard::handle` and `Guard::call`

use metaguard_core::{
    formatter, try_formatter, GuardConfig, GuardError, Guard, Locals, ParamSource, ParameterSchema,
    ParameterSpec, RequestContext, RequestParts, SyncValidator, Verdict,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Run `config` against `ctx` with locals annotated under "inputs".
async fn run(config: GuardConfig, ctx: &RequestParts) -> (Result<(), GuardError>, Locals) {
    let guard = Guard::new(config.annotate_locals("inputs")).unwrap();
    let mut locals = Locals::new();
    let result = guard.handle(ctx, &mut locals).await;
    (result, locals)
}

fn inputs(locals: &Locals) -> Value {
    locals.get("inputs").expect("inputs published").to_json()
}

fn error_message(result: Result<(), GuardError>) -> String {
    result.unwrap_err().to_string()
}

mod sources {
    use super::*;

    #[tokio::test]
    async fn no_annotation_unless_requested() {
        let guard = Guard::new(GuardConfig::new().param("name", ParameterSpec::path())).unwrap();
        let mut locals = Locals::new();

        guard.handle(&RequestParts::default(), &mut locals).await.unwrap();
        assert!(locals.is_empty());
    }

    #[tokio::test]
    async fn annotation_holds_declared_keys() {
        let config = GuardConfig::new().param("name", ParameterSpec::path());
        let (result, locals) = run(config, &RequestParts::default()).await;

        result.unwrap();
        let published = locals.get("inputs").unwrap();
        assert!(published.contains_key("name"));
        assert_eq!(published.get("name"), None);
    }

    #[tokio::test]
    async fn reads_path_params() {
        let ctx = RequestParts::builder().path("name", "test").build();
        let (result, locals) = run(GuardConfig::new().param("name", ParameterSpec::path()), &ctx).await;

        result.unwrap();
        assert_eq!(inputs(&locals), json!({"name": "test"}));
    }

    #[tokio::test]
    async fn reads_each_source() {
        let ctx = RequestParts::builder()
            .query("count", "10")
            .body("total", 10)
            .header("Authorization", "Bearer 1234")
            .cookie("SessionID", "1234")
            .build();
        let config = GuardConfig::new()
            .param("name", ParameterSpec::path())
            .param("count", ParameterSpec::query())
            .param("total", ParameterSpec::body())
            .param("Authorization", ParameterSpec::header())
            .param("SessionID", ParameterSpec::cookie());

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(
            inputs(&locals),
            json!({
                "count": "10",
                "total": 10,
                "Authorization": "Bearer 1234",
                "SessionID": "1234"
            })
        );
    }

    #[tokio::test]
    async fn unknown_sources_are_ignored() {
        let ctx = RequestParts::builder().query("page", "1").build();
        let config = GuardConfig::new()
            .param("name", ParameterSpec::path())
            .param("page", ParameterSpec::new("invalid"));

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({}));
    }
}

mod schemas {
    use super::*;

    #[tokio::test]
    async fn null_body_field_is_missing() {
        let ctx = RequestParts::builder().body_json(json!({"flagged": null})).build();
        let config = GuardConfig::new().param(
            "flagged",
            ParameterSpec::body().required().schema(ParameterSchema::string()),
        );

        let (result, locals) = run(config, &ctx).await;
        assert_eq!(error_message(result), "Missing required param 'flagged' in body");
        assert!(locals.get("inputs").is_none());
    }

    #[tokio::test]
    async fn unknown_schema_types_pass_through() {
        let ctx = RequestParts::builder().body("flagged", 1).build();
        let config: GuardConfig = serde_json::from_value(json!({
            "parameters": {"flagged": {"in": "body", "schema": {"type": "other"}}}
        }))
        .unwrap();

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({"flagged": 1}));
    }

    #[tokio::test]
    async fn values_are_stringified() {
        let ctx = RequestParts::builder().body("flagged", 1).build();
        let config = GuardConfig::new()
            .param("flagged", ParameterSpec::body().schema(ParameterSchema::string()));

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({"flagged": "1"}));
    }

    #[tokio::test]
    async fn strings_are_coerced() {
        let ctx = RequestParts::builder()
            .path("page", "6")
            .path("amount", "10.99")
            .path("enabled", "true")
            .build();
        let config = GuardConfig::new()
            .param("page", ParameterSpec::path().schema(ParameterSchema::integer()))
            .param("amount", ParameterSpec::path().schema(ParameterSchema::number()))
            .param("enabled", ParameterSpec::path().schema(ParameterSchema::boolean()));

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(
            inputs(&locals),
            json!({"page": 6, "amount": 10.99, "enabled": true})
        );
    }

    #[tokio::test]
    async fn invalid_literals_are_rejected() {
        for (ty, schema) in [
            ("integer", ParameterSchema::integer()),
            ("number", ParameterSchema::number()),
            ("boolean", ParameterSchema::boolean()),
        ] {
            let ctx = RequestParts::builder().path("page", "asdf").build();
            let config = GuardConfig::new().param("page", ParameterSpec::path().schema(schema));

            let (result, locals) = run(config, &ctx).await;
            assert_eq!(
                error_message(result),
                format!("Invalid param 'page' in path: {ty} required")
            );
            assert!(locals.get("inputs").is_none());
        }
    }

    #[tokio::test]
    async fn loose_numeric_text_is_accepted() {
        let ctx = RequestParts::builder()
            .query("page", "")
            .query("offset", "0x10")
            .query("width", "120px")
            .build();
        let config = GuardConfig::new()
            .param("page", ParameterSpec::query().schema(ParameterSchema::integer()))
            .param("offset", ParameterSpec::query().schema(ParameterSchema::integer()))
            .param("width", ParameterSpec::query().schema(ParameterSchema::number()));

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(
            inputs(&locals),
            json!({"page": 0, "offset": 16, "width": 120.0})
        );
    }

    #[tokio::test]
    async fn page_below_minimum() {
        let ctx = RequestParts::builder().query("page", "0").build();
        let config = GuardConfig::from_json_str(
            r#"{"parameters": {"page": {"in": "query", "schema": {"type": "integer", "minimum": 1}}}}"#,
        )
        .unwrap();

        let (result, _) = run(config, &ctx).await;
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Invalid param 'page' in query: must be >= 1");
        assert_eq!(err.status(), http::StatusCode::NOT_ACCEPTABLE);

        let invalid = err.as_invalid_parameter().unwrap();
        assert_eq!(invalid.field, "page");
        assert_eq!(invalid.source, ParamSource::Query);
    }

    #[tokio::test]
    async fn enum_message_lists_declared_order() {
        let ctx = RequestParts::builder().query("sort", "sideways").build();
        let config = GuardConfig::new().param(
            "sort",
            ParameterSpec::query().schema(ParameterSchema::string().one_of(["desc", "asc"])),
        );

        let (result, _) = run(config, &ctx).await;
        assert_eq!(
            error_message(result),
            "Invalid param 'sort' in query: must be one of \"desc, asc\""
        );
    }
}

mod validators {
    use super::*;

    fn name_ctx() -> RequestParts {
        RequestParts::builder().path("name", "test").build()
    }

    #[tokio::test]
    async fn errors_pass_through_unwrapped() {
        let config = GuardConfig::new().param(
            "name",
            ParameterSpec::path().validate_with(|_, _| Err::<bool, _>("test")),
        );

        let (result, locals) = run(config, &name_ctx()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, GuardError::Unexpected(_)));
        assert_eq!(err.to_string(), "test");
        assert_eq!(err.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        assert!(locals.get("inputs").is_none());
    }

    #[tokio::test]
    async fn string_results_are_messages() {
        let config =
            GuardConfig::new().param("name", ParameterSpec::path().validate_with(|_, _| "test"));

        let (result, _) = run(config, &name_ctx()).await;
        assert_eq!(error_message(result), "test");
    }

    #[tokio::test]
    async fn async_validators_are_awaited() {
        let config = GuardConfig::new().param(
            "name",
            ParameterSpec::path().validate_async(|_, _| async { "test".to_string() }),
        );

        let (result, _) = run(config, &name_ctx()).await;
        assert_eq!(error_message(result), "test");
    }

    #[tokio::test]
    async fn false_is_the_generic_rejection() {
        let config = GuardConfig::new()
            .param("name", ParameterSpec::path().validate_async(|_, _| async { false }));

        let (result, _) = run(config, &name_ctx()).await;
        assert_eq!(error_message(result), "Invalid param 'name' in path");
    }

    #[tokio::test]
    async fn true_and_unit_accept() {
        let config = GuardConfig::new()
            .param("name", ParameterSpec::path().validate_async(|_, _| async { true }))
            .param("name2", ParameterSpec::path().validate_async(|_, _| async {}));
        let ctx = RequestParts::builder().path("name", "test").path("name2", "x").build();

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({"name": "test", "name2": "x"}));
    }

    #[tokio::test]
    async fn validators_see_coerced_values() {
        let config = GuardConfig::new().param(
            "count",
            ParameterSpec::query()
                .schema(ParameterSchema::integer())
                .validate_with(|value, _| value.as_i64() == Some(5)),
        );
        let ctx = RequestParts::builder().query("count", "5").build();

        let (result, _) = run(config, &ctx).await;
        result.unwrap();
    }

    #[tokio::test]
    async fn validators_can_read_the_request() {
        let config = GuardConfig::new().param(
            "confirm",
            ParameterSpec::body().validate_with(|value: &Value, ctx: &dyn RequestContext| {
                if ctx.body_field("password").as_ref() == Some(value) {
                    Verdict::Accept
                } else {
                    Verdict::RejectWith("passwords do not match".into())
                }
            }),
        );
        let ctx = RequestParts::builder()
            .body("password", "hunter2")
            .body("confirm", "hunter3")
            .build();

        let (result, _) = run(config, &ctx).await;
        assert_eq!(error_message(result), "passwords do not match");
    }

    #[tokio::test]
    async fn missing_required_field() {
        let config = GuardConfig::new()
            .param("name", ParameterSpec::path())
            .param("country", ParameterSpec::path().required());

        let (result, locals) = run(config, &name_ctx()).await;
        assert_eq!(error_message(result), "Missing required param 'country' in path");
        assert!(locals.get("inputs").is_none());
    }

    #[tokio::test]
    async fn later_fields_are_not_evaluated_after_a_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let config = GuardConfig::new()
            .param("first", ParameterSpec::query().required())
            .param(
                "second",
                ParameterSpec::query().validator(SyncValidator(move |_: &Value, _: &dyn RequestContext| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    true
                })),
            );
        let ctx = RequestParts::builder().query("second", "x").build();

        let (result, _) = run(config, &ctx).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

mod formatters {
    use super::*;

    fn to_number(value: Value, _: &dyn RequestContext) -> Value {
        value
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or(Value::Null)
    }

    #[tokio::test]
    async fn formatters_replace_the_value() {
        let ctx = RequestParts::builder().path("page", "10").build();
        let config = GuardConfig::new().param("page", ParameterSpec::path().format_with(to_number));

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({"page": 10}));
    }

    #[tokio::test]
    async fn formatters_run_before_coercion() {
        let ctx = RequestParts::builder().path("page", "10").build();
        let config = GuardConfig::new().param(
            "page",
            ParameterSpec::path()
                .format_with(to_number)
                .schema(ParameterSchema::string()),
        );

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({"page": "10"}));
    }

    #[tokio::test]
    async fn defaults_fill_missing_fields() {
        let config = GuardConfig::new()
            .param("page", ParameterSpec::path().format_with(to_number))
            .param(
                "count",
                ParameterSpec::path()
                    .format_with(to_number)
                    .schema(ParameterSchema::new().default_value(10)),
            );

        let ctx = RequestParts::builder().path("page", "1").build();
        let (result, locals) = run(config.clone(), &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({"page": 1, "count": 10}));

        let ctx = RequestParts::builder().path("page", "1").path("count", "20").build();
        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({"page": 1, "count": 20}));
    }

    #[tokio::test]
    async fn failing_formatter_is_unexpected() {
        let ctx = RequestParts::builder().path("page", "x").build();
        let config = GuardConfig::new().param(
            "page",
            ParameterSpec::path().formatter(try_formatter(|_, _| Err::<Value, _>("bad format"))),
        );

        let (result, _) = run(config, &ctx).await;
        let err = result.unwrap_err();
        assert!(matches!(err, GuardError::Unexpected(_)));
        assert_eq!(err.to_string(), "bad format");
    }

    #[tokio::test]
    async fn shared_formatters_can_be_reused() {
        let trim = formatter(|value, _| match value {
            Value::String(s) => Value::String(s.trim().to_string()),
            other => other,
        });
        let ctx = RequestParts::builder().query("a", " x ").query("b", "y  ").build();
        let config = GuardConfig::new()
            .param("a", ParameterSpec::query().formatter(trim.clone()))
            .param("b", ParameterSpec::query().formatter(trim));

        let (result, locals) = run(config, &ctx).await;
        result.unwrap();
        assert_eq!(inputs(&locals), json!({"a": "x", "b": "y"}));
    }
}

mod general {
    use super::*;

    #[test]
    fn metadata_is_exposed() {
        let guard = Guard::new(GuardConfig::new()).unwrap();
        assert_eq!(
            serde_json::to_value(guard.metadata().unwrap()).unwrap(),
            json!({"parameters": {}})
        );
    }

    #[test]
    fn hidden_suppresses_metadata() {
        let guard = Guard::from_json_str(r#"{"parameters": {}, "hidden": true}"#).unwrap();
        assert!(guard.metadata().is_none());
    }

    #[tokio::test]
    async fn empty_configuration_continues() {
        let guard = Guard::from_json_str("{}").unwrap();
        let mut locals = Locals::new();

        let outcome = guard
            .call(&RequestParts::default(), &mut locals, |err, _| err.is_none())
            .await;
        assert!(outcome);
    }

    #[tokio::test]
    async fn continuation_receives_locals() {
        let guard = Guard::new(
            GuardConfig::new()
                .param("id", ParameterSpec::path().schema(ParameterSchema::integer()))
                .annotate_locals("params"),
        )
        .unwrap();
        let ctx = RequestParts::builder().path("id", "42").build();
        let mut locals = Locals::new();

        let id = guard
            .call_async(&ctx, &mut locals, |err, locals| {
                let id = locals.get("params").and_then(|p| p.get("id")).cloned();
                async move {
                    assert!(err.is_none());
                    id
                }
            })
            .await;
        assert_eq!(id, Some(json!(42)));
    }

    #[tokio::test]
    #[should_panic(expected = "test")]
    async fn continuation_panics_are_not_caught() {
        let guard = Guard::from_json_str(r#"{"parameters": {}}"#).unwrap();
        let mut locals = Locals::new();

        guard
            .call(&RequestParts::default(), &mut locals, |_, _| -> () { panic!("test") })
            .await;
    }
}
