//! End-to-end tests of form validation, schema compilation, invocation and
//! reply validation against a scripted provider.

#![allow(clippy::unwrap_used, clippy::panic)]

use std::sync::Arc;

use intent_json::prelude::*;
use serde_json::json;

const SCHEMA: &str = "z.object({
  isTaskRefused: z.boolean(),
  refusalReason: z.string().nullable(),
  animals: z.array(z.object({ name: z.string(), count: z.number() })),
})";

fn image_fields() -> FormFields {
    FormFields::image(
        "https://example.com/farm.jpg",
        "Count the animals.",
        SCHEMA,
    )
}

fn conforming_reply() -> serde_json::Value {
    json!({
        "isTaskRefused": false,
        "refusalReason": null,
        "animals": [{ "name": "cow", "count": 3 }, { "name": "hen", "count": 12 }]
    })
}

#[tokio::test]
async fn test_empty_field_never_reaches_provider() {
    let invoker = StructuredInvoker::new(MockProvider::always(conforming_reply().to_string()));

    let cases = [
        (
            FormFields::image("", "Count the animals.", SCHEMA),
            FieldName::ImageUrl,
        ),
        (
            FormFields::image("https://example.com/farm.jpg", "  ", SCHEMA),
            FieldName::SystemPrompt,
        ),
        (
            FormFields::image("https://example.com/farm.jpg", "Count the animals.", ""),
            FieldName::JsonSchema,
        ),
        (
            FormFields::text("", "Classify.", SCHEMA),
            FieldName::UserText,
        ),
    ];

    for (fields, field) in cases {
        let state = analyze(&invoker, &fields).await;
        let errors = state.field_errors.unwrap();
        assert_eq!(
            errors.get(field),
            Some(&[field.empty_message().to_owned()][..])
        );
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    assert_eq!(invoker.provider().call_count(), 0);
}

#[tokio::test]
async fn test_invalid_schema_never_reaches_provider() {
    let invoker = StructuredInvoker::new(MockProvider::always("{}"));

    for source in [
        "z.object({ name: z.string() ",
        "z.string().int()",
        "new Function('return 1')()",
        r#"{ "type": "object", "properties": "#,
        r#"{ "$ref": "https://attacker.example/schema.json" }"#,
    ] {
        let fields = FormFields::text("hello", "Classify.", source);
        let state = analyze(&invoker, &fields).await;
        let error = state.error.unwrap();
        assert!(error.starts_with("Schema parsing error: "), "{source}: {error}");
    }

    assert_eq!(invoker.provider().call_count(), 0);
}

#[tokio::test]
async fn test_conforming_reply_is_returned_unchanged() {
    let reply = conforming_reply();
    let invoker = StructuredInvoker::new(MockProvider::new(vec![MockReply::json(&reply)]));

    let state = analyze(&invoker, &image_fields()).await;

    assert_eq!(state.data, Some(reply));
    assert!(state.is_success());
    assert_eq!(invoker.provider().call_count(), 1);

    let sent = invoker.provider().last_request().await.unwrap();
    assert_eq!(sent.response_format, Some(ResponseFormat::JsonObject));
    let system = sent.messages[0].text().unwrap();
    assert!(system.starts_with("Count the animals.\n\n"));
    assert!(system.ends_with(SCHEMA));
}

#[tokio::test]
async fn test_missing_required_field_is_a_mismatch() {
    let mut reply = conforming_reply();
    reply.as_object_mut().unwrap().remove("animals");
    let invoker = StructuredInvoker::new(MockProvider::new(vec![MockReply::json(&reply)]));
    let request = image_fields().validate().unwrap();

    let err = invoker.invoke(&request).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    let Error::SchemaMismatch(violations) = &err else {
        panic!("expected a schema mismatch, got {err:?}");
    };
    assert_eq!(violations.len(), 1);
    assert!(violations.to_string().contains("animals"));
}

#[tokio::test]
async fn test_empty_and_malformed_replies_are_distinct() {
    let invoker = StructuredInvoker::new(MockProvider::new(vec![
        MockReply::Empty,
        MockReply::text("Sure! Here are the animals: cow, hen."),
    ]));
    let request = image_fields().validate().unwrap();

    let empty = invoker.invoke(&request).await.unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::EmptyResponse);
    assert_eq!(empty.to_string(), "No content in model response");

    let malformed = invoker.invoke(&request).await.unwrap_err();
    assert_eq!(malformed.kind(), ErrorKind::MalformedJson);
    assert_ne!(malformed.kind(), ErrorKind::SchemaMismatch);
    assert!(
        malformed
            .to_string()
            .starts_with("Model response is not valid JSON: ")
    );
}

#[tokio::test]
async fn test_provider_error_is_surfaced_verbatim() {
    let invoker = StructuredInvoker::new(MockProvider::new(vec![MockReply::Error(
        LlmError::rate_limited("openai", "You exceeded your current quota"),
    )]));

    let state = analyze(&invoker, &image_fields()).await;

    assert_eq!(
        state.error.as_deref(),
        Some("[openai] You exceeded your current quota")
    );
    assert_eq!(invoker.provider().call_count(), 1);
}

#[tokio::test]
async fn test_identical_requests_are_idempotent() {
    let invoker = StructuredInvoker::new(MockProvider::always(conforming_reply().to_string()));
    let fields = image_fields();

    let first = analyze(&invoker, &fields).await;
    let second = analyze(&invoker, &fields).await;

    assert_eq!(first, second);
    assert_eq!(invoker.provider().call_count(), 2);
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let provider = Arc::new(MockProvider::always(conforming_reply().to_string()));
    let invoker = Arc::new(StructuredInvoker::new(Arc::clone(&provider)));
    let request = image_fields().validate().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let invoker = Arc::clone(&invoker);
            let request = request.clone();
            tokio::spawn(async move { invoker.invoke(&request).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), conforming_reply());
    }
    assert_eq!(provider.call_count(), 8);
}

#[tokio::test]
async fn test_json_schema_source_works_like_expressions() {
    let schema = r#"{
        "type": "object",
        "properties": {
            "sentiment": { "enum": ["positive", "negative", "neutral"] },
            "topics": { "type": "array", "items": { "type": "string" }, "maxItems": 2 }
        },
        "required": ["sentiment", "topics"]
    }"#;
    let invoker = StructuredInvoker::new(MockProvider::new(vec![
        MockReply::text(r#"{ "sentiment": "neutral", "topics": ["weather"] }"#),
        MockReply::text(r#"{ "sentiment": "neutral", "topics": ["a", "b", "c"] }"#),
    ]));
    let fields = FormFields::text("It rained.", "Classify.", schema);

    assert!(analyze(&invoker, &fields).await.is_success());
    assert!(
        analyze(&invoker, &fields)
            .await
            .error
            .unwrap()
            .starts_with("AI response validation failed: /topics")
    );
}

#[tokio::test]
async fn test_defaults_are_not_filled_into_the_reply() {
    let invoker = StructuredInvoker::new(MockProvider::always(r#"{ "label": "spam" }"#));
    let fields = FormFields::text(
        "Win a prize!",
        "Label the message.",
        "z.object({ label: z.string(), score: z.number().default(0) })",
    );

    let state = analyze(&invoker, &fields).await;

    assert_eq!(state.data, Some(json!({ "label": "spam" })));
}
