// Evaluation marshalling: value/handle distinction, element-scoped
// variants, remote exceptions and handle lifecycle usage errors.

mod support;

use serde_json::json;

use support::*;
use tabpilot::{Error, EvalArg, JsCode};

#[tokio::test]
async fn evaluate_resolves_to_a_plain_value() {
    let (session, page) = attach_page().await;
    session.respond("Runtime.callFunctionOn", json!({ "result": { "value": 7 } }));

    let value = page
        .evaluate(
            JsCode::function("(a, b) => a + b"),
            vec![json!(3).into(), json!(4).into()],
        )
        .await
        .expect("evaluate should succeed");
    assert_eq!(value, json!(7));

    // Arguments travel by value in call order
    let params = &session.sent_params("Runtime.callFunctionOn")[0];
    assert_eq!(params["arguments"][0]["value"], 3);
    assert_eq!(params["arguments"][1]["value"], 4);
    assert_eq!(params["awaitPromise"], true);
    assert_eq!(params["returnByValue"], true);
}

#[tokio::test]
async fn evaluate_rejects_a_live_object_result() {
    let (session, page) = attach_page().await;
    session.respond(
        "Runtime.callFunctionOn",
        json!({ "result": { "objectId": "obj-1" } }),
    );

    let result = page
        .evaluate(JsCode::function("() => window"), Vec::new())
        .await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn evaluate_handle_wraps_objects_without_serializing() {
    let (session, page) = attach_page().await;
    session.respond(
        "Runtime.callFunctionOn",
        json!({ "result": { "objectId": "obj-1", "description": "Window" } }),
    );

    let handle = page
        .evaluate_handle(JsCode::function("() => window"), Vec::new())
        .await
        .expect("evaluate_handle should succeed");
    assert_eq!(handle.description(), Some("Window"));
    assert!(!handle.is_disposed());

    handle.dispose().await.expect("dispose should succeed");
    assert!(handle.is_disposed());
    let released = &session.sent_params("Runtime.releaseObject")[0];
    assert_eq!(released["objectId"], "obj-1");

    // Disposal is idempotent and does not release twice
    handle.dispose().await.expect("second dispose is a no-op");
    assert_eq!(session.calls("Runtime.releaseObject"), 1);
}

#[tokio::test]
async fn evaluate_handle_wraps_primitives_inline() {
    let (session, page) = attach_page().await;
    session.respond(
        "Runtime.callFunctionOn",
        json!({ "result": { "value": "hello" } }),
    );

    let handle = page
        .evaluate_handle(JsCode::function("() => 'hello'"), Vec::new())
        .await
        .expect("evaluate_handle should succeed");
    assert_eq!(handle.json_value().await.unwrap(), json!("hello"));

    // No remote object to release
    handle.dispose().await.expect("dispose should succeed");
    assert_eq!(session.calls("Runtime.releaseObject"), 0);
}

#[tokio::test]
async fn remote_throw_surfaces_message_and_stack() {
    let (session, page) = attach_page().await;
    session.respond(
        "Runtime.callFunctionOn",
        json!({
            "result": {},
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": {
                    "description": "TypeError: boom\n    at compute (app.js:10:3)"
                }
            }
        }),
    );

    let result = page
        .evaluate(JsCode::function("() => { throw new TypeError('boom'); }"), Vec::new())
        .await;
    match result {
        Err(Error::Evaluation { message, stack }) => {
            assert!(message.starts_with("TypeError: boom"));
            assert!(stack.unwrap().contains("app.js:10:3"));
        }
        other => panic!("expected evaluation error, got {other:?}"),
    }
}

#[tokio::test]
async fn disposed_handle_argument_is_a_usage_error_without_protocol_io() {
    let (session, page) = attach_page().await;
    session.respond(
        "Runtime.callFunctionOn",
        json!({ "result": { "objectId": "obj-1" } }),
    );

    let handle = page
        .evaluate_handle(JsCode::function("() => window.thing"), Vec::new())
        .await
        .expect("evaluate_handle should succeed");
    handle.dispose().await.expect("dispose should succeed");

    let calls_before = session.calls("Runtime.callFunctionOn");
    let result = page
        .evaluate(
            JsCode::function("thing => thing.touch()"),
            vec![EvalArg::from(&handle)],
        )
        .await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert_eq!(session.calls("Runtime.callFunctionOn"), calls_before);
}

#[tokio::test]
async fn expression_evaluation_takes_no_arguments() {
    let (session, page) = attach_page().await;

    let result = page
        .evaluate(JsCode::expression("1 + 2"), vec![json!(1).into()])
        .await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert_eq!(session.calls("Runtime.evaluate"), 0);
}

#[tokio::test]
async fn expressions_travel_through_the_expression_path() {
    let (session, page) = attach_page().await;
    session.respond("Runtime.evaluate", json!({ "result": { "value": 3 } }));

    let value = page
        .evaluate(JsCode::expression("1 + 2"), Vec::new())
        .await
        .expect("expression should evaluate");
    assert_eq!(value, json!(3));
    assert_eq!(session.sent_params("Runtime.evaluate")[0]["expression"], "1 + 2");
}

#[tokio::test]
async fn eval_on_selector_rejects_when_nothing_matches() {
    let (session, page) = attach_page().await;
    // querySelector resolves to null
    session.respond(
        "Runtime.callFunctionOn",
        json!({ "result": { "value": null } }),
    );

    let result = page
        .eval_on_selector("#missing", JsCode::function("el => el.value"), Vec::new())
        .await;
    match result {
        Err(Error::ElementNotFound(selector)) => assert_eq!(selector, "#missing"),
        other => panic!("expected element-not-found, got {other:?}"),
    }
}

#[tokio::test]
async fn eval_on_selector_passes_the_element_as_leading_argument() {
    let (session, page) = attach_page().await;
    session.respond_with("Runtime.callFunctionOn", |params| {
        let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
        if declaration.contains("document.querySelector") {
            Some(json!({ "result": { "objectId": "el-1" } }))
        } else {
            // The user function: element handle first, then the extra arg
            assert_eq!(params["arguments"][0]["objectId"], "el-1");
            assert_eq!(params["arguments"][1]["value"], "suffix");
            Some(json!({ "result": { "value": "text-suffix" } }))
        }
    });

    let value = page
        .eval_on_selector(
            "#field",
            JsCode::function("(el, suffix) => el.value + suffix"),
            vec![json!("suffix").into()],
        )
        .await
        .expect("eval_on_selector should succeed");
    assert_eq!(value, json!("text-suffix"));

    // The transient element handle is released afterwards
    assert_eq!(session.sent_params("Runtime.releaseObject")[0]["objectId"], "el-1");
}

#[tokio::test]
async fn query_selector_all_expands_the_remote_array() {
    let (session, page) = attach_page().await;
    session.respond(
        "Runtime.callFunctionOn",
        json!({ "result": { "objectId": "arr-1" } }),
    );
    session.respond(
        "Runtime.getProperties",
        json!({
            "result": [
                { "name": "0", "value": { "objectId": "n-0" } },
                { "name": "1", "value": { "objectId": "n-1" } },
                { "name": "length", "value": { "value": 2 } }
            ]
        }),
    );

    let elements = page
        .query_selector_all("p")
        .await
        .expect("query should succeed");
    assert_eq!(elements.len(), 2);

    // The array container itself is released
    assert_eq!(session.sent_params("Runtime.releaseObject")[0]["objectId"], "arr-1");
}

#[tokio::test]
async fn click_requires_a_matching_element() {
    let (session, page) = attach_page().await;
    session.respond(
        "Runtime.callFunctionOn",
        json!({ "result": { "value": null } }),
    );

    let result = page.click("#missing").await;
    assert!(matches!(result, Err(Error::ElementNotFound(_))));
}

#[tokio::test]
async fn select_returns_the_values_actually_selected() {
    let (session, page) = attach_page().await;
    session.respond_with("Runtime.callFunctionOn", |params| {
        let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
        if declaration.contains("document.querySelector") {
            Some(json!({ "result": { "objectId": "select-1" } }))
        } else {
            assert_eq!(params["arguments"][1]["value"], json!(["uk"]));
            Some(json!({ "result": { "value": ["uk"] } }))
        }
    });

    let selected = page
        .select("#country", &["uk"])
        .await
        .expect("select should succeed");
    assert_eq!(selected, vec!["uk".to_string()]);
}

#[tokio::test]
async fn type_text_focuses_then_inserts_each_character() {
    let (session, page) = attach_page().await;
    session.respond_with("Runtime.callFunctionOn", |params| {
        let declaration = params["functionDeclaration"].as_str().unwrap_or_default();
        if declaration.contains("document.querySelector") {
            Some(json!({ "result": { "objectId": "input-1" } }))
        } else {
            Some(json!({ "result": { "value": null } }))
        }
    });

    page.type_text("#name", "hi!", None)
        .await
        .expect("type should succeed");

    let inserts = session.sent_params("Input.insertText");
    let typed: Vec<&str> = inserts
        .iter()
        .map(|params| params["text"].as_str().unwrap())
        .collect();
    assert_eq!(typed, vec!["h", "i", "!"]);
}
