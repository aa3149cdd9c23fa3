// Navigation: goto/reload/history racing lifecycle milestones against
// timeouts, with frame detachment as a distinct terminal error.

mod support;

use std::time::Duration;

use support::*;
use tabpilot::{Error, NavigateOptions, SessionEvent, WaitUntil};

#[tokio::test]
async fn goto_resolves_with_navigation_response_after_load() {
    let (session, page) = attach_page().await;

    let navigating = {
        let page = page.clone();
        tokio::spawn(async move { page.goto("https://example.com/", None).await })
    };
    settle().await;

    session.emit(SessionEvent::Request(nav_request("R1", "https://example.com/")));
    session.emit(SessionEvent::Response(response_for(
        "R1",
        "https://example.com/",
        200,
    )));
    session.emit(navigated("https://example.com/"));
    session.emit(lifecycle("load"));

    let response = navigating
        .await
        .unwrap()
        .expect("navigation should succeed")
        .expect("navigation should produce a response");
    assert_eq!(response.status(), 200);
    assert_eq!(response.url(), "https://example.com/");
    assert!(response.ok());

    // The main-frame reference was refreshed by the navigation event
    assert_eq!(page.url(), "https://example.com/");
    assert_eq!(session.calls("Page.navigate"), 1);
}

#[tokio::test]
async fn goto_without_response_resolves_none() {
    let (session, page) = attach_page().await;

    let navigating = {
        let page = page.clone();
        tokio::spawn(async move { page.goto("data:text/html,<p>hi</p>", None).await })
    };
    settle().await;
    session.emit(lifecycle("load"));

    let response = navigating.await.unwrap().expect("navigation should succeed");
    assert!(response.is_none());
}

#[tokio::test]
async fn goto_surfaces_navigate_error_text_as_navigation_error() {
    let (session, page) = attach_page().await;
    session.respond(
        "Page.navigate",
        serde_json::json!({ "errorText": "net::ERR_NAME_NOT_RESOLVED" }),
    );

    let result = page.goto("https://nxdomain.invalid/", None).await;
    match result {
        Err(Error::Navigation(message)) => {
            assert!(message.contains("ERR_NAME_NOT_RESOLVED"));
            assert!(message.contains("nxdomain.invalid"));
        }
        other => panic!("expected navigation error, got {other:?}"),
    }
}

#[tokio::test]
async fn goto_rejects_with_timeout_when_lifecycle_never_fires() {
    let (_session, page) = attach_page().await;

    let result = page
        .goto(
            "https://example.com/",
            Some(NavigateOptions::new().timeout(Duration::from_millis(50))),
        )
        .await;

    match result {
        Err(Error::Timeout(message)) => assert!(message.contains("50ms")),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn frame_detach_mid_navigation_is_a_navigation_error_not_a_timeout() {
    let (session, page) = attach_page().await;

    let navigating = {
        let page = page.clone();
        tokio::spawn(async move { page.goto("https://example.com/", None).await })
    };
    settle().await;

    session.emit(SessionEvent::FrameDetached {
        frame_id: main_frame_id(),
    });

    match navigating.await.unwrap() {
        Err(Error::Navigation(message)) => assert!(message.contains("detached")),
        other => panic!("expected navigation error, got {other:?}"),
    }
}

#[tokio::test]
async fn goto_honors_multiple_wait_until_milestones() {
    let (session, page) = attach_page().await;

    let navigating = {
        let page = page.clone();
        tokio::spawn(async move {
            page.goto(
                "https://example.com/",
                Some(
                    NavigateOptions::new()
                        .wait_until(WaitUntil::Load)
                        .wait_until(WaitUntil::NetworkIdle0),
                ),
            )
            .await
        })
    };
    settle().await;

    session.emit(lifecycle("load"));
    settle().await;
    assert!(!navigating.is_finished(), "must wait for network idle too");

    session.emit(lifecycle("networkIdle"));
    navigating.await.unwrap().expect("navigation should succeed");
}

#[tokio::test]
async fn reload_waits_for_lifecycle() {
    let (session, page) = attach_page().await;

    let reloading = {
        let page = page.clone();
        tokio::spawn(async move { page.reload(None).await })
    };
    settle().await;
    assert_eq!(session.calls("Page.reload"), 1);

    session.emit(lifecycle("load"));
    reloading.await.unwrap().expect("reload should succeed");
}

#[tokio::test]
async fn go_back_at_history_start_resolves_null() {
    let (session, page) = attach_page().await;
    session.respond(
        "Page.getNavigationHistory",
        serde_json::json!({
            "currentIndex": 0,
            "entries": [{ "id": 1, "url": "about:blank" }]
        }),
    );

    let result = page.go_back(None).await.expect("go_back should not fail");
    assert!(result.is_none());
    assert_eq!(session.calls("Page.navigateToHistoryEntry"), 0);
}

#[tokio::test]
async fn go_back_navigates_to_previous_entry() {
    let (session, page) = attach_page().await;
    session.respond(
        "Page.getNavigationHistory",
        serde_json::json!({
            "currentIndex": 1,
            "entries": [
                { "id": 7, "url": "https://a.example/" },
                { "id": 8, "url": "https://b.example/" }
            ]
        }),
    );

    let going_back = {
        let page = page.clone();
        tokio::spawn(async move { page.go_back(None).await })
    };
    settle().await;
    session.emit(lifecycle("load"));

    going_back.await.unwrap().expect("go_back should succeed");
    let params = session.sent_params("Page.navigateToHistoryEntry");
    assert_eq!(params.len(), 1);
    assert_eq!(params[0]["entryId"], 7);
}

#[tokio::test]
async fn go_forward_at_history_end_resolves_null() {
    let (session, page) = attach_page().await;
    session.respond(
        "Page.getNavigationHistory",
        serde_json::json!({
            "currentIndex": 0,
            "entries": [{ "id": 1, "url": "about:blank" }]
        }),
    );

    let result = page
        .go_forward(None)
        .await
        .expect("go_forward should not fail");
    assert!(result.is_none());
}

#[tokio::test]
async fn set_content_writes_document_and_waits_for_load() {
    let (session, page) = attach_page().await;

    let setting = {
        let page = page.clone();
        tokio::spawn(async move { page.set_content("<p>hello</p>", None).await })
    };
    settle().await;
    assert!(!setting.is_finished());

    session.emit(lifecycle("load"));
    setting.await.unwrap().expect("set_content should succeed");

    let calls = session.sent_params("Runtime.callFunctionOn");
    assert!(calls
        .iter()
        .any(|params| params["arguments"][0]["value"] == "<p>hello</p>"));
}

#[tokio::test]
async fn wait_for_navigation_sees_only_future_milestones() {
    let (session, page) = attach_page().await;

    // A milestone delivered before registration must not satisfy the wait
    session.emit(lifecycle("load"));
    settle().await;

    let waiting = {
        let page = page.clone();
        tokio::spawn(async move {
            page.wait_for_navigation(Some(
                NavigateOptions::new().timeout(Duration::from_millis(200)),
            ))
            .await
        })
    };
    settle().await;
    assert!(!waiting.is_finished());

    session.emit(lifecycle("load"));
    waiting
        .await
        .unwrap()
        .expect("navigation wait should resolve on the fresh milestone");
}
