// Push and notification click tests
// Author: kelexine (https://github.com/kelexine)

mod common;

use common::{harness, url, HostCall};
use offline_gateway::worker::{
    ClickOutcome, NotificationClick, NotificationData, ACTION_READ, ACTION_SNOOZE,
};

#[tokio::test]
async fn test_push_without_payload_uses_default_body() {
    let h = harness("v1", &[]);
    let notification = h.gateway.handle_push(None).await.unwrap();

    assert_eq!(notification.body, "🕌 It is time to read the Holy Quran");
    assert_eq!(notification.tag, "quran-reminder");
    assert_eq!(notification.vibrate, vec![100, 50, 100]);
    assert!(notification.renotify);
    assert!(notification.require_interaction);
    assert_eq!(notification.data.url.as_deref(), Some("/"));
    let actions: Vec<&str> = notification.actions.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(actions, vec![ACTION_READ, ACTION_SNOOZE]);

    match &h.host.calls()[..] {
        [HostCall::Shown { title, notification: shown }] => {
            assert_eq!(title, "The Holy Quran");
            assert_eq!(shown, &notification);
        }
        other => panic!("unexpected host calls: {:?}", other),
    }
}

#[tokio::test]
async fn test_push_json_payload() {
    let h = harness("v1", &[]);
    let payload = br#"{"body":"Continue Surah Yasin","url":"/surah/36"}"#;
    let notification = h.gateway.handle_push(Some(payload)).await.unwrap();

    assert_eq!(notification.body, "Continue Surah Yasin");
    assert_eq!(notification.data.url.as_deref(), Some("/surah/36"));
    assert!(notification.data.timestamp > 0);
}

#[tokio::test]
async fn test_malformed_push_payload_uses_default_body() {
    let h = harness("v1", &[]);
    let notification = h.gateway.handle_push(Some(b"{not json")).await.unwrap();
    assert_eq!(notification.body, "🕌 It is time to read the Holy Quran");
}

#[tokio::test]
async fn test_read_focuses_open_window() {
    let h = harness("v1", &[]);
    h.host.add_window("elsewhere", "https://other.test/");
    h.host.add_window("tab-7", &url("/surah/1"));

    let click = NotificationClick {
        action: Some(ACTION_READ.to_string()),
        ..Default::default()
    };
    let outcome = h.gateway.handle_notification_click(&click).await.unwrap();

    assert_eq!(outcome, ClickOutcome::Focused { client_id: "tab-7".to_string() });
    assert_eq!(
        h.host.calls(),
        vec![
            HostCall::Closed("quran-reminder".to_string()),
            HostCall::Focused("tab-7".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_read_opens_root_without_windows() {
    let h = harness("v1", &[]);
    let click = NotificationClick {
        action: Some(ACTION_READ.to_string()),
        ..Default::default()
    };
    let outcome = h.gateway.handle_notification_click(&click).await.unwrap();
    assert_eq!(outcome, ClickOutcome::Opened { url: url("/") });
}

#[tokio::test]
async fn test_snooze_has_no_navigation() {
    let h = harness("v1", &[]);
    h.host.add_window("tab-1", &url("/"));
    let click = NotificationClick {
        action: Some(ACTION_SNOOZE.to_string()),
        ..Default::default()
    };

    let outcome = h.gateway.handle_notification_click(&click).await.unwrap();

    assert_eq!(outcome, ClickOutcome::Deferred);
    assert_eq!(h.host.calls(), vec![HostCall::Closed("quran-reminder".to_string())]);
}

#[tokio::test]
async fn test_body_click_opens_data_url() {
    let h = harness("v1", &[]);
    let click = NotificationClick {
        action: None,
        tag: Some("custom-tag".to_string()),
        data: NotificationData {
            url: Some("/surah/18".to_string()),
            timestamp: 1,
        },
    };

    let outcome = h.gateway.handle_notification_click(&click).await.unwrap();

    assert_eq!(outcome, ClickOutcome::Opened { url: url("/surah/18") });
    assert_eq!(
        h.host.calls(),
        vec![
            HostCall::Closed("custom-tag".to_string()),
            HostCall::Opened(url("/surah/18")),
        ]
    );
}

#[tokio::test]
async fn test_body_click_defaults_to_root() {
    let h = harness("v1", &[]);
    let outcome = h
        .gateway
        .handle_notification_click(&NotificationClick::default())
        .await
        .unwrap();
    assert_eq!(outcome, ClickOutcome::Opened { url: url("/") });
}
