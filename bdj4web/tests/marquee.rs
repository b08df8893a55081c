//! Marquee relay tests

use std::sync::Arc;

use bdj4web::authn::shared_key::SharedKey;
use bdj4web::filesys::dir::Dir;
use bdj4web::marquee::{MarqueeStore, PublishRequest, PublishStatus};

fn store(dir: &tempfile::TempDir) -> MarqueeStore {
    MarqueeStore::new(Dir::new(dir.path().join("marquee")), None)
}

fn publish<'a>(tag: &'a str, secret: &'a str, content: &'a [u8]) -> PublishRequest<'a> {
    PublishRequest {
        tag: Some(tag),
        secret: Some(secret),
        key: None,
        content: Some(content),
    }
}

#[tokio::test]
async fn test_fetch_unknown_tag_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    assert!(store.fetch(Some("nobody")).await.is_empty());
    assert!(store.fetch(None).await.is_empty());
    assert!(store.fetch(Some("../etc/passwd")).await.is_empty());
}

#[tokio::test]
async fn test_first_publish_provisions_tag() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);
    let secret_file = dir.path().join("marquee/ballroom1.key");
    assert!(!secret_file.exists());

    let status = store.publish(publish("ballroom1", "s3cret", b"Waltz")).await;
    assert_eq!(status, PublishStatus::Ok);
    assert_eq!(store.fetch(Some("ballroom1")).await, b"Waltz");

    assert_eq!(std::fs::read(&secret_file).unwrap(), b"s3cret");

    let status = store.publish(publish("ballroom1", "s3cret", b"Tango")).await;
    assert_eq!(status, PublishStatus::Ok);
    assert_eq!(store.fetch(Some("ballroom1")).await, b"Tango");
}

#[tokio::test]
async fn test_wrong_secret_keeps_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    store.publish(publish("floor", "right", b"Foxtrot")).await;
    let status = store.publish(publish("floor", "wrong", b"Hacked")).await;

    assert_eq!(status, PublishStatus::SecretMismatch);
    assert_eq!(status.code(), "NG4");
    assert_eq!(store.fetch(Some("floor")).await, b"Foxtrot");
}

#[tokio::test]
async fn test_rejections_have_distinct_codes() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let missing_tag = store
        .publish(PublishRequest {
            tag: None,
            secret: Some("s"),
            key: None,
            content: Some(b"x"),
        })
        .await;
    let missing_content = store
        .publish(PublishRequest {
            tag: Some("t"),
            secret: Some("s"),
            key: None,
            content: None,
        })
        .await;
    let not_secured = store
        .publish(PublishRequest {
            tag: Some("t"),
            secret: Some(""),
            key: None,
            content: Some(b"x"),
        })
        .await;

    assert_eq!(missing_tag.code(), "NG1");
    assert_eq!(missing_content.code(), "NG3");
    assert_eq!(not_secured.code(), "NG7");
    assert!(store.fetch(Some("t")).await.is_empty());
}

#[tokio::test]
async fn test_invalid_tag_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    for tag in ["../escape", "a/b", ".hidden", ""] {
        let status = store.publish(publish(tag, "s", b"x")).await;
        assert_eq!(status, PublishStatus::MissingTag, "tag {:?}", tag);
    }
    assert!(!dir.path().join("escape.txt").exists());
}

#[tokio::test]
async fn test_shared_key_checked_when_present() {
    let dir = tempfile::tempdir().unwrap();
    let store = MarqueeStore::new(
        Dir::new(dir.path().join("marquee")),
        Some(SharedKey::new("shared")),
    );

    let mut request = publish("tag", "s", b"x");
    request.key = Some("nope");
    assert_eq!(store.publish(request).await, PublishStatus::BadSharedKey);

    request.key = Some("shared");
    assert_eq!(store.publish(request).await, PublishStatus::Ok);

    request.key = None;
    assert_eq!(store.publish(request).await, PublishStatus::Ok);
}

#[tokio::test]
async fn test_shared_key_without_configured_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(&dir);

    let mut request = publish("tag", "s", b"x");
    request.key = Some("anything");
    assert_eq!(store.publish(request).await, PublishStatus::BadSharedKey);
}

#[tokio::test]
async fn test_concurrent_first_publish_has_one_winner() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store(&dir));

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            let secret = format!("secret-{i}");
            let content = format!("content-{i}");
            store
                .publish(publish("race", &secret, content.as_bytes()))
                .await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            PublishStatus::Ok => ok += 1,
            PublishStatus::SecretMismatch => {}
            other => panic!("unexpected status {other:?}"),
        }
    }
    assert_eq!(ok, 1);

    let secret = std::fs::read_to_string(dir.path().join("marquee/race.key")).unwrap();
    let winner = secret.trim_start_matches("secret-");
    let content = store.fetch(Some("race")).await;
    assert_eq!(content, format!("content-{winner}").as_bytes());
}

#[tokio::test]
async fn test_readers_never_see_partial_content() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(store(&dir));

    let first = vec![b'a'; 512 * 1024];
    let second = vec![b'b'; 512 * 1024];
    assert_eq!(
        store.publish(publish("big", "s", &first)).await,
        PublishStatus::Ok
    );

    let writer = {
        let store = store.clone();
        let (first, second) = (first.clone(), second.clone());
        tokio::spawn(async move {
            for i in 0..20 {
                let content = if i % 2 == 0 { &second } else { &first };
                assert_eq!(
                    store.publish(publish("big", "s", content)).await,
                    PublishStatus::Ok
                );
            }
        })
    };

    let reader = {
        let store = store.clone();
        tokio::spawn(async move {
            for _ in 0..40 {
                let content = store.fetch(Some("big")).await;
                assert!(content == first || content == second, "torn read");
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}
