use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mnemo::prelude::*;
use mnemo::{DownloadedAsset, AssetFetcher, ResolverOptions, StorageDomain, TableName};
use url::Url;

const PNG_BYTES: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00];

/// Serves a PNG for every URL except those containing "broken"
struct StubFetcher;

#[async_trait]
impl AssetFetcher for StubFetcher {
    async fn fetch(&self, url: &Url) -> anyhow::Result<DownloadedAsset> {
        if url.as_str().contains("broken") {
            anyhow::bail!("503 Service Unavailable");
        }
        Ok(DownloadedAsset {
            data: PNG_BYTES.to_vec(),
            media_type: Some("image/png".to_string()),
        })
    }
}

async fn mnemo() -> Mnemo {
    Mnemo::builder()
        .fetcher(Arc::new(StubFetcher))
        .resolver_options(ResolverOptions {
            retry_base_delay: Duration::from_millis(1),
            ..ResolverOptions::default()
        })
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_from_config_routes_dedicated_domains() {
    let config: MnemoConfig = toml::from_str(
        r#"
        [storage]
        dedicated = ["traces"]
        "#,
    )
    .unwrap();

    let mnemo = Mnemo::from_config(&config).await.unwrap();

    assert_eq!(mnemo.storage().backend_for(TableName::Traces).unwrap().name(), "traces");
    assert_eq!(
        mnemo.storage().domain_backend(StorageDomain::Conversations).unwrap().name(),
        "shared"
    );
}

#[tokio::test]
async fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("mnemo-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
        [assets]
        concurrency = 2

        [logging]
        level = "warn"
        "#,
    )
    .unwrap();

    let config = MnemoConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.assets.concurrency, 2);
    assert_eq!(config.assets.max_attempts, 3);
    assert_eq!(config.logging.level, "warn");
}

#[tokio::test]
async fn test_ingest_without_materializing_keeps_urls() {
    let mnemo = mnemo().await;

    let outcome = mnemo
        .ingest(
            SaveMessages::new(vec![FlatMessage::user(
                "t1",
                vec![ContentPart::image("https://example.com/cat.png")],
            )
            .with_resource_id("alice")]),
            false,
        )
        .await
        .unwrap();

    let stored = outcome.messages[0].as_structured().unwrap();
    assert_eq!(
        stored.content.parts[0],
        mnemo::UiPart::Image {
            url: "https://example.com/cat.png".to_string(),
            media_type: None
        }
    );
}

#[tokio::test]
async fn test_ingest_materializes_remote_assets() {
    let mnemo = mnemo().await;

    let outcome = mnemo
        .ingest(
            SaveMessages::new(vec![FlatMessage::user(
                "t1",
                vec![
                    ContentPart::text("two pictures"),
                    ContentPart::image("https://example.com/cat"),
                    ContentPart::image("https://example.com/broken.png"),
                ],
            )
            .with_resource_id("alice")])
            .format(MessageFormat::Flat),
            true,
        )
        .await
        .unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].url, "https://example.com/broken.png");

    let Content::Parts(parts) = &outcome.messages[0].as_flat().unwrap().content else {
        panic!("Expected parts");
    };
    assert_eq!(parts[1].data().unwrap().to_bytes().unwrap().unwrap(), PNG_BYTES);
    assert_eq!(parts[1].media_type(), Some("image/png"));
    assert!(parts[2].data().unwrap().is_remote());

    let thread = mnemo.conversations().get_thread_by_id("t1").await.unwrap();
    assert_eq!(thread.map(|t| t.resource_id), Some("alice".to_string()));
}

#[tokio::test]
async fn test_prepare_for_model_inlines_history() {
    let mnemo = mnemo().await;
    mnemo
        .conversations()
        .save_thread(Thread::new("t1", "alice"))
        .await
        .unwrap();
    mnemo
        .conversations()
        .save_messages(SaveMessages::new(vec![
            FlatMessage::user("t1", "Test message 1"),
            FlatMessage::user("t1", vec![ContentPart::image("https://example.com/dog")]),
        ]))
        .await
        .unwrap();

    let prepared = mnemo.prepare_for_model("t1", 10).await.unwrap();

    assert!(prepared.failures.is_empty());
    assert_eq!(prepared.messages.len(), 2);
    assert_eq!(prepared.messages[0].content, Content::Text("Test message 1".to_string()));
    let Content::Parts(parts) = &prepared.messages[1].content else {
        panic!("Expected parts");
    };
    assert!(!parts[0].data().unwrap().is_remote());
}

#[tokio::test]
async fn test_supported_urls_are_left_for_the_model() {
    let mnemo = Mnemo::builder()
        .fetcher(Arc::new(StubFetcher))
        .supported_urls(SupportedUrls::new().with("image/*", r"^https://cdn\.").unwrap())
        .build()
        .await
        .unwrap();
    mnemo
        .conversations()
        .save_messages(SaveMessages::new(vec![FlatMessage::user(
            "t1",
            vec![ContentPart::image("https://cdn.example.com/native.png")],
        )
        .with_resource_id("alice")]))
        .await
        .unwrap();

    let prepared = mnemo.prepare_for_model("t1", 10).await.unwrap();

    let Content::Parts(parts) = &prepared.messages[0].content else {
        panic!("Expected parts");
    };
    assert!(parts[0].data().unwrap().is_remote());
}
