//! Transfer bridge tests: both strategies, failure paths and cancellation.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use pickfs_kernel::{
    CancellationToken, ChangeLog, PathStore, ProviderConfig, ProviderFlags, StoreError,
    TransferBridge, TransferSettings,
};
use rstest::rstest;
use tokio::io::AsyncWriteExt;

struct Fixture {
    store: Arc<PathStore>,
    flags: Arc<ProviderFlags>,
    bridge: TransferBridge,
    log: Arc<ChangeLog>,
}

fn fixture(buffer_locally: bool, settings: TransferSettings) -> Fixture {
    let log = Arc::new(ChangeLog::new());
    let store = Arc::new(PathStore::new(log.clone()));
    let config = ProviderConfig {
        buffer_locally,
        ..ProviderConfig::default()
    };
    let flags = Arc::new(ProviderFlags::from_config(&config));
    let bridge = TransferBridge::new(store.clone(), flags.clone(), settings);
    Fixture {
        store,
        flags,
        bridge,
        log,
    }
}

fn small_pipe() -> TransferSettings {
    TransferSettings {
        pipe_capacity: 1,
        chunk_size: 7,
    }
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 253) as u8).collect()
}

// ============================================================================
// Round trips
// ============================================================================

#[rstest]
#[case::streaming(false)]
#[case::buffered(true)]
#[tokio::test]
async fn test_read_returns_exact_bytes(#[case] buffered: bool) {
    let fx = fixture(buffered, small_pipe());
    let data = payload(5_000);
    fx.store.replace_content("/doc.bin", data.clone()).await.unwrap();

    let mut reader = fx
        .bridge
        .open_read("/doc.bin", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(reader.is_buffered(), buffered);
    assert_eq!(reader.read_all().await.unwrap(), data);
}

#[rstest]
#[case::streaming(false)]
#[case::buffered(true)]
#[tokio::test]
async fn test_write_commits_on_finish(#[case] buffered: bool) {
    let fx = fixture(buffered, small_pipe());
    let data = payload(3_000);

    let mut writer = fx
        .bridge
        .open_write("/new.bin", CancellationToken::new())
        .unwrap();
    assert_eq!(writer.is_buffered(), buffered);
    for chunk in data.chunks(100) {
        writer.write_all(chunk).await.unwrap();
    }
    writer.finish().await.unwrap();

    assert_eq!(&fx.store.download("/new.bin").await.unwrap()[..], &data[..]);
    assert!(fx.log.contains("/new.bin"));
    assert!(fx.log.contains("/"));
}

#[tokio::test]
async fn test_write_overwrites_existing_file() {
    let fx = fixture(false, TransferSettings::default());
    fx.store.replace_content("/a.txt", b"old".to_vec()).await.unwrap();

    let mut writer = fx
        .bridge
        .open_write("/a.txt", CancellationToken::new())
        .unwrap();
    writer.write_all(b"new contents").await.unwrap();
    writer.finish().await.unwrap();

    assert_eq!(&fx.store.download("/a.txt").await.unwrap()[..], b"new contents");
}

#[tokio::test]
async fn test_empty_file_streams_as_eof() {
    let fx = fixture(false, TransferSettings::default());
    fx.store.create("/empty", false).await.unwrap();
    let mut reader = fx
        .bridge
        .open_read("/empty", CancellationToken::new())
        .await
        .unwrap();
    assert!(reader.read_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_sees_snapshot_at_open() {
    let fx = fixture(false, small_pipe());
    fx.store.replace_content("/a", b"before".to_vec()).await.unwrap();

    let mut reader = fx
        .bridge
        .open_read("/a", CancellationToken::new())
        .await
        .unwrap();
    fx.store.replace_content("/a", b"after".to_vec()).await.unwrap();

    assert_eq!(reader.read_all().await.unwrap(), b"before");
}

#[rstest]
#[case::zero_chunk(TransferSettings { pipe_capacity: 1, chunk_size: 0 })]
#[case::zero_capacity(TransferSettings { pipe_capacity: 0, chunk_size: 3 })]
#[tokio::test]
async fn test_zero_sized_settings_still_stream(#[case] settings: TransferSettings) {
    let fx = fixture(false, settings);
    let data = payload(200);
    fx.store.replace_content("/z.bin", data.clone()).await.unwrap();

    let mut reader = fx
        .bridge
        .open_read("/z.bin", CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(reader.read_all().await.unwrap(), data);

    let mut writer = fx
        .bridge
        .open_write("/z.out", CancellationToken::new())
        .unwrap();
    writer.write_all(&data).await.unwrap();
    writer.finish().await.unwrap();
    assert_eq!(&fx.store.download("/z.out").await.unwrap()[..], &data[..]);
}

#[rstest]
#[case::streaming(false)]
#[case::buffered(true)]
#[tokio::test]
async fn test_write_to_root_is_refused(#[case] buffered: bool) {
    let fx = fixture(buffered, TransferSettings::default());
    let mut writer = fx.bridge.open_write("/", CancellationToken::new()).unwrap();
    writer.write_all(b"x").await.unwrap();
    let result = writer.finish().await;

    if !buffered {
        assert!(matches!(result, Err(StoreError::InvalidOperation(_))));
    }
    assert!(fx.store.get("/").await.unwrap().is_folder());
}

#[tokio::test]
async fn test_strategy_follows_flag_per_open() {
    let fx = fixture(false, TransferSettings::default());
    fx.store.create("/a", false).await.unwrap();

    let first = fx.bridge.open_read("/a", CancellationToken::new()).await.unwrap();
    fx.flags.set_buffer_locally(true);
    let second = fx.bridge.open_read("/a", CancellationToken::new()).await.unwrap();

    assert!(!first.is_buffered());
    assert!(second.is_buffered());
}

// ============================================================================
// Failures before allocation
// ============================================================================

#[rstest]
#[case::streaming(false)]
#[case::buffered(true)]
#[tokio::test]
async fn test_open_missing_for_read_is_not_found(#[case] buffered: bool) {
    let fx = fixture(buffered, TransferSettings::default());
    let err = fx
        .bridge
        .open("/missing", "r", CancellationToken::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_open_folder_for_read_is_invalid() {
    let fx = fixture(false, TransferSettings::default());
    fx.store.create("/dir", true).await.unwrap();
    let err = fx
        .bridge
        .open("/dir", "r", CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidOperation(_)));
}

#[rstest]
#[case("rw")]
#[case("a")]
#[case("")]
#[tokio::test]
async fn test_unknown_mode_checked_first(#[case] mode: &str) {
    let fx = fixture(false, TransferSettings::default());
    // Missing path, yet the mode error wins.
    let err = fx
        .bridge
        .open("/missing", mode, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedMode(m) if m == mode));
}

#[tokio::test]
async fn test_open_missing_for_write_creates_it() {
    let fx = fixture(false, TransferSettings::default());
    let handle = fx
        .bridge
        .open("/fresh.txt", "w", CancellationToken::new())
        .await
        .unwrap();
    let mut writer = handle.into_writer().unwrap();
    writer.write_all(b"hi").await.unwrap();
    writer.finish().await.unwrap();
    assert!(fx.store.exists("/fresh.txt").await);
}

// ============================================================================
// Abnormal termination
// ============================================================================

#[tokio::test]
async fn test_cancelled_read_closes_with_error() {
    let fx = fixture(false, small_pipe());
    fx.store.replace_content("/big", payload(10_000)).await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut reader = fx.bridge.open_read("/big", cancel).await.unwrap();

    let err = reader.read_all().await.unwrap_err();
    match err {
        StoreError::TransferFailure(e) => assert_eq!(e.kind(), io::ErrorKind::Interrupted),
        other => panic!("expected transfer failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancel_mid_read_never_truncates_silently() {
    let fx = fixture(false, small_pipe());
    fx.store.replace_content("/big", payload(10_000)).await.unwrap();

    let cancel = CancellationToken::new();
    let mut reader = fx.bridge.open_read("/big", cancel.clone()).await.unwrap();

    let mut first = [0u8; 7];
    tokio::io::AsyncReadExt::read_exact(&mut reader, &mut first)
        .await
        .unwrap();
    cancel.cancel();

    // Either the drain finished before the cancel landed, or the reader sees
    // an error. Never a short clean EOF.
    match reader.read_all().await {
        Ok(rest) => assert_eq!(rest.len() + first.len(), 10_000),
        Err(e) => assert!(matches!(e, StoreError::TransferFailure(_))),
    }
}

#[tokio::test]
async fn test_cancelled_write_commits_nothing() {
    let fx = fixture(false, TransferSettings::default());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let writer = fx.bridge.open_write("/never.txt", cancel).unwrap();
    let err = writer.finish().await.unwrap_err();

    match err {
        StoreError::TransferFailure(e) => assert_eq!(e.kind(), io::ErrorKind::Interrupted),
        other => panic!("expected transfer failure, got {other:?}"),
    }
    assert!(!fx.store.exists("/never.txt").await);
}

#[tokio::test]
async fn test_abandoned_streaming_writer_commits_nothing() {
    let fx = fixture(false, TransferSettings::default());
    let mut writer = fx
        .bridge
        .open_write("/abandoned.txt", CancellationToken::new())
        .unwrap();
    writer.write_all(b"half a document").await.unwrap();
    drop(writer);

    // The drain task sees BrokenPipe and stops; give it a moment to run.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!fx.store.exists("/abandoned.txt").await);
}

#[tokio::test]
async fn test_abandoned_buffered_writer_commits_nothing() {
    let fx = fixture(true, TransferSettings::default());
    let mut writer = fx
        .bridge
        .open_write("/abandoned.txt", CancellationToken::new())
        .unwrap();
    writer.write_all(b"half a document").await.unwrap();
    drop(writer);

    assert!(!fx.store.exists("/abandoned.txt").await);
}
