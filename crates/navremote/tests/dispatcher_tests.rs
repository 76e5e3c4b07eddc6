//! End-to-end tests for the dispatcher over a recording transport.

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use common::{trip_json, GatedDecoder, Harness};
use navremote::{
    ActionKind, DispatcherConfig, DownloadFileRequest, DownloadGpxRequest, ErrorKind,
    HistoryFileRef, ListFilesRequest, PeerId, Request, Response,
};

fn list() -> Request {
    Request::ListFiles(ListFilesRequest {})
}

fn download(file: &HistoryFileRef) -> Request {
    Request::DownloadFile(DownloadFileRequest { history_file: file.clone() })
}

fn download_gpx(file: &HistoryFileRef) -> Request {
    Request::DownloadGpx(DownloadGpxRequest { history_file: file.clone() })
}

async fn listed_files(harness: &mut Harness, peer: &PeerId) -> Vec<HistoryFileRef> {
    assert!(harness.bus.publish(peer.clone(), list()));
    match harness.next_sent().await.response {
        Response::FilesList { files } => files,
        other => panic!("expected FilesList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_returns_exactly_visible_files() {
    let mut harness = Harness::start();
    std::fs::write(harness.path().join("trip1.bin"), b"a").unwrap();
    std::fs::write(harness.path().join("trip2.bin"), b"b").unwrap();
    std::fs::write(harness.path().join(".partial"), b"c").unwrap();
    let peer = PeerId::from("phone");

    let files = listed_files(&mut harness, &peer).await;

    let names: BTreeSet<_> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, BTreeSet::from(["trip1.bin", "trip2.bin"]));
    for file in &files {
        assert_eq!(file.path_buf(), harness.path().join(&file.name));
    }
}

#[tokio::test]
async fn test_list_is_idempotent() {
    let mut harness = Harness::start();
    std::fs::write(harness.path().join("trip1.bin"), b"a").unwrap();
    std::fs::write(harness.path().join("trip2.bin"), b"b").unwrap();
    let peer = PeerId::from("phone");

    let first = listed_files(&mut harness, &peer).await;
    let second = listed_files(&mut harness, &peer).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_list_of_empty_directory_is_empty() {
    let mut harness = Harness::start();
    let files = listed_files(&mut harness, &PeerId::from("phone")).await;
    assert!(files.is_empty());
}

#[tokio::test]
async fn test_unreadable_directory_sends_nothing() {
    let mut harness = Harness::start();
    let root = harness.path().to_path_buf();
    std::fs::remove_dir(&root).unwrap();
    let peer = PeerId::from("phone");

    assert!(harness.bus.publish(peer.clone(), list()));

    let failure = harness.next_failure().await;
    assert_eq!(failure.peer, peer);
    assert_eq!(failure.action, ActionKind::ListFiles);
    assert_eq!(failure.kind, ErrorKind::Enumeration);
    assert!(harness.nothing_sent());
}

#[tokio::test]
async fn test_raw_download_returns_exact_bytes() {
    let mut harness = Harness::start();
    let contents: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    std::fs::write(harness.path().join("trip1.bin"), &contents).unwrap();
    let peer = PeerId::from("phone");

    let file = listed_files(&mut harness, &peer).await.remove(0);
    assert!(harness.bus.publish(peer.clone(), download(&file)));

    let sent = harness.next_sent().await;
    assert_eq!(sent.to, vec![peer]);
    assert_eq!(sent.response, Response::RawFile { name: "trip1.bin".to_string(), data: contents });
}

#[tokio::test]
async fn test_raw_download_of_deleted_file_sends_nothing() {
    let mut harness = Harness::start();
    std::fs::write(harness.path().join("trip1.bin"), b"a").unwrap();
    let peer = PeerId::from("phone");

    let file = listed_files(&mut harness, &peer).await.remove(0);
    std::fs::remove_file(file.path_buf()).unwrap();
    assert!(harness.bus.publish(peer.clone(), download(&file)));

    let failure = harness.next_failure().await;
    assert_eq!(failure.action, ActionKind::DownloadFile);
    assert_eq!(failure.kind, ErrorKind::StaleReference);
    assert!(harness.nothing_sent());
}

#[tokio::test]
async fn test_gpx_download_of_deleted_file_sends_nothing() {
    let mut harness = Harness::start();
    std::fs::write(harness.path().join("trip1.json"), trip_json("Ride", 3)).unwrap();
    let peer = PeerId::from("phone");

    let file = listed_files(&mut harness, &peer).await.remove(0);
    std::fs::remove_file(file.path_buf()).unwrap();
    assert!(harness.bus.publish(peer.clone(), download_gpx(&file)));

    let failure = harness.next_failure().await;
    assert_eq!(failure.action, ActionKind::DownloadGpx);
    assert_eq!(failure.kind, ErrorKind::StaleReference);
    assert!(harness.nothing_sent());
}

#[tokio::test]
async fn test_gpx_download_converts_track() {
    let mut harness = Harness::start();
    std::fs::write(harness.path().join("trip1.bin"), trip_json("Ride", 4)).unwrap();
    let peer = PeerId::from("phone");

    let file = listed_files(&mut harness, &peer).await.remove(0);
    assert!(harness.bus.publish(peer.clone(), download_gpx(&file)));

    let sent = harness.next_sent().await;
    assert_eq!(sent.to, vec![peer]);
    let Response::GpxFile { name, data } = sent.response else {
        panic!("expected GpxFile, got {:?}", sent.response);
    };
    assert_eq!(name, "trip1.gpx");

    let gpx = String::from_utf8(data).unwrap();
    assert_eq!(gpx.matches("<trkpt ").count(), 4);
    assert!(gpx.contains(r#"<trkpt lat="48" lon="11">"#));
    assert!(gpx.contains("<name>Ride</name>"));
}

#[tokio::test]
async fn test_gpx_name_without_extension_gets_one() {
    let mut harness = Harness::start();
    std::fs::write(harness.path().join("trip1"), trip_json("Ride", 1)).unwrap();
    let peer = PeerId::from("phone");

    let file = listed_files(&mut harness, &peer).await.remove(0);
    assert!(harness.bus.publish(peer, download_gpx(&file)));

    match harness.next_sent().await.response {
        Response::GpxFile { name, .. } => assert_eq!(name, "trip1.gpx"),
        other => panic!("expected GpxFile, got {other:?}"),
    }
}

#[tokio::test]
async fn test_degenerate_name_falls_back_but_still_delivers() {
    let mut harness = Harness::start();
    std::fs::write(harness.path().join("trip1.bin"), trip_json("Ride", 2)).unwrap();
    let peer = PeerId::from("phone");

    let mut file = listed_files(&mut harness, &peer).await.remove(0);
    file.name = String::new();
    assert!(harness.bus.publish(peer, download_gpx(&file)));

    match harness.next_sent().await.response {
        Response::GpxFile { name, data } => {
            assert_eq!(name, "error.gpx");
            assert!(!data.is_empty());
        },
        other => panic!("expected GpxFile, got {other:?}"),
    }
}

#[tokio::test]
async fn test_undecodable_history_sends_nothing() {
    let mut harness = Harness::start();
    std::fs::write(harness.path().join("trip1.bin"), [0xde, 0xad, 0xbe, 0xef]).unwrap();
    let peer = PeerId::from("phone");

    let file = listed_files(&mut harness, &peer).await.remove(0);
    assert!(harness.bus.publish(peer, download_gpx(&file)));

    assert_eq!(harness.next_failure().await.kind, ErrorKind::Decode);
    assert!(harness.nothing_sent());
}

#[tokio::test]
async fn test_file_outside_history_directory_is_refused() {
    let mut harness = Harness::start();
    let elsewhere = tempfile::tempdir().unwrap();
    let secret = elsewhere.path().join("secret.bin");
    std::fs::write(&secret, b"secret").unwrap();

    let file = HistoryFileRef::new("secret.bin", &secret, chrono::Utc::now());
    assert!(harness.bus.publish(PeerId::from("phone"), download(&file)));

    assert_eq!(harness.next_failure().await.kind, ErrorKind::StaleReference);
    assert!(harness.nothing_sent());
}

#[tokio::test]
async fn test_responses_go_only_to_their_requester() {
    let mut harness = Harness::start();
    let peers: Vec<PeerId> = (0..8).map(|i| PeerId::new(format!("peer-{i}"))).collect();
    for i in 0..peers.len() {
        std::fs::write(harness.path().join(format!("trip{i}.bin")), format!("payload {i}")).unwrap();
    }

    let files = listed_files(&mut harness, &peers[0]).await;
    for (i, peer) in peers.iter().enumerate() {
        let file = files.iter().find(|f| f.name == format!("trip{i}.bin")).unwrap();
        assert!(harness.bus.publish(peer.clone(), download(file)));
    }

    for _ in 0..peers.len() {
        let sent = harness.next_sent().await;
        assert_eq!(sent.to.len(), 1);
        let Response::RawFile { name, data } = sent.response else {
            panic!("expected RawFile");
        };
        let index = peers.iter().position(|p| *p == sent.to[0]).unwrap();
        assert_eq!(name, format!("trip{index}.bin"));
        assert_eq!(data, format!("payload {index}").into_bytes());
    }
}

#[tokio::test]
async fn test_error_responses_reach_only_the_requester() {
    let mut harness =
        Harness::with_config(DispatcherConfig::builder().enable_error_responses().build());
    std::fs::write(harness.path().join("trip1.bin"), b"a").unwrap();
    let peer = PeerId::from("phone");

    let file = listed_files(&mut harness, &peer).await.remove(0);
    std::fs::remove_file(file.path_buf()).unwrap();
    assert!(harness.bus.publish(peer.clone(), download(&file)));

    let sent = harness.next_sent().await;
    assert_eq!(sent.to, vec![peer]);
    match sent.response {
        Response::Error { action, reason } => {
            assert_eq!(action, ActionKind::DownloadFile);
            assert!(reason.starts_with("stale reference"));
        },
        other => panic!("expected Error, got {other:?}"),
    }
    assert!(harness.nothing_sent());
}

#[tokio::test]
async fn test_delivery_failure_is_reported() {
    let offline = PeerId::from("gone");
    let mut harness = Harness::with_offline(vec![offline.clone()]);

    assert!(harness.bus.publish(offline.clone(), list()));

    let failure = harness.next_failure().await;
    assert_eq!(failure.peer, offline);
    assert_eq!(failure.kind, ErrorKind::Delivery);
}

#[tokio::test]
async fn test_shutdown_unsubscribes_every_action() {
    let harness = Harness::start();
    assert!(harness.handle.is_running());

    let bus = harness.bus.clone();
    harness.handle.shutdown().await;

    for kind in ActionKind::ALL {
        assert!(!bus.is_subscribed(kind));
    }
    assert!(!bus.publish(PeerId::from("phone"), list()));
}

#[tokio::test]
async fn test_slow_conversion_does_not_delay_other_actions() {
    let (decoder, mut entered, release) = GatedDecoder::new();
    let mut harness = Harness::with_decoder(Arc::new(decoder));
    std::fs::write(harness.path().join("trip1.bin"), trip_json("Slow", 3)).unwrap();
    let peer = PeerId::from("phone");
    let file = listed_files(&mut harness, &peer).await.remove(0);

    assert!(harness.bus.publish(peer.clone(), download_gpx(&file)));
    tokio::time::timeout(Duration::from_secs(5), entered.recv())
        .await
        .expect("conversion never started");

    // GPX handler is parked inside the decoder.
    assert!(harness.bus.publish(peer.clone(), list()));
    assert!(matches!(harness.next_sent().await.response, Response::FilesList { .. }));
    assert!(harness.bus.publish(peer.clone(), download(&file)));
    assert!(matches!(harness.next_sent().await.response, Response::RawFile { .. }));

    release.send(()).unwrap();
    match harness.next_sent().await.response {
        Response::GpxFile { name, .. } => assert_eq!(name, "trip1.gpx"),
        other => panic!("expected GpxFile, got {other:?}"),
    }
}
