//! End-to-end scenarios: a request description goes in, delegate traffic
//! and queue accounting come out.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingDelegate, Script, ScriptedTransport, get, isolated_queue, operation};
use netop::{Attachment, NetworkConfig, NetworkOperation, OperationError, OperationState, RequestSpec, TransportError};
use netop_codec::decompress;

#[tokio::test(start_paused = true)]
async fn test_ping_times_out_twice_then_fails() {
    let transport = ScriptedTransport::new(Script::Hang);
    let queue = isolated_queue(4);
    let delegate = RecordingDelegate::new();
    let op = operation(
        get("https://example.test/ping")
            .timeout(Duration::from_secs(2))
            .retries_on_timeout(1),
        &transport,
    );
    op.set_delegate(delegate.clone());

    op.submit(&queue).unwrap();
    let error = op.completion().await.unwrap_err();

    assert_eq!(op.state(), OperationState::Failed);
    assert!(matches!(
        *error,
        OperationError::TimeoutExceeded { attempts: 2, timeout } if timeout == Duration::from_secs(2)
    ));
    assert_eq!(delegate.timeouts(), 2);
    assert_eq!(delegate.fails(), 1);
    assert_eq!(delegate.terminals(), 1);
    assert_eq!(queue.active_operation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_compressed_jpeg_upload_keeps_the_payload_intact() {
    let mut jpeg = vec![0xff_u8, 0xd8, 0xff, 0xe0];
    jpeg.extend_from_slice(&[0x42; 64]);
    jpeg.extend_from_slice(&[0xff, 0xd9]);
    let transport = ScriptedTransport::new(Script::status(201, "stored"));
    let queue = isolated_queue(4);
    let spec = RequestSpec::post("https://example.test/photos")
        .unwrap()
        .param("caption", "sunset")
        .attachment(Attachment::jpeg(jpeg.clone(), 0.8))
        .compress_body(true);
    let op = operation(spec, &transport);

    op.submit(&queue).unwrap();
    let response = op.completion().await.unwrap();
    assert_eq!(response.status_code, 201);

    let request = &transport.opened()[0];
    assert_eq!(request.header("Content-Encoding"), Some("gzip"));
    let content_type = request.header("Content-Type").unwrap();
    let boundary = content_type.split("boundary=").nth(1).unwrap();

    let body = decompress(&request.body).unwrap();
    let opening = format!("--{boundary}\r\n");
    let closing = format!("--{boundary}--\r\n");
    assert!(body.starts_with(opening.as_bytes()));
    assert!(body.ends_with(closing.as_bytes()));
    assert!(body.windows(jpeg.len()).any(|window| window == jpeg.as_slice()));
    assert!(
        body.windows(b"Content-Type: image/jpeg".len())
            .any(|window| window == b"Content-Type: image/jpeg")
    );
}

#[tokio::test(start_paused = true)]
async fn test_exactly_one_terminal_notification_each() {
    let transport = ScriptedTransport::with_scripts(
        vec![
            Script::ok("a"),
            Script::fail(TransportError::Network("reset".to_string())),
            Script::Hang,
            Script::status(500, "boom"),
        ],
        Script::Hang,
    );
    let queue = isolated_queue(2);
    let delegates: Vec<Arc<RecordingDelegate>> = (0..6).map(|_| RecordingDelegate::new()).collect();
    let ops: Vec<NetworkOperation> = delegates
        .iter()
        .enumerate()
        .map(|(i, delegate)| {
            let op = operation(
                get(&format!("https://example.test/{i}")).timeout(Duration::from_secs(1)),
                &transport,
            );
            op.set_delegate(delegate.clone());
            op
        })
        .collect();
    for op in &ops {
        op.submit(&queue).unwrap();
    }
    ops[5].cancel();
    ops[5].cancel();
    queue.drained().await;

    for (op, delegate) in ops.iter().zip(&delegates) {
        assert!(op.is_finished());
        assert_eq!(delegate.terminals(), 1, "{op:?}");
        op.cancel();
        assert_eq!(delegate.terminals(), 1, "{op:?}");
    }
    assert_eq!(queue.active_operation_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_configuration_file_drives_operations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("netop.toml");
    std::fs::write(
        &path,
        "[operation]\ntimeout_interval = 0.5\nnumber_of_times_to_retry_on_timeout = 2\n\n\
         [queue]\nmax_concurrent_operations = 1\n",
    )
    .unwrap();
    let config = NetworkConfig::load(&path).unwrap();

    let transport = ScriptedTransport::new(Script::Hang);
    let queue = netop::OperationQueue::with_counter(config.queue, Arc::new(netop::ActiveCounter::new())).unwrap();
    let op = operation(get("https://example.test/").config(config.operation), &transport);

    op.submit(&queue).unwrap();
    let error = op.completion().await.unwrap_err();

    assert!(matches!(*error, OperationError::TimeoutExceeded { attempts: 3, .. }));
    assert_eq!(queue.max_concurrent_operations(), 1);
}
