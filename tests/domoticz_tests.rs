//! Tests against a minimal local HTTP server standing in for Domoticz.

use std::sync::Arc;
use std::time::Duration;
use teleinfo_rs::error::TeleinfoError;
use teleinfo_rs::{DeviceStatus, DomoticzClient, DomoticzLog, JobConfig, SensorJob, SensorKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Serves `count` connections with `body`, forwarding each request line.
async fn fake_domoticz(
    status: &'static str,
    body: &'static str,
    count: usize,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/json.htm", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for _ in 0..count {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 512];
            while !request.ends_with(b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&request);
            let line = text.lines().next().unwrap_or_default().to_string();
            tx.send(line).unwrap();
            let response = format!(
                "HTTP/1.0 {status}\r\nContent-Type: application/json\r\n\r\n{body}"
            );
            socket.write_all(response.as_bytes()).await.unwrap();
        }
    });

    (url, rx)
}

fn client(url: &str) -> DomoticzClient {
    DomoticzClient::new(url, Duration::from_secs(2)).unwrap()
}

/// A sensor job delivers its request to Domoticz.
#[tokio::test]
async fn test_sensor_job_over_http() {
    let (url, mut requests) = fake_domoticz("200 OK", r#"{"status":"OK"}"#, 1).await;
    let job = SensorJob::new(
        JobConfig::new(SensorKind::ElectricCounter, 12, Duration::from_secs(20)),
        Arc::new(client(&url)),
    )
    .unwrap();

    job.send((750u64, 7970353u64));
    let line = tokio::time::timeout(Duration::from_secs(2), requests.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        line,
        "GET /json.htm?type=command&param=udevice&idx=12&nvalue=0&svalue=750;7970353 HTTP/1.0"
    );
}

/// Device status is read from the `result` array.
#[tokio::test]
async fn test_device_status() {
    let body = r#"{"result":[{"Name":"Heater","SubType":"Switch","Status":"On","Level":0}],"status":"OK"}"#;
    let (url, mut requests) = fake_domoticz("200 OK", body, 1).await;

    let status = client(&url).device_status(42).await.unwrap();
    assert_eq!(status, DeviceStatus::Switch(true));
    assert_eq!(
        requests.recv().await.unwrap(),
        "GET /json.htm?type=devices&rid=42 HTTP/1.0"
    );
}

/// A non-2xx answer is a delivery failure.
#[tokio::test]
async fn test_error_status() {
    let (url, _requests) = fake_domoticz("500 Internal Server Error", "", 1).await;
    match client(&url).get("?type=devices&rid=1").await {
        Err(TeleinfoError::HttpError(msg)) => assert!(msg.contains("500")),
        other => panic!("unexpected result: {other:?}"),
    }
}

/// Log messages are encoded and delivered in submission order.
#[tokio::test]
async fn test_log_messages_in_order() {
    let (url, mut requests) = fake_domoticz("200 OK", r#"{"status":"OK"}"#, 2).await;
    let log = DomoticzLog::new(Arc::new(client(&url)));

    log.send("Teleinfo started");
    log.send("100% ok");
    assert_eq!(log.close().await, 2);

    assert_eq!(
        requests.recv().await.unwrap(),
        "GET /json.htm?type=command&param=addlogmessage&message=Teleinfo%20started HTTP/1.0"
    );
    assert_eq!(
        requests.recv().await.unwrap(),
        "GET /json.htm?type=command&param=addlogmessage&message=100%25%20ok HTTP/1.0"
    );
}

/// Malformed base URLs are rejected up front.
#[test]
fn test_invalid_urls() {
    for url in ["https://domoticz.lan/json.htm", "http://:8080/json.htm", "http://host:port/"] {
        assert!(matches!(
            DomoticzClient::new(url, Duration::from_secs(1)),
            Err(TeleinfoError::InvalidUrl(_))
        ));
    }
}
