//! End-to-end tests against a scripted in-process peer.
//!
//! The peer speaks the real wire format over a duplex stream: it verifies
//! the handshake bytes, negotiates a server version, answers StartAPI and
//! then plays whatever frames each test scripts.

use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream, ReadHalf, WriteHalf};
use tokio::time::Duration;

use tws_client::bus::{ClientEvent, StreamEvent};
use tws_client::protocol::{encode_frame, FrameBuffer};
use tws_client::transport::spawn_io;
use tws_client::{Client, Config, Contract, Order};

struct FakeServer {
    read: ReadHalf<DuplexStream>,
    write: WriteHalf<DuplexStream>,
    frame_buffer: FrameBuffer,
    pending: Vec<Vec<String>>,
}

impl FakeServer {
    fn new(io: DuplexStream) -> Self {
        let (read, write) = tokio::io::split(io);
        Self {
            read,
            write,
            frame_buffer: FrameBuffer::new(),
            pending: Vec::new(),
        }
    }

    /// Consume the `API\0` preamble and the framed version-range string.
    async fn expect_handshake(&mut self) {
        let mut prefix = [0u8; 4];
        self.read.read_exact(&mut prefix).await.unwrap();
        assert_eq!(&prefix, b"API\0");

        let mut len = [0u8; 4];
        self.read.read_exact(&mut len).await.unwrap();
        let mut version = vec![0u8; u32::from_be_bytes(len) as usize];
        self.read.read_exact(&mut version).await.unwrap();
        assert_eq!(version, b"v100..151");
    }

    /// Next complete fieldset sent by the client.
    async fn next_fields(&mut self) -> Vec<String> {
        loop {
            if !self.pending.is_empty() {
                return self.pending.remove(0);
            }
            let mut buf = [0u8; 4096];
            let n = self.read.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed the connection");
            self.pending
                .extend(self.frame_buffer.push(&buf[..n]).unwrap());
        }
    }

    async fn send(&mut self, fields: &[&str]) {
        let fields: Vec<String> = fields.iter().map(|s| s.to_string()).collect();
        self.write.write_all(&encode_frame(&fields)).await.unwrap();
        self.write.flush().await.unwrap();
    }
}

/// Bring up a negotiated session against the scripted peer.
///
/// The peer seeds next-valid-id 4, so the first allocated request id is 5.
async fn establish() -> (Client, FakeServer) {
    let (client_io, server_io) = duplex(1 << 16);
    let (read, write) = tokio::io::split(client_io);
    let (writer, frames) = spawn_io(read, write);
    let mut server = FakeServer::new(server_io);

    let config = Config {
        timeout: Duration::from_secs(5),
        ..Default::default()
    };

    let client_task = Client::attach_session_for_tests(config, writer, frames);
    let server_task = async {
        server.expect_handshake().await;
        server.send(&["151", "20260806 09:30:00 EST"]).await;

        let start_api = server.next_fields().await;
        assert_eq!(&start_api[..2], &["71", "2"]);

        server.send(&["9", "1", "4"]).await; // next valid id
        server.send(&["15", "1", "DU111,DU222"]).await; // managed accounts
        server
    };

    let (client, server) = tokio::join!(client_task, server_task);
    (client.unwrap(), server)
}

#[tokio::test]
async fn test_connect_negotiates_version_and_accounts() {
    let (client, _server) = establish().await;

    assert_eq!(client.server_version().await.unwrap(), 151);
    assert_eq!(
        client.managed_accounts().await.unwrap(),
        vec!["DU111".to_string(), "DU222".to_string()]
    );
}

#[tokio::test]
async fn test_current_time_round_trip() {
    let (client, mut server) = establish().await;

    let request = tokio::spawn(async move { client.current_time().await });

    let fields = server.next_fields().await;
    assert_eq!(fields, vec!["49", "1"]);
    server.send(&["49", "1", "1766000000"]).await;

    assert_eq!(request.await.unwrap().unwrap(), 1766000000);
}

/// Paginated response shape: request id 5, two records, a terminator,
/// exactly one resolution carrying both records.
#[tokio::test]
async fn test_accumulated_response_resolves_once() {
    let (client, mut server) = establish().await;

    let underlying = Contract {
        con_id: 11004968,
        ..Contract::stock("SPY")
    };
    let request =
        tokio::spawn(async move { client.sec_def_opt_params(&underlying, "", None).await });

    let fields = server.next_fields().await;
    assert_eq!(fields[0], "78");
    assert_eq!(fields[1], "5"); // first id allocated after seed 4

    server
        .send(&[
            "75", "5", "CBOE", "11004968", "SPY", "100", "2", "20260918", "20261218", "2",
            "400", "410",
        ])
        .await;
    server
        .send(&["75", "5", "AMEX", "11004968", "SPY", "100", "1", "20260918", "1", "405"])
        .await;
    server.send(&["76", "5"]).await;

    let rows = request.await.unwrap().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].exchange, "CBOE");
    assert_eq!(rows[0].expirations.len(), 2);
    assert_eq!(rows[1].strikes, vec![405.0]);
}

#[tokio::test]
async fn test_market_data_stream_and_teardown() {
    let (client, mut server) = establish().await;

    let mut subscription = client
        .stream_market_data(&Contract::stock("AAPL"))
        .await
        .unwrap();
    let request_id = subscription.request_id();
    assert_eq!(request_id, 5);

    let fields = server.next_fields().await;
    assert_eq!(fields[0], "1");
    assert_eq!(fields[2], "5");

    // One bid tick: price event plus the implicit size event.
    server.send(&["1", "6", "5", "1", "99.5", "300", "0"]).await;

    assert_eq!(
        subscription.recv().await.unwrap(),
        StreamEvent::Tick {
            tick_type: 1,
            value: 99.5,
            mask: Some(0)
        }
    );
    assert_eq!(
        subscription.recv().await.unwrap(),
        StreamEvent::TickSize {
            tick_type: 0,
            size: 300
        }
    );

    // Teardown sends the protocol-level cancel.
    subscription.stop().unwrap();
    let cancel = server.next_fields().await;
    assert_eq!(cancel, vec!["2", "2", "5"]);
}

#[tokio::test]
async fn test_place_order_and_status_event() {
    let (client, mut server) = establish().await;
    let mut events = client.events();

    let order_id = client
        .place_order(&Contract::stock("MSFT"), &Order::limit("BUY", 100.0, 330.25))
        .await
        .unwrap();
    assert_eq!(order_id, 5);

    let fields = server.next_fields().await;
    assert_eq!(fields[0], "3");
    assert_eq!(fields[1], "5");
    assert_eq!(&fields[3..6], &["MSFT", "STK", ""]);

    server
        .send(&[
            "3", "5", "Submitted", "0", "100", "0", "912", "0", "0", "1", "", "",
        ])
        .await;

    match events.recv().await.unwrap() {
        ClientEvent::OrderStatus(status) => {
            assert_eq!(status.order_id, 5);
            assert_eq!(status.status, "Submitted");
            assert_eq!(status.remaining, 100.0);
        }
        other => panic!("expected order status, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancel_order_resolved_by_error_code() {
    let (client, mut server) = establish().await;

    let cancel = tokio::spawn(async move { client.cancel_order(42).await });

    let fields = server.next_fields().await;
    assert_eq!(fields, vec!["4", "1", "42"]);
    server
        .send(&["4", "2", "42", "202", "Order Canceled - reason:"])
        .await;

    let ack = cancel.await.unwrap().unwrap();
    assert_eq!(ack.code, 202);
}

#[tokio::test]
async fn test_request_error_rejects_future() {
    let (client, mut server) = establish().await;

    let request = tokio::spawn(async move {
        client.contract_details(&Contract::stock("NOPE")).await
    });

    let fields = server.next_fields().await;
    assert_eq!(fields[0], "9");
    let request_id = fields[2].clone();

    server
        .send(&["4", "2", &request_id, "200", "No security definition has been found"])
        .await;

    match request.await.unwrap() {
        Err(tws_client::TwsError::Request { code, .. }) => assert_eq!(code, 200),
        other => panic!("expected request error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_broadcast_error_reaches_event_channel() {
    let (client, mut server) = establish().await;
    let mut events = client.events();

    server.send(&["4", "2", "-1", "1100", "Connectivity lost"]).await;

    match events.recv().await.unwrap() {
        ClientEvent::Error(e) => assert_eq!(e.code, 1100),
        other => panic!("expected error event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_peer_close_emits_close_event() {
    let (client, server) = establish().await;
    let mut events = client.events();

    drop(server);

    loop {
        match events.recv().await.unwrap() {
            ClientEvent::Close => break,
            _ => continue,
        }
    }
}

#[tokio::test]
async fn test_split_frame_delivery_still_resolves() {
    let (client, mut server) = establish().await;

    let request = tokio::spawn(async move { client.current_time().await });

    let fields = server.next_fields().await;
    assert_eq!(fields, vec!["49", "1"]);

    // Deliver the response one byte at a time.
    let reply: Vec<String> = ["49", "1", "1766000001"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for byte in encode_frame(&reply) {
        server.write.write_all(&[byte]).await.unwrap();
        server.write.flush().await.unwrap();
    }

    assert_eq!(request.await.unwrap().unwrap(), 1766000001);
}
