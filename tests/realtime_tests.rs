#![cfg(feature = "realtime")]

mod realtime {
    use std::sync::Arc;
    use std::time::Duration;

    use crm_client::auth::{MemoryTokenStore, TokenStore};
    use crm_client::error::{CrmError, StatusCode};
    use crm_client::realtime::{RealtimeCapability, RealtimeChannel, GRAPHQL_TRANSPORT_WS};
    use futures::{SinkExt, StreamExt};
    use serde_json::{json, Value};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;
    use tokio::time::timeout;
    use tokio_tungstenite::{
        accept_hdr_async,
        tungstenite::{
            handshake::server::{Request, Response},
            http::HeaderValue,
            Message,
        },
        WebSocketStream,
    };

    type ServerSocket = WebSocketStream<tokio::net::TcpStream>;

    async fn accept(listener: &TcpListener) -> (ServerSocket, String) {
        let (stream, _) = listener.accept().await.expect("server should accept");
        let (protocol_tx, protocol_rx) = std::sync::mpsc::channel();
        let ws = accept_hdr_async(stream, move |req: &Request, mut response: Response| {
            let protocol = req
                .headers()
                .get("sec-websocket-protocol")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let _ = protocol_tx.send(protocol);
            response.headers_mut().insert(
                "sec-websocket-protocol",
                HeaderValue::from_static(GRAPHQL_TRANSPORT_WS),
            );
            Ok(response)
        })
        .await
        .expect("handshake should succeed");
        let protocol = protocol_rx.recv().expect("protocol captured");
        (ws, protocol)
    }

    async fn next_json(ws: &mut ServerSocket) -> Value {
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("frame should arrive")
            .expect("socket should stay open")
            .expect("frame should parse");
        match frame {
            Message::Text(text) => serde_json::from_str(&text).expect("frame is JSON"),
            other => panic!("expected text frame, got {other:?}"),
        }
    }

    async fn send_json(ws: &mut ServerSocket, value: Value) {
        ws.send(Message::Text(value.to_string()))
            .await
            .expect("server send");
    }

    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("local addr");
        (listener, format!("ws://{address}/graphql"))
    }

    #[tokio::test]
    async fn handshake_carries_token_read_at_connect_time_and_streams_next_payloads() {
        let (listener, url) = bind().await;
        let (observed_tx, observed_rx) = oneshot::channel::<(String, Value, Value)>();

        let server = tokio::spawn(async move {
            let (mut ws, protocol) = accept(&listener).await;
            let init = next_json(&mut ws).await;
            send_json(&mut ws, json!({"type": "connection_ack"})).await;

            let subscribe = next_json(&mut ws).await;
            let id = subscribe["id"].clone();
            send_json(
                &mut ws,
                json!({"type": "next", "id": id, "payload": {"data": {"companyCreated": {"id": "9"}}}}),
            )
            .await;
            send_json(&mut ws, json!({"type": "complete", "id": id})).await;
            let _ = observed_tx.send((protocol, init, subscribe));
        });

        let store = Arc::new(MemoryTokenStore::new());
        let channel =
            RealtimeChannel::create(RealtimeCapability::Available, url, store.clone()).unwrap();
        store.set("fresh-token").unwrap();

        let connection = channel.connect().await.expect("connect");
        let mut stream = connection
            .subscribe(
                "subscription { companyCreated { id } }",
                json!({}),
            )
            .await
            .expect("subscribe");

        let item = timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("payload in time")
            .expect("stream yields")
            .expect("payload ok");
        assert_eq!(item, json!({"data": {"companyCreated": {"id": "9"}}}));
        assert!(timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("stream ends in time")
            .is_none());

        let (protocol, init, subscribe) = observed_rx.await.expect("observation");
        server.await.expect("server task");

        assert_eq!(protocol, "graphql-transport-ws");
        assert_eq!(
            init,
            json!({
                "type": "connection_init",
                "payload": {"headers": {"Authorization": "Bearer fresh-token"}}
            })
        );
        assert_eq!(subscribe["type"], "subscribe");
        assert_eq!(
            subscribe["payload"]["query"],
            "subscription { companyCreated { id } }"
        );
    }

    #[tokio::test]
    async fn handshake_without_token_sends_bearer_undefined() {
        let (listener, url) = bind().await;
        let (init_tx, init_rx) = oneshot::channel::<Value>();

        let server = tokio::spawn(async move {
            let (mut ws, _) = accept(&listener).await;
            let init = next_json(&mut ws).await;
            send_json(&mut ws, json!({"type": "connection_ack"})).await;
            let _ = init_tx.send(init);
            let _ = ws.next().await;
        });

        let store = Arc::new(MemoryTokenStore::new());
        let channel = RealtimeChannel::create(RealtimeCapability::Available, url, store).unwrap();
        let connection = channel.connect().await.expect("connect");

        let init = init_rx.await.expect("init observed");
        assert_eq!(
            init["payload"]["headers"]["Authorization"],
            "Bearer undefined"
        );
        connection.close().await.expect("close");
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn error_frame_surfaces_as_envelope() {
        let (listener, url) = bind().await;

        let server = tokio::spawn(async move {
            let (mut ws, _) = accept(&listener).await;
            let _ = next_json(&mut ws).await;
            send_json(&mut ws, json!({"type": "connection_ack"})).await;
            let subscribe = next_json(&mut ws).await;
            send_json(
                &mut ws,
                json!({
                    "type": "error",
                    "id": subscribe["id"],
                    "payload": [{"message": "Forbidden resource", "extensions": {"code": "FORBIDDEN"}}]
                }),
            )
            .await;
        });

        let store = Arc::new(MemoryTokenStore::with_token("tok"));
        let channel = RealtimeChannel::create(RealtimeCapability::Available, url, store).unwrap();
        let mut stream = channel
            .connect()
            .await
            .expect("connect")
            .subscribe("subscription { dealUpdated { id } }", json!({}))
            .await
            .expect("subscribe");

        let item = timeout(Duration::from_secs(2), stream.next())
            .await
            .expect("item in time")
            .expect("stream yields");
        match item {
            Err(CrmError::Envelope(envelope)) => {
                assert_eq!(envelope.message, "Forbidden resource");
                assert_eq!(envelope.status_code, StatusCode::code("FORBIDDEN"));
            }
            other => panic!("expected envelope error, got {other:?}"),
        }
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn missing_ack_times_out() {
        let (listener, url) = bind().await;

        let server = tokio::spawn(async move {
            let (mut ws, _) = accept(&listener).await;
            let _ = next_json(&mut ws).await;
            tokio::time::sleep(Duration::from_millis(500)).await;
        });

        let store = Arc::new(MemoryTokenStore::new());
        let channel = RealtimeChannel::create(RealtimeCapability::Available, url, store)
            .unwrap()
            .with_ack_timeout(Duration::from_millis(100));

        let err = channel.connect().await.unwrap_err();
        assert!(matches!(err, CrmError::Realtime(ref msg) if msg.contains("connection_ack")));
        server.await.expect("server task");
    }

    #[tokio::test]
    async fn unexpected_frame_before_ack_is_rejected() {
        let (listener, url) = bind().await;

        let server = tokio::spawn(async move {
            let (mut ws, _) = accept(&listener).await;
            let _ = next_json(&mut ws).await;
            send_json(&mut ws, json!({"type": "next", "id": "x"})).await;
        });

        let store = Arc::new(MemoryTokenStore::new());
        let channel = RealtimeChannel::create(RealtimeCapability::Available, url, store).unwrap();
        let err = channel.connect().await.unwrap_err();
        assert!(matches!(err, CrmError::Realtime(ref msg) if msg.contains("expected connection_ack")));
        server.await.expect("server task");
    }

    #[test]
    fn unavailable_host_gets_no_channel() {
        let store = Arc::new(MemoryTokenStore::new());
        assert!(
            RealtimeChannel::create(RealtimeCapability::Unavailable, "ws://unused", store)
                .is_none()
        );
    }
}
