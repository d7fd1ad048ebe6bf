//! Test helpers for integration tests
//!
//! Provides a test server and a small hub client that speaks the frame
//! protocol.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use lms_chat_common::AppConfig;
use lms_chat_gateway::{create_app, create_gateway_state};
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// How long a test waits for any single frame
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Op codes used by the tests
pub mod op {
    pub const DISPATCH: u64 = 0;
    pub const HEARTBEAT: u64 = 1;
    pub const JOIN_CHAT: u64 = 2;
    pub const LEAVE_CHAT: u64 = 3;
    pub const SEND_MESSAGE: u64 = 4;
    pub const TYPING: u64 = 5;
    pub const STOP_TYPING: u64 = 6;
    pub const HELLO: u64 = 10;
    pub const HEARTBEAT_ACK: u64 = 11;
}

/// Build a config from `(key, value)` overrides on top of the defaults
pub fn test_config(overrides: &[(&str, &str)]) -> Result<AppConfig> {
    let config = AppConfig::from_lookup(|key| {
        overrides
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
            .or_else(|| (key == "GATEWAY_PORT").then(|| "0".to_string()))
    })?;
    Ok(config)
}

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a hub with default settings
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config(&[])?).await
    }

    /// Start a hub with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let app = create_app(create_gateway_state(config));

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Fetch the presence snapshot for a user
    pub async fn presence(&self, user_id: &str) -> Result<Value> {
        let response = self.get(&format!("/presence/{user_id}")).await?;
        if !response.status().is_success() {
            bail!("presence lookup failed: {}", response.status());
        }
        Ok(response.json().await?)
    }

    /// Poll the presence route until `is_online` matches or the timeout passes
    pub async fn wait_for_online(&self, user_id: &str, is_online: bool) -> Result<()> {
        let deadline = tokio::time::Instant::now() + FRAME_TIMEOUT;
        loop {
            if self.presence(user_id).await?["IsOnline"] == is_online {
                return Ok(());
            }
            if tokio::time::Instant::now() > deadline {
                bail!("{user_id} never became online={is_online}");
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }

    /// Open a hub connection identified through the `user_id` query parameter
    pub async fn connect(&self, user_id: Option<&str>) -> Result<HubClient> {
        let url = match user_id {
            Some(id) => format!("ws://{}/hub?user_id={id}", self.addr),
            None => format!("ws://{}/hub", self.addr),
        };
        HubClient::open(url.into_client_request()?).await
    }

    /// Open a hub connection identified through a request header
    pub async fn connect_with_header(&self, header: &'static str, user_id: &str) -> Result<HubClient> {
        let mut request = format!("ws://{}/hub", self.addr).into_client_request()?;
        request
            .headers_mut()
            .insert(header, HeaderValue::from_str(user_id)?);
        HubClient::open(request).await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A hub client speaking `{op, t, s, d}` frames
pub struct HubClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Payload of the Hello frame received on connect
    pub hello: Value,
}

impl HubClient {
    async fn open(
        request: tokio_tungstenite::tungstenite::handshake::client::Request,
    ) -> Result<Self> {
        let (ws, _) = connect_async(request).await?;
        let mut client = Self {
            ws,
            hello: Value::Null,
        };

        let hello = client.next_frame().await?;
        if hello["op"] != op::HELLO {
            bail!("expected Hello, got {hello}");
        }
        client.hello = hello["d"].clone();
        Ok(client)
    }

    /// Send a raw text frame
    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws.send(Message::Text(text.to_string())).await?;
        Ok(())
    }

    /// Send a binary frame, which the hub does not accept
    pub async fn send_binary(&mut self, data: Vec<u8>) -> Result<()> {
        self.ws.send(Message::Binary(data)).await?;
        Ok(())
    }

    /// Send a frame with the given op and payload
    pub async fn send(&mut self, op: u64, d: Value) -> Result<()> {
        self.send_raw(&json!({ "op": op, "d": d }).to_string()).await
    }

    pub async fn join(&mut self, chat_id: i64) -> Result<()> {
        self.send(op::JOIN_CHAT, json!({ "ChatId": chat_id })).await
    }

    pub async fn leave(&mut self, chat_id: i64) -> Result<()> {
        self.send(op::LEAVE_CHAT, json!({ "ChatId": chat_id })).await
    }

    pub async fn typing(&mut self, chat_id: i64) -> Result<()> {
        self.send(op::TYPING, json!({ "ChatId": chat_id })).await
    }

    pub async fn stop_typing(&mut self, chat_id: i64) -> Result<()> {
        self.send(op::STOP_TYPING, json!({ "ChatId": chat_id })).await
    }

    pub async fn message(&mut self, chat_id: i64, text: &str) -> Result<()> {
        self.send(op::SEND_MESSAGE, json!({ "ChatId": chat_id, "Message": text }))
            .await
    }

    /// Read the next text frame as JSON
    pub async fn next_frame(&mut self) -> Result<Value> {
        loop {
            let msg = tokio::time::timeout(FRAME_TIMEOUT, self.ws.next())
                .await
                .map_err(|_| anyhow!("timed out waiting for a frame"))?
                .ok_or_else(|| anyhow!("connection closed"))??;

            match msg {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(frame) => bail!("connection closed: {frame:?}"),
                _ => {}
            }
        }
    }

    /// Skip frames until a dispatch of the given event type arrives
    pub async fn next_dispatch(&mut self, event: &str) -> Result<Value> {
        loop {
            let frame = self.next_frame().await?;
            if frame["op"] == op::DISPATCH && frame["t"] == event {
                return Ok(frame);
            }
        }
    }

    /// Heartbeat and wait for its ack.
    ///
    /// Frames are handled in order per connection, so everything sent before
    /// this call has been processed once it returns. Returns the dispatches
    /// that arrived ahead of the ack.
    pub async fn sync(&mut self) -> Result<Vec<Value>> {
        self.send(op::HEARTBEAT, Value::Null).await?;

        let mut seen = Vec::new();
        loop {
            let frame = self.next_frame().await?;
            if frame["op"] == op::HEARTBEAT_ACK {
                return Ok(seen);
            }
            seen.push(frame);
        }
    }

    /// Wait until the server ends the connection and return its close code
    pub async fn expect_close_code(&mut self) -> Result<u16> {
        loop {
            match tokio::time::timeout(FRAME_TIMEOUT, self.ws.next()).await {
                Err(_) => bail!("connection still open"),
                Ok(Some(Ok(Message::Close(Some(frame))))) => return Ok(u16::from(frame.code)),
                Ok(Some(Ok(Message::Close(None)))) => bail!("close frame carried no code"),
                Ok(None | Some(Err(_))) => bail!("connection dropped without a close frame"),
                Ok(Some(Ok(_))) => {}
            }
        }
    }

    /// Close the connection from the client side
    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// Dispatches of one event type among `frames`
pub fn dispatches<'a>(frames: &'a [Value], event: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    frames
        .iter()
        .filter(move |f| f["op"] == op::DISPATCH && f["t"] == event)
}
