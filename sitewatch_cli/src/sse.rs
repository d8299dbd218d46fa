use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use reqwest::{header::ACCEPT, Client};
use sitewatch_core::{
    error::ChannelError,
    feed::{ChannelEvent, EventChannel, RawPayload},
};
use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};
use tracing::{debug, warn};

type EventStream = Pin<
    Box<dyn Stream<Item = Result<eventsource_stream::Event, EventStreamError<reqwest::Error>>> + Send>,
>;

/// Push channel reading Server-Sent Events from the feed server.
pub struct SseChannel {
    client: Client,
    url: String,
    stream: Option<EventStream>,
    announce_connect: bool,
    idle_timeout: Option<Duration>,
    opened_at: Instant,
    /// Milliseconds after `opened_at` at which bytes last arrived.
    last_bytes: Arc<AtomicU64>,
}

impl SseChannel {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            stream: None,
            announce_connect: false,
            idle_timeout: None,
            opened_at: Instant::now(),
            last_bytes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Treats the stream as dead when no bytes, keep-alive comments
    /// included, arrive for `timeout`.
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

fn quiet_for(opened_at: Instant, last_bytes: &AtomicU64) -> Duration {
    opened_at
        .elapsed()
        .saturating_sub(Duration::from_millis(last_bytes.load(Ordering::Relaxed)))
}

#[async_trait]
impl EventChannel for SseChannel {
    async fn open(&mut self) -> Result<(), ChannelError> {
        if self.stream.is_some() {
            return Err(ChannelError::AlreadyOpen);
        }
        debug!(url = %self.url, "opening event stream");

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?
            .error_for_status()
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        let opened_at = Instant::now();
        let last_bytes = Arc::new(AtomicU64::new(0));
        let seen = Arc::clone(&last_bytes);
        let bytes = response.bytes_stream().inspect(move |_| {
            seen.store(opened_at.elapsed().as_millis() as u64, Ordering::Relaxed);
        });

        self.stream = Some(Box::pin(bytes.eventsource()));
        self.opened_at = opened_at;
        self.last_bytes = last_bytes;
        self.announce_connect = true;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<ChannelEvent> {
        if self.announce_connect {
            self.announce_connect = false;
            return Some(ChannelEvent::Connected);
        }
        let stream = self.stream.as_mut()?;
        let next = match self.idle_timeout {
            None => stream.next().await,
            Some(idle) => {
                let mut wait = idle;
                loop {
                    match tokio::time::timeout(wait, stream.next()).await {
                        Ok(next) => break next,
                        Err(_) => {
                            let quiet = quiet_for(self.opened_at, &self.last_bytes);
                            if quiet >= idle {
                                warn!(
                                    url = %self.url,
                                    quiet_ms = quiet.as_millis() as u64,
                                    "event stream went quiet"
                                );
                                self.stream = None;
                                return Some(ChannelEvent::Error(format!(
                                    "no data received for {} ms",
                                    quiet.as_millis()
                                )));
                            }
                            wait = idle - quiet;
                        }
                    }
                }
            }
        };
        match next {
            Some(Ok(event)) => Some(ChannelEvent::Message {
                event: event.event,
                payload: RawPayload::Text(event.data),
            }),
            Some(Err(e)) => {
                self.stream = None;
                Some(ChannelEvent::Error(e.to_string()))
            }
            None => {
                self.stream = None;
                Some(ChannelEvent::Disconnected(Some("event stream ended".into())))
            }
        }
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!(url = %self.url, "event stream closed");
        }
        self.announce_connect = false;
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};
    use sitewatch_core::feed::ACTIVITY_EVENT;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves a single canned HTTP response, then closes the connection.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/events", addr)
    }

    const SSE_HEAD: &str = "HTTP/1.1 200 OK\r\n\
                            Content-Type: text/event-stream\r\n\
                            Connection: close\r\n\r\n";

    /// Writes the SSE head, then each chunk after `gap`, and keeps the
    /// connection open afterwards without sending anything.
    async fn serve_held(chunks: Vec<&'static str>, gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(SSE_HEAD.as_bytes()).await.unwrap();
            for chunk in chunks {
                tokio::time::sleep(gap).await;
                socket.write_all(chunk.as_bytes()).await.unwrap();
            }
            tokio::time::sleep(Duration::from_secs(30)).await;
        });
        format!("http://{}/events", addr)
    }

    #[tokio::test]
    async fn test_silent_stream_times_out() {
        let url = serve_held(Vec::new(), Duration::ZERO).await;
        let mut channel =
            SseChannel::new(Client::new(), url).with_idle_timeout(Duration::from_millis(200));
        assert_ok!(channel.open().await);
        assert_eq!(channel.next_event().await, Some(ChannelEvent::Connected));

        let started = Instant::now();
        assert!(matches!(
            channel.next_event().await,
            Some(ChannelEvent::Error(_))
        ));
        assert!(started.elapsed() >= Duration::from_millis(150));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_keep_alive_comments_hold_the_stream() {
        let url = serve_held(
            vec![
                ": keep-alive\n\n",
                ": keep-alive\n\n",
                ": keep-alive\n\n",
                ": keep-alive\n\n",
                "event: activity\ndata: {\"message\":\"late\"}\n\n",
            ],
            Duration::from_millis(100),
        )
        .await;
        let mut channel =
            SseChannel::new(Client::new(), url).with_idle_timeout(Duration::from_millis(300));
        assert_ok!(channel.open().await);
        assert_eq!(channel.next_event().await, Some(ChannelEvent::Connected));

        loop {
            match channel.next_event().await {
                Some(ChannelEvent::Message { event, payload }) if event == ACTIVITY_EVENT => {
                    assert_eq!(payload, RawPayload::Text("{\"message\":\"late\"}".into()));
                    break;
                }
                Some(ChannelEvent::Message { .. }) => continue,
                other => panic!("unexpected event: {:?}", other),
            }
        }
        assert!(channel.is_open());
    }

    #[tokio::test]
    async fn test_reads_named_events_until_stream_ends() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\n\
             Content-Type: text/event-stream\r\n\
             Connection: close\r\n\r\n\
             event: activity\n\
             data: {\"id\":1,\"message\":\"hello\"}\n\n",
        )
        .await;

        let mut channel = SseChannel::new(Client::new(), url);
        assert_ok!(channel.open().await);
        assert!(channel.is_open());
        assert_eq!(channel.next_event().await, Some(ChannelEvent::Connected));

        match channel.next_event().await {
            Some(ChannelEvent::Message { event, payload }) => {
                assert_eq!(event, ACTIVITY_EVENT);
                assert_eq!(
                    payload,
                    RawPayload::Text("{\"id\":1,\"message\":\"hello\"}".into())
                );
            }
            other => panic!("unexpected event: {:?}", other),
        }

        assert!(matches!(
            channel.next_event().await,
            Some(ChannelEvent::Disconnected(_)) | Some(ChannelEvent::Error(_))
        ));
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_http_error_fails_open() {
        let url = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let mut channel = SseChannel::new(Client::new(), url);
        assert!(matches!(
            channel.open().await,
            Err(ChannelError::Connect(_))
        ));
        assert!(!channel.is_open());
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_open() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut channel = SseChannel::new(Client::new(), format!("http://{}/events", addr));
        assert_err!(channel.open().await);
        channel.close();
        assert_eq!(channel.next_event().await, None);
    }
}
