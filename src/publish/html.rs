//! Request-driven HTML publisher
//!
//! Every accepted connection gets a fresh snapshot page, whatever the client
//! sent and whether or not the stick moved. The page refreshes itself every
//! half second. Between requests the server keeps polling the stick so that
//! changes still show up in the log.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::joystick::{JoystickState, Language, ReferenceState, Sampler, SEND_INTERVAL_MS};

/// How long to wait for the request bytes before answering anyway.
const REQUEST_READ_TIMEOUT: Duration = Duration::from_millis(500);

const REQUEST_BUFFER_SIZE: usize = 1024;

/// Pause after a failed accept so a persistent error (e.g. EMFILE) does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read local address: {0}")]
    LocalAddr(#[source] std::io::Error),
}

/// Builds the full HTTP response for one snapshot.
pub fn render_response(state: &JoystickState, language: Language) -> String {
    let text = PageText::for_language(language);
    let button = if state.button_pressed {
        text.pressed
    } else {
        text.released
    };

    format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/html\r\n\
         Connection: close\r\n\
         \r\n\
         <!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <title>{title}</title>\n\
         <meta http-equiv=\"refresh\" content=\"0.5\">\n\
         </head>\n\
         <body>\n\
         <h1>{title}</h1>\n\
         <p>{direction_label}: {direction}</p>\n\
         <p>{x_label}: {x:.2}</p>\n\
         <p>{y_label}: {y:.2}</p>\n\
         <p>{button_label}: {button}</p>\n\
         </body>\n\
         </html>\n",
        title = text.title,
        direction_label = text.direction,
        direction = state.direction.label(language),
        x_label = text.x,
        x = state.x,
        y_label = text.y,
        y = state.y,
        button_label = text.button,
        button = button,
    )
}

struct PageText {
    title: &'static str,
    direction: &'static str,
    x: &'static str,
    y: &'static str,
    button: &'static str,
    pressed: &'static str,
    released: &'static str,
}

impl PageText {
    fn for_language(language: Language) -> Self {
        match language {
            Language::Portuguese => Self {
                title: "Representacao da Posicao de um Farol Maritimo",
                direction: "Direcao",
                x: "Posicao X",
                y: "Posicao Y",
                button: "Botao",
                pressed: "Pressionado",
                released: "Liberado",
            },
            Language::English => Self {
                title: "Lighthouse Beam Position",
                direction: "Direction",
                x: "Position X",
                y: "Position Y",
                button: "Button",
                pressed: "Pressed",
                released: "Released",
            },
        }
    }
}

/// Sampling and reference bookkeeping behind the HTML server.
pub struct SnapshotPublisher {
    sampler: Sampler,
    reference: ReferenceState,
    language: Language,
}

impl SnapshotPublisher {
    pub fn new(sampler: Sampler, language: Language) -> Self {
        Self {
            sampler,
            reference: ReferenceState::default(),
            language,
        }
    }

    /// Samples the stick and renders the response for one request.
    pub fn handle_request(&mut self) -> String {
        let state = self.observe();
        if state.changed {
            self.log_change("Joystick change detected", &state);
        }
        render_response(&state, self.language)
    }

    /// Background check between requests.
    pub fn poll_unsolicited(&mut self) -> JoystickState {
        let state = self.observe();
        if state.changed {
            self.log_change("Joystick changed (unsolicited)", &state);
        }
        state
    }

    pub fn reference(&self) -> &JoystickState {
        self.reference.current()
    }

    fn observe(&mut self) -> JoystickState {
        let state = self.sampler.sample().flag_change(self.reference.current());
        if state.changed {
            self.reference.accept(state);
        }
        state
    }

    fn log_change(&self, what: &str, state: &JoystickState) {
        info!(
            "{}: direction={} x={:.2} y={:.2} button={}",
            what,
            state.direction.label(self.language),
            state.x,
            state.y,
            if state.button_pressed { "pressed" } else { "released" }
        );
    }
}

/// Single-loop HTTP server: accepts, answers, and polls in turn.
pub struct HtmlServer {
    listener: TcpListener,
    publisher: SnapshotPublisher,
}

impl HtmlServer {
    pub async fn bind(addr: &str, publisher: SnapshotPublisher) -> Result<Self, ServeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServeError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            publisher,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServeError> {
        self.listener.local_addr().map_err(ServeError::LocalAddr)
    }

    /// Serves until `shutdown` fires. Connection errors are logged and never
    /// end the loop.
    pub async fn run(mut self, shutdown: CancellationToken) -> SnapshotPublisher {
        match self.local_addr() {
            Ok(addr) => info!("Server listening on {}", addr),
            Err(e) => warn!("Server listening on unknown address: {}", e),
        }

        let mut poll = interval(Duration::from_millis(SEND_INTERVAL_MS));
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("HTML server stopping");
                    return self.publisher;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        info!("New TCP connection from {}", peer);
                        self.respond(stream).await;
                    }
                    Err(e) => {
                        warn!("Failed to accept connection: {}", e);
                        accept_backoff().await;
                    }
                },
                _ = poll.tick() => {
                    self.publisher.poll_unsolicited();
                }
            }
        }
    }

    async fn respond(&mut self, mut stream: TcpStream) {
        let mut request = [0u8; REQUEST_BUFFER_SIZE];
        match timeout(REQUEST_READ_TIMEOUT, stream.read(&mut request)).await {
            Ok(Ok(0)) => debug!("Client sent nothing before closing its side"),
            Ok(Ok(n)) => debug!("HTTP request received ({} bytes)", n),
            Ok(Err(e)) => debug!("Failed to read request: {}", e),
            Err(_) => debug!("No request within {:?}, answering anyway", REQUEST_READ_TIMEOUT),
        }

        let response = self.publisher.handle_request();
        if let Err(e) = stream.write_all(response.as_bytes()).await {
            warn!("Failed to send page: {}", e);
            return;
        }
        if let Err(e) = stream.shutdown().await {
            debug!("Failed to close connection cleanly: {}", e);
        }
    }
}

async fn accept_backoff() {
    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
}
