use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    Extension,
};
use futures::{SinkExt, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;

use crate::{
    domain::protocol::{ClientEvent, Info, ServerEvent, Session, SessionSettings},
    error::{AppError, AppResult},
    infrastructure::{backends::SynthesisBackend, http::RequestId},
};

/// Outgoing events buffered per connection before synthesis waits on the client
const OUTGOING_BUFFER: usize = 64;

pub struct EventsController {
    backend: Arc<dyn SynthesisBackend>,
    settings: Arc<SessionSettings>,
    info: Arc<Info>,
}

impl EventsController {
    pub fn new(
        backend: Arc<dyn SynthesisBackend>,
        settings: Arc<SessionSettings>,
        info: Arc<Info>,
    ) -> Self {
        Self {
            backend,
            settings,
            info,
        }
    }

    pub fn session(&self, events: mpsc::Sender<ServerEvent>) -> Session {
        Session::new(
            self.backend.clone(),
            self.settings.clone(),
            self.info.clone(),
            events,
        )
    }

    /// GET /ws - one event session per WebSocket
    pub async fn connect(
        State(controller): State<Arc<EventsController>>,
        Extension(request_id): Extension<RequestId>,
        ws: WebSocketUpgrade,
    ) -> Response {
        ws.on_upgrade(move |socket| {
            Self::handle_socket(socket, controller).instrument(request_id.connection_span())
        })
    }

    async fn handle_socket(socket: WebSocket, controller: Arc<EventsController>) {
        tracing::info!("Client connected");
        let (mut sink, stream) = socket.split();
        let (tx, mut rx) = mpsc::channel::<ServerEvent>(OUTGOING_BUFFER);

        let writer = tokio::spawn(
            async move {
                while let Some(event) = rx.recv().await {
                    let json = match event.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!(error = %e, "Dropping unencodable event");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(json)).await.is_err() {
                        tracing::debug!("Client went away while sending");
                        break;
                    }
                }
                let _ = sink.close().await;
            }
            .in_current_span(),
        );

        let incoming = stream.filter_map(|message| async move {
            match message {
                Ok(Message::Text(text)) => Some(ClientEvent::from_json(&text)),
                Ok(Message::Binary(_)) => Some(Err(AppError::Protocol(
                    "binary frames are not supported".to_string(),
                ))),
                Ok(Message::Close(_)) | Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => None,
                Err(e) => {
                    tracing::debug!(error = %e, "WebSocket read failed");
                    Some(Err(AppError::ConnectionClosed))
                }
            }
        });

        match run_connection(controller.session(tx), incoming).await {
            Ok(()) | Err(AppError::ConnectionClosed) => tracing::info!("Client disconnected"),
            Err(e) => tracing::warn!(error = %e, code = e.code(), "Connection terminated"),
        }

        if let Err(e) = writer.await {
            tracing::warn!(error = %e, "Writer task failed");
        }
    }
}

/// Drive one session over a stream of decoded client events.
///
/// Each event, with all the synthesis it triggers, completes before the next
/// one is read. The first failure ends the connection: it is reported to the
/// client as an `error` event and returned.
pub async fn run_connection<S>(mut session: Session, incoming: S) -> AppResult<()>
where
    S: Stream<Item = AppResult<ClientEvent>>,
{
    let mut incoming = std::pin::pin!(incoming);

    while let Some(event) = incoming.next().await {
        let event = match event {
            Ok(event) => event,
            Err(err) => return Err(session.report_error(err).await),
        };
        session.handle_event(event).await?;
    }

    Ok(())
}
