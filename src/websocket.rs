use crate::{
    agent::{ PendingRequest, PortfolioAgent, Response },
    models::chat::export_file_name,
    models::websocket::{ ClientMessage, ServerMessage },
    navigation::HELP_TEXT,
    session::Session,
};
use chrono::Utc;
use futures::{ Sink, SinkExt, StreamExt };
use log::{ info, warn, error };
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{ mpsc, Mutex };
use tokio::io::{ AsyncRead, AsyncWrite };
use tokio_tungstenite::{ tungstenite::{ self, protocol::Message }, WebSocketStream };

const MAX_FRAME_SIZE: usize = 64 * 1024;
const REPLY_QUEUE_SIZE: usize = 8;

async fn send_message<T>(tx: &mut T, peer: SocketAddr, msg: &ServerMessage) -> bool
    where T: Sink<Message, Error = tungstenite::Error> + Unpin
{
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize message for {}: {}", peer, e);
            return true;
        }
    };
    match tx.send(Message::Text(json)).await {
        Ok(()) => true,
        Err(e) => {
            error!("Error sending message to {}: {}", peer, e);
            false
        }
    }
}

fn error_frame(message: impl ToString) -> ServerMessage {
    ServerMessage::Error { message: message.to_string() }
}

fn response_frame(response: Response) -> ServerMessage {
    ServerMessage::Response {
        content: response.text,
        preview: response.preview,
        notice: response.notice,
        timestamp: Utc::now().timestamp(),
    }
}

/// What the connection loop does with a client frame: answer it right away,
/// or run an accepted chat message in the background.
enum Dispatch {
    Reply(ServerMessage),
    Started(PendingRequest),
}

async fn dispatch(agent: &PortfolioAgent, session: &Mutex<Session>, msg: ClientMessage) -> Dispatch {
    let reply = match msg {
        ClientMessage::Chat { content } => {
            return match agent.start_request(session, &content).await {
                Ok(pending) => Dispatch::Started(pending),
                Err(e) => Dispatch::Reply(error_frame(e)),
            };
        }
        ClientMessage::Clear => {
            let mut guard = session.lock().await;
            match guard.clear() {
                Ok(()) => ServerMessage::Cleared { conversation_id: guard.conversation_id().to_string() },
                Err(e) => error_frame(e),
            }
        }
        ClientMessage::Export => {
            let export = session.lock().await.export(&agent.knowledge().personal);
            match export.to_pretty_json() {
                Ok(data) =>
                    ServerMessage::Export {
                        file_name: export_file_name(Utc::now().date_naive()),
                        data,
                    },
                Err(e) => error_frame(format!("Failed to export conversation: {}", e)),
            }
        }
        ClientMessage::SetCredential { key } => {
            match agent.store_credential(session, &key).await {
                Ok(()) => ServerMessage::Credential { stored: true },
                Err(e) => error_frame(e),
            }
        }
        ClientMessage::ClearCredential => {
            match agent.clear_credential(session).await {
                Ok(()) => ServerMessage::Credential { stored: false },
                Err(e) => error_frame(e),
            }
        }
        ClientMessage::Help => ServerMessage::Help { content: HELP_TEXT.to_string() },
    };
    Dispatch::Reply(reply)
}

/// Serves one visitor. Chat rounds run on their own task and report back
/// through a channel, so frames that arrive while a round is pending are
/// still read and answered.
pub async fn handle_connection<S>(
    peer: SocketAddr,
    websocket: WebSocketStream<S>,
    agent: Arc<PortfolioAgent>,
    visitor_id: Option<String>
)
    where S: AsyncRead + AsyncWrite + Unpin
{
    info!("New WebSocket connection: {}", peer);

    let session = Arc::new(Mutex::new(agent.new_session(visitor_id).await));
    let conversation_id = session.lock().await.conversation_id().to_string();
    info!("Assigned conversation ID {} to {}", conversation_id, peer);

    let (mut tx, mut rx) = websocket.split();
    let (reply_tx, mut reply_rx) = mpsc::channel::<ServerMessage>(REPLY_QUEUE_SIZE);

    loop {
        let msg = tokio::select! {
            Some(reply) = reply_rx.recv() => {
                if !send_message(&mut tx, peer, &reply).await {
                    break;
                }
                continue;
            }
            msg = rx.next() => msg,
        };
        let Some(msg) = msg else {
            break;
        };

        let message = match msg {
            Ok(message) => message,
            Err(e) => {
                match e {
                    | tungstenite::Error::ConnectionClosed
                    | tungstenite::Error::Protocol(_)
                    | tungstenite::Error::Utf8 => {
                        info!("WebSocket connection closed or protocol error for {}: {}", peer, e);
                    }
                    tungstenite::Error::Io(ref io_err) if
                        io_err.kind() == std::io::ErrorKind::ConnectionReset
                    => {
                        info!("WebSocket connection reset by peer {}", peer);
                    }
                    _ => {
                        error!("Error receiving message from {}: {}", peer, e);
                    }
                }
                break;
            }
        };

        if message.len() > MAX_FRAME_SIZE {
            warn!("Frame from {} exceeds size limit ({} > {})", peer, message.len(), MAX_FRAME_SIZE);
            send_message(&mut tx, peer, &error_frame("Message too large")).await;
            break;
        }

        match message {
            Message::Text(text) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        warn!("Failed to parse message from {}: {}", peer, e);
                        if !send_message(&mut tx, peer, &error_frame(format!("Failed to parse message: {}", e))).await {
                            break;
                        }
                        continue;
                    }
                };

                match dispatch(&agent, &session, client_msg).await {
                    Dispatch::Started(pending) => {
                        if !send_message(&mut tx, peer, &ServerMessage::Processing).await {
                            break;
                        }
                        let agent = Arc::clone(&agent);
                        let session = Arc::clone(&session);
                        let reply_tx = reply_tx.clone();
                        tokio::spawn(async move {
                            let response = agent.finish_request(&session, pending).await;
                            if reply_tx.send(response_frame(response)).await.is_err() {
                                info!("Connection {} closed before its answer was ready", peer);
                            }
                        });
                    }
                    Dispatch::Reply(reply) => {
                        if let ServerMessage::Error { ref message } = reply {
                            warn!("Request from {} refused: {}", peer, message);
                        }
                        if !send_message(&mut tx, peer, &reply).await {
                            break;
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("Received close frame from {}", peer);
                break;
            }
            Message::Ping(ping_data) => {
                if tx.send(Message::Pong(ping_data)).await.is_err() {
                    error!("Failed to send pong to {}", peer);
                    break;
                }
            }
            Message::Binary(_) => {
                warn!("Ignoring binary message from {}", peer);
            }
            Message::Pong(_) | Message::Frame(_) => {}
        }
    }
    info!("WebSocket connection closed for {} (Conv ID: {})", peer, conversation_id);
}
