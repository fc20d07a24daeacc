pub mod protocol;
pub mod state_stream;

use crate::config::Config;
use crate::error::ControlError;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State as AxumState, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use protocol::{ClientMessage, EngineFullState, EngineUpdate, ServerMessage};
use state_stream::{EngineStream, StateStream};
use tokio::time::{interval, Duration};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    stream: StateStream,
    config: Config,
}

pub async fn run_server(config: Config, stream: StateStream) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.server.address, config.server.port);
    let static_dir = config.server.static_dir.clone();

    let app_state = AppState {
        stream,
        config: config.clone(),
    };

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .nest_service("/", ServeDir::new(&static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    log::info!("HTTP server with WebSocket listening on: {}", addr);
    log::info!("Static files served from: {}", static_dir);
    log::info!("WebSocket endpoint: ws://{}/ws", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    AxumState(state): AxumState<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

fn update_message(stream: &StateStream) -> ServerMessage {
    let engines = stream
        .engines()
        .iter()
        .enumerate()
        .map(|(index, engine)| EngineUpdate::new(index, engine.state(), &engine.latest()))
        .collect();
    ServerMessage::Update { engines }
}

fn full_state_message(stream: &StateStream) -> ServerMessage {
    let engines = stream
        .engines()
        .iter()
        .enumerate()
        .map(|(index, engine)| {
            EngineFullState::new(
                index,
                engine.state(),
                &engine.latest(),
                engine.control.observed_report(),
            )
        })
        .collect();
    ServerMessage::FullState { engines }
}

fn handle_client_message(stream: &StateStream, message: ClientMessage) -> Option<ServerMessage> {
    let errors = match message {
        ClientMessage::GetState => return Some(full_state_message(stream)),
        ClientMessage::Start { engine } => for_each_engine(stream, engine, |e| e.control.start()),
        ClientMessage::Stop { engine } => for_each_engine(stream, engine, |e| e.control.stop()),
        ClientMessage::Terminate { engine } => for_each_engine(stream, engine, |e| {
            e.control.request_termination();
            Ok(())
        }),
        ClientMessage::Observe { engine, animal_id } => {
            for_each_engine(stream, Some(engine), |e| e.control.set_observed(animal_id, true))
        }
        ClientMessage::Unobserve { engine, animal_id } => {
            for_each_engine(stream, Some(engine), |e| e.control.set_observed(animal_id, false))
        }
    };

    if errors.is_empty() {
        None
    } else {
        Some(ServerMessage::error(errors.join("; ")))
    }
}

fn for_each_engine<F>(stream: &StateStream, engine: Option<usize>, mut f: F) -> Vec<String>
where
    F: FnMut(&EngineStream) -> Result<(), ControlError>,
{
    let selected = stream.select(engine);
    if selected.is_empty() {
        log::warn!("Control message for unknown engine {:?}", engine);
    }
    selected
        .into_iter()
        .filter_map(|(index, e)| f(e).err().map(|err| format!("engine {}: {}", index, err)))
        .collect()
}

async fn handle_websocket(socket: WebSocket, app_state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let rate = app_state.config.server.update_rate_hz.max(1);
    let mut update_interval = interval(Duration::from_millis(1000 / rate));

    loop {
        tokio::select! {
            _ = update_interval.tick() => {
                let message = update_message(&app_state.stream);
                if let Ok(json) = serde_json::to_string(&message) {
                    if sender.send(Message::Text(json)).await.is_err() {
                        log::info!("Client disconnected");
                        break;
                    }
                }
            }

            Some(msg) = receiver.next() => {
                match msg {
                    Ok(Message::Text(text)) => {
                        let reply = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => handle_client_message(&app_state.stream, client_msg),
                            Err(e) => {
                                log::warn!("Ignoring malformed client message: {}", e);
                                Some(ServerMessage::error(format!("malformed message: {}", e)))
                            }
                        };

                        if let Some(reply) = reply {
                            if let Ok(json) = serde_json::to_string(&reply) {
                                let _ = sender.send(Message::Text(json)).await;
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        log::info!("Client requested close");
                        break;
                    }
                    Err(e) => {
                        log::error!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    log::info!("WebSocket connection closed");
}
