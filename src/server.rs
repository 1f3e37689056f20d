use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{self, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::{
    cli::CommandArguments,
    command::Interaction,
    error::{ServiceError, ServiceResult},
    handler::Dispatcher,
    health::{ServerState, health_report},
    notify::{DiscordNotifier, Notifier},
    scheduler::{REMINDER_PERIOD, Scheduler},
};

const MAX_BODY_BYTES: usize = 1024 * 1024;

pub async fn start_server(args: CommandArguments) -> ServiceResult<()> {
    args.validate().map_err(ServiceError::Config)?;
    let (token, client_id) = args.credentials().map_err(ServiceError::Config)?;

    let shutdown = CancellationToken::new();
    let notifier: Arc<dyn Notifier> = Arc::new(DiscordNotifier::new(token, client_id));
    let scheduler = Scheduler::new(notifier, shutdown.clone());
    let dispatcher = Arc::new(Dispatcher::load(args.data_dir.clone(), scheduler.clone()));
    let state = Arc::new(ServerState::new(dispatcher.clone()));
    let reminder = scheduler.spawn_daily_reminder(args.reminder_channel.clone(), REMINDER_PERIOD);

    let mut tasks: JoinSet<ServiceResult<()>> = JoinSet::new();

    // HTTP transport: health probe and interaction intake
    if args.enable_http {
        let addr = args.http_addr().map_err(ServiceError::Config)?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::FromString(format!("HTTP listen error: {e}")))?;
        tracing::info!("HTTP transport listening on {addr}");
        tasks.spawn(serve_http(listener, state.clone(), shutdown.clone()));
    }

    // stdio transport: one JSON interaction per line
    if args.enable_stdio {
        tracing::info!("stdio transport enabled");
        tasks.spawn(serve_stdio(dispatcher.clone(), shutdown.clone()));
    }

    supervise_transports(&mut tasks, shutdown_signal()).await;

    shutdown.cancel();
    while let Some(res) = tasks.join_next().await {
        log_transport_exit(res);
    }
    if let Err(e) = reminder.await {
        tracing::warn!("Reminder task join error: {e}");
    }
    dispatcher.flush().await?;
    tracing::info!("All stores saved to {}", dispatcher.data_dir().display());
    Ok(())
}

/// Waits for `signal` or for every transport to finish. A transport that
/// stops on its own (stdin at EOF, a failed listener) leaves the others up.
async fn supervise_transports<S>(tasks: &mut JoinSet<ServiceResult<()>>, signal: S)
where
    S: Future<Output = ()>,
{
    tokio::pin!(signal);
    loop {
        tokio::select! {
            _ = &mut signal => {
                tracing::info!("Shutdown signal received, shutting down gracefully");
                return;
            }
            res = tasks.join_next() => match res {
                Some(res) => log_transport_exit(res),
                None => {
                    tracing::info!("All transports stopped");
                    return;
                }
            },
        }
    }
}

fn log_transport_exit(res: Result<ServiceResult<()>, tokio::task::JoinError>) {
    match res {
        Ok(Ok(())) => tracing::info!("Transport stopped"),
        Ok(Err(e)) => tracing::error!("Transport failed: {e}"),
        Err(e) => tracing::error!("Task join error: {e}"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Could not listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Could not listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn serve_http(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown: CancellationToken,
) -> ServiceResult<()> {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            accepted = listener.accept() => accepted,
        };
        let (stream, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("HTTP accept error: {e}");
                continue;
            }
        };

        let state = state.clone();
        tokio::spawn(async move {
            let service = service_fn(move |req| route(req, state.clone()));
            if let Err(err) = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await
            {
                tracing::warn!("HTTP connection error from {peer}: {err}");
            }
        });
    }
}

pub async fn route<B>(req: Request<B>, state: Arc<ServerState>) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let response = match (req.method(), req.uri().path()) {
        (&Method::GET, "/health") => json_response(StatusCode::OK, &health_report(&state)),
        (&Method::POST, "/interactions") => {
            let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    return Ok(json_response(
                        StatusCode::BAD_REQUEST,
                        &json!({ "error": format!("Could not read body: {e}") }),
                    ));
                }
            };
            match serde_json::from_slice::<Interaction>(&body) {
                Ok(interaction) => {
                    let reply = state.dispatcher.handle(interaction).await;
                    json_response(StatusCode::OK, &reply)
                }
                Err(e) => {
                    tracing::warn!("Rejected interaction: {e}");
                    json_response(StatusCode::BAD_REQUEST, &json!({ "error": e.to_string() }))
                }
            }
        }
        _ => text_response(StatusCode::NOT_FOUND, "text/plain", "Not Found".to_string()),
    };
    Ok(response)
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_string(body) {
        Ok(body) => text_response(status, "application/json", body),
        Err(e) => {
            tracing::error!("Failed to serialize response: {e}");
            text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "text/plain",
                "Internal Server Error".to_string(),
            )
        }
    }
}

fn text_response(status: StatusCode, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

async fn serve_stdio(dispatcher: Arc<Dispatcher>, shutdown: CancellationToken) -> ServiceResult<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            tracing::info!("stdin closed");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let out = process_line(&dispatcher, &line).await;
        stdout.write_all(out.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }
}

/// Handles one stdio line and returns the JSON line to write back.
pub async fn process_line(dispatcher: &Dispatcher, line: &str) -> String {
    match serde_json::from_str::<Interaction>(line) {
        Ok(interaction) => {
            let reply = dispatcher.handle(interaction).await;
            serde_json::to_string(&reply)
                .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
        }
        Err(e) => json!({ "error": e.to_string() }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::Reply;
    use crate::scheduler::testing::RecordingNotifier;
    use serde_json::Value;
    use std::time::Duration;

    fn state(dir: &std::path::Path) -> Arc<ServerState> {
        let scheduler = Scheduler::new(Arc::new(RecordingNotifier::default()), CancellationToken::new());
        let dispatcher = Arc::new(Dispatcher::load(dir.to_path_buf(), scheduler));
        Arc::new(ServerState::new(dispatcher))
    }

    fn request(method: Method, path: &str, body: &str) -> Request<Full<Bytes>> {
        let mut req = Request::new(Full::new(Bytes::from(body.to_string())));
        *req.method_mut() = method;
        *req.uri_mut() = path.parse().unwrap();
        req
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_status_uptime_and_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let response = route(request(Method::GET, "/health", ""), state(dir.path()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["uptime"].is_number());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn interactions_round_trip_through_the_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let raw = r#"{"user": {"id": "U1"}, "command": "snippet.get", "name": "nope"}"#;
        let response = route(request(Method::POST, "/interactions", raw), state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let reply: Reply = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(reply, Reply::notice("❌ Snippet \"nope\" not found!"));
    }

    #[tokio::test]
    async fn malformed_and_unknown_requests() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let bad = route(
            request(Method::POST, "/interactions", r#"{"user": {"id": "1"}, "command": "nope"}"#),
            state.clone(),
        )
        .await
        .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(bad).await["error"].is_string());

        let missing = route(request(Method::GET, "/metrics", ""), state).await.unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn finished_transport_leaves_the_others_running() {
        let http_stop = CancellationToken::new();
        let mut tasks: JoinSet<ServiceResult<()>> = JoinSet::new();
        // stdin already at EOF
        tasks.spawn(async { Ok(()) });
        let stop = http_stop.clone();
        tasks.spawn(async move {
            stop.cancelled().await;
            Ok(())
        });

        let waited = tokio::time::timeout(
            Duration::from_millis(100),
            supervise_transports(&mut tasks, std::future::pending()),
        )
        .await;
        assert!(waited.is_err(), "supervision ended while a transport was still up");
        assert_eq!(tasks.len(), 1);

        supervise_transports(&mut tasks, async {}).await;
        http_stop.cancel();
        while tasks.join_next().await.is_some() {}
    }

    #[tokio::test]
    async fn supervision_ends_once_every_transport_stopped() {
        let mut tasks: JoinSet<ServiceResult<()>> = JoinSet::new();
        tasks.spawn(async { Ok(()) });
        tasks.spawn(async { Err(ServiceError::FromString("bind failed".into())) });

        let waited = tokio::time::timeout(
            Duration::from_secs(1),
            supervise_transports(&mut tasks, std::future::pending()),
        )
        .await;
        assert!(waited.is_ok());
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn stdio_lines_produce_json_replies() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());

        let out = process_line(
            &state.dispatcher,
            r#"{"user": {"id": "U1"}, "command": "learn", "topic": "rust-only"}"#,
        )
        .await;
        let reply: Reply = serde_json::from_str(&out).unwrap();
        assert_eq!(reply, Reply::notice("❌ Topic not found!"));

        let err: Value = serde_json::from_str(&process_line(&state.dispatcher, "not json").await).unwrap();
        assert!(err["error"].is_string());
    }
}
