use std::io::Read;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tokio::sync::mpsc;

use crate::controller::{InputBackend, InputController, MouseAction, TypeMode};
use crate::error::InputError;

const INDEX_HTML: &str = include_str!("../assets/index.html");
/// 请求体上限
const MAX_BODY: usize = 64 * 1024;

/// 服务端共享状态
pub struct ServerState<B> {
    token: String,
    pub controller: InputController<B>,
}

impl<B> ServerState<B> {
    pub fn new(token: impl Into<String>, controller: InputController<B>) -> Self {
        Self {
            token: token.into(),
            controller,
        }
    }
}

/// 与传输层无关的请求
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: String,
    /// 路径，可带查询串
    pub url: String,
    pub authorization: Option<String>,
    /// 读取失败时为错误信息
    pub body: Result<String, String>,
}

/// 响应
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body: format!("{body}\n"),
        }
    }

    fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self {
                status: 200,
                content_type: "application/json",
                body,
            },
            Err(e) => Self::text(500, &format!("序列化响应失败: {e}")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResponse {
    fn from_result(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                error: None,
            },
            Err(e) => Self {
                success: false,
                error: Some(e),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct TypeRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    mode: String,
}

#[derive(Debug, Deserialize)]
struct KeyRequest {
    #[serde(default)]
    key: String,
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    #[serde(default)]
    command: String,
}

#[derive(Debug, Deserialize)]
struct MouseRequest {
    #[serde(default)]
    action: String,
    /// 移动时为 dx
    #[serde(default)]
    x: f64,
    /// 移动时为 dy，滚动时为滚动量
    #[serde(default)]
    y: f64,
}

#[derive(Debug, Serialize)]
struct InfoResponse {
    status: &'static str,
    version: String,
}

/// 校验 `Authorization: Bearer <token>`，失败时返回应答
fn check_auth(token: &str, header: Option<&str>) -> Result<(), Reply> {
    let Some(header) = header.filter(|h| !h.is_empty()) else {
        return Err(Reply::text(401, "Unauthorized"));
    };
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" || parts[1] != token {
        return Err(Reply::text(403, "Forbidden"));
    }
    Ok(())
}

/// 路由并处理一个请求
pub fn route<B: InputBackend>(state: &ServerState<B>, req: &HttpRequest) -> Reply {
    let path = req.url.split('?').next().unwrap_or("/");

    match path {
        "/" | "/index.html" => Reply {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: INDEX_HTML.to_string(),
        },
        "/api/info" => match check_auth(&state.token, req.authorization.as_deref()) {
            Ok(()) => Reply::json(&InfoResponse {
                status: "online",
                version: format!("airhid-{}", env!("CARGO_PKG_VERSION")),
            }),
            Err(reply) => reply,
        },
        "/type" | "/command" | "/key" | "/mouse" => {
            if let Err(reply) = check_auth(&state.token, req.authorization.as_deref()) {
                return reply;
            }
            if req.method != "POST" {
                return Reply::text(405, "Method not allowed");
            }
            let result = match path {
                "/type" => decode(&req.body).and_then(|r: TypeRequest| {
                    state
                        .controller
                        .type_text(&r.text, TypeMode::from_request(&r.mode))
                        .map_err(report)
                }),
                "/command" => decode(&req.body).and_then(|r: CommandRequest| {
                    state
                        .controller
                        .parse_and_dispatch(&r.command)
                        .map(|_| ())
                        .map_err(report)
                }),
                "/key" => decode(&req.body).and_then(|r: KeyRequest| {
                    state.controller.press_named_key(&r.key).map_err(report)
                }),
                _ => decode(&req.body).and_then(|r: MouseRequest| {
                    match MouseAction::from_request(&r.action, r.x, r.y) {
                        Some(action) => state.controller.mouse(action).map_err(report),
                        None => {
                            log::warn!("忽略未知鼠标动作: {}", r.action);
                            Ok(())
                        }
                    }
                }),
            };
            Reply::json(&ActionResponse::from_result(result))
        }
        _ => Reply::text(404, "Not found"),
    }
}

fn decode<T: DeserializeOwned>(body: &Result<String, String>) -> Result<T, String> {
    let body = body.as_ref().map_err(|e| e.clone())?;
    serde_json::from_str(body).map_err(|e| e.to_string())
}

fn report(e: InputError) -> String {
    log::error!("{e}");
    e.to_string()
}

/// 绑定监听地址
pub fn bind(addr: &str) -> Result<Server, String> {
    Server::http(addr).map_err(|e| format!("监听 {addr} 失败: {e}"))
}

/// 运行服务直到收到 Ctrl-C
///
/// tiny_http 在独立线程上阻塞接收请求，经 channel 转交给 tokio；
/// 输入注入是阻塞调用，每个请求在 `spawn_blocking` 中处理。
pub async fn serve<B>(server: Server, state: Arc<ServerState<B>>) -> Result<(), String>
where
    B: InputBackend + Send + 'static,
{
    let server = Arc::new(server);
    match server.server_addr().to_ip() {
        Some(addr) => log::info!("HTTP 服务监听于 {addr}"),
        None => log::info!("HTTP 服务已启动"),
    }

    let (tx, mut rx) = mpsc::channel::<Request>(64);
    let acceptor = server.clone();
    std::thread::spawn(move || {
        while let Ok(request) = acceptor.recv() {
            if tx.blocking_send(request).is_err() {
                break;
            }
        }
    });

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                log::info!("收到退出信号，停止服务");
                server.unblock();
                break;
            }
            maybe_req = rx.recv() => {
                let Some(request) = maybe_req else {
                    break;
                };
                let state = state.clone();
                tokio::task::spawn_blocking(move || handle_request(request, &state));
            }
        }
    }
    Ok(())
}

fn handle_request<B: InputBackend>(mut request: Request, state: &ServerState<B>) {
    let authorization = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Authorization"))
        .map(|h| h.value.as_str().to_string());

    let mut body = String::new();
    let body = match request
        .as_reader()
        .take(MAX_BODY as u64 + 1)
        .read_to_string(&mut body)
    {
        Ok(n) if n > MAX_BODY => Err("请求体过大".to_string()),
        Ok(_) => Ok(body),
        Err(e) => Err(format!("读取请求失败: {e}")),
    };

    let req = HttpRequest {
        method: request.method().to_string(),
        url: request.url().to_string(),
        authorization,
        body,
    };
    let reply = route(state, &req);
    log::debug!("{} {} -> {}", req.method, req.url, reply.status);

    let mut response =
        Response::from_string(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response = response.with_header(header);
    }
    if let Err(e) = request.respond(response) {
        log::warn!("发送响应失败: {e}");
    }
}
