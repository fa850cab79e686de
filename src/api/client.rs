//! 后端聊天会话 API 客户端
//!
//! 只覆盖一次交换需要的三个调用：创建会话、读取会话、流式发送消息。
//! 流式接口返回原始字节流，由 [`crate::stream::StreamConsumer`] 负责解析。

use std::pin::Pin;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Stream, TryStreamExt};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::config::TutorConfig;

/// 连接超时（秒）
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 错误信息里保留的响应体长度
const ERROR_BODY_LIMIT: usize = 300;

/// 响应体字节流
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// 创建会话请求
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    /// 创建后立即发送的第一条消息（非流式）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_message: Option<String>,
}

/// 发送消息请求
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    content: &'a str,
}

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// 会话中的一条消息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub tokens_used: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// 聊天会话
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub topic_name: Option<String>,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// 仅详情接口返回
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// ID 可能是 UUID 字符串，也可能是整数
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("invalid id: {}", other))),
    }
}

/// 后端 API 客户端
#[derive(Debug, Clone)]
pub struct TutorClient {
    client: Client,
    config: TutorConfig,
}

impl TutorClient {
    /// 创建客户端
    pub fn new(config: TutorConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// 创建会话 `POST /chatbot/sessions/`
    pub async fn create_session(&self, request: &CreateSessionRequest) -> Result<ChatSession> {
        let response = self
            .request(Method::POST, "/chatbot/sessions/")
            .timeout(self.timeout())
            .json(request)
            .send()
            .await
            .context("Create session request failed")?;

        let session: ChatSession = ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse session response")?;

        debug!(session_id = %session.id, "Created chat session");
        Ok(session)
    }

    /// 读取会话详情 `GET /chatbot/sessions/{id}/`
    pub async fn get_session(&self, session_id: &str) -> Result<ChatSession> {
        let response = self
            .request(Method::GET, &format!("/chatbot/sessions/{}/", session_id))
            .timeout(self.timeout())
            .send()
            .await
            .context("Get session request failed")?;

        ensure_success(response)
            .await?
            .json()
            .await
            .context("Failed to parse session response")
    }

    /// 流式发送消息 `POST /chatbot/sessions/{id}/send_message_stream/`
    ///
    /// 状态码非 2xx 时返回错误；成功时返回响应体字节流。响应体本身不设总超时。
    pub async fn send_message_stream(&self, session_id: &str, content: &str) -> Result<ByteStream> {
        let response = self
            .request(
                Method::POST,
                &format!("/chatbot/sessions/{}/send_message_stream/", session_id),
            )
            .header("Accept", "text/event-stream")
            .json(&SendMessageRequest { content })
            .send()
            .await
            .context("Send message request failed")?;

        let response = ensure_success(response).await?;
        debug!(session_id = %session_id, "Chat stream opened");

        Ok(Box::pin(response.bytes_stream().map_err(anyhow::Error::from)))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.config.endpoint(path));
        match &self.config.auth_token {
            Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
            None => builder,
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }
}

/// 非 2xx 状态码转为错误，错误信息附带截断后的响应体
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    warn!(status = %status, "Backend returned error status");
    bail!("HTTP {}: {}", status, body.trim())
}
