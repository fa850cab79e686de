//! 后端 API 客户端测试
//!
//! 用 wiremock 模拟后端，覆盖会话接口、认证头、错误状态码和流式交换。

use serde_json::json;
use tutor_chat::api::{CreateSessionRequest, TutorClient};
use tutor_chat::cli::SilentObserver;
use tutor_chat::config::TutorConfig;
use tutor_chat::exchange::{reject_exchange, run_exchange, ExchangeOutcome};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, token: Option<&str>) -> TutorClient {
    let config = TutorConfig {
        api_base_url: format!("{}/api", server.uri()),
        auth_token: token.map(str::to_string),
        timeout_secs: 5,
    };
    TutorClient::new(config).expect("Failed to build client")
}

#[tokio::test]
async fn test_create_session_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chatbot/sessions/"))
        .and(header("Authorization", "Bearer secret"))
        .and(body_json(json!({"title": "Algebra", "topic_id": "t-1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "s-1",
            "title": "Algebra",
            "is_active": true,
            "message_count": 0,
            "created_at": "2024-05-01T08:00:00Z",
            "updated_at": "2024-05-01T08:00:00Z",
            "messages": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("secret"));
    let session = client
        .create_session(&CreateSessionRequest {
            title: Some("Algebra".to_string()),
            topic_id: Some("t-1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(session.id, "s-1");
    assert!(session.is_active);
}

#[tokio::test]
async fn test_get_session_with_messages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/chatbot/sessions/s-2/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "s-2",
            "title": "",
            "message_count": 1,
            "messages": [
                {"id": "m-1", "role": "assistant", "content": "Q1. Pick\nA) x\nB) y", "model_used": "gpt-4o-mini", "tokens_used": 12, "created_at": "2024-05-01T08:00:01Z"}
            ]
        })))
        .mount(&server)
        .await;

    let session = client_for(&server, None).get_session("s-2").await.unwrap();
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.messages[0].model_used.as_deref(), Some("gpt-4o-mini"));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/chatbot/sessions/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"detail\":\"Not found.\"}"))
        .mount(&server)
        .await;

    let err = client_for(&server, None)
        .get_session("missing")
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("404"));
    assert!(message.contains("Not found."));
}

#[tokio::test]
async fn test_stream_exchange_against_backend() {
    let server = MockServer::start().await;

    let body = concat!(
        "{\"content\": \"Q1. What is 2+2?\\n\", \"done\": false}\n",
        "{\"content\": \"A) 3\\nB) 4 ✓\", \"done\": false}\n",
        "{\"content\": \"\", \"done\": true, \"success\": true, \"full_content\": \"Q1. What is 2+2?\\nA) 3\\nB) 4 ✓\", \"model\": \"gpt-4o-mini\", \"message_id\": \"m-9\"}\n",
    );

    Mock::given(method("POST"))
        .and(path("/api/chatbot/sessions/s-3/send_message_stream/"))
        .and(body_json(json!({"content": "Quiz me on addition"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("secret"));
    let stream = client
        .send_message_stream("s-3", "Quiz me on addition")
        .await
        .unwrap();

    let outcome = run_exchange(stream, None, &mut SilentObserver).await;
    match outcome {
        ExchangeOutcome::Completed {
            result, metadata, ..
        } => {
            let quiz = result.quiz.unwrap();
            assert_eq!(quiz.questions[0].options, vec!["3", "4"]);
            assert_eq!(quiz.questions[0].correct_option_index, 1);
            assert_eq!(metadata.message_id.as_deref(), Some("m-9"));
        }
        other => panic!("Expected completion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stream_request_rejected_before_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chatbot/sessions/s-4/send_message_stream/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = match client_for(&server, None)
        .send_message_stream("s-4", "hi")
        .await
    {
        Ok(_) => panic!("Expected error status"),
        Err(e) => e,
    };

    let outcome = reject_exchange(err, &mut SilentObserver);
    assert!(matches!(outcome, ExchangeOutcome::Failed(_)));
}
