//! Session 命令 - 创建和查看聊天会话

use anyhow::Result;
use clap::Subcommand;

use crate::api::{ChatSession, CreateSessionRequest, MessageRole, TutorClient};
use crate::cli::output::format_output;
use crate::config::TutorConfig;

/// Session 子命令
#[derive(Subcommand)]
pub enum SessionCommands {
    /// 创建新会话
    New {
        /// 会话标题
        #[arg(long)]
        title: Option<String>,
        /// 关联的知识点 ID
        #[arg(long)]
        topic_id: Option<String>,
        /// 关联的科目 ID
        #[arg(long)]
        subject_id: Option<String>,
        /// 创建后立即发送的第一条消息
        #[arg(long)]
        initial_message: Option<String>,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 查看会话详情和消息
    Show {
        /// 会话 ID
        session_id: String,
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
}

/// 处理 session 命令
pub async fn handle_session(command: SessionCommands, config: TutorConfig) -> Result<()> {
    let client = TutorClient::new(config)?;

    match command {
        SessionCommands::New {
            title,
            topic_id,
            subject_id,
            initial_message,
            json,
        } => {
            let request = CreateSessionRequest {
                title,
                topic_id,
                subject_id,
                initial_message,
            };
            let session = client.create_session(&request).await?;

            if json {
                println!("{}", format_output(&session));
            } else {
                println!("已创建会话: {}", session.id);
                print_session(&session);
            }
        }
        SessionCommands::Show { session_id, json } => {
            let session = client.get_session(&session_id).await?;

            if json {
                println!("{}", format_output(&session));
            } else {
                print_session(&session);
            }
        }
    }

    Ok(())
}

fn print_session(session: &ChatSession) {
    println!("  ID: {}", session.id);
    println!("  标题: {}", if session.title.is_empty() { "(无)" } else { session.title.as_str() });
    if let Some(topic) = &session.topic_name {
        println!("  知识点: {}", topic);
    }
    if let Some(created_at) = session.created_at {
        println!("  创建时间: {}", created_at.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("  消息数: {}", session.message_count);

    for message in &session.messages {
        let role = match message.role {
            MessageRole::User => "👤",
            MessageRole::Assistant => "🤖",
            MessageRole::System => "⚙️",
        };
        println!("\n{} {}", role, message.content);
    }
}
