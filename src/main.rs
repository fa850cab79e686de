//! Tutor Chat CLI
//!
//! 与 AI 辅导后端进行流式对话，并从回复中提取测验

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};
use tutor_chat::{
    cli::{
        handle_ask, handle_extract, handle_replay, handle_session, AskArgs, ExtractArgs,
        ReplayArgs, SessionCommands,
    },
    TutorConfig,
};

#[derive(Parser)]
#[command(name = "tutor-chat")]
#[command(about = "Tutor Chat - 流式 AI 辅导对话与测验提取")]
#[command(version)]
struct Cli {
    /// 后端 API 地址（覆盖配置文件和环境变量）
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// 认证 token（覆盖配置文件和环境变量）
    #[arg(long, global = true)]
    token: Option<String>,

    /// 指定配置文件
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 从一条完整回复中提取测验
    Extract(ExtractArgs),
    /// 重放录制的流式响应
    Replay(ReplayArgs),
    /// 在会话中发送消息并实时显示回复
    Ask(AskArgs),
    /// 会话管理
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

/// 加载配置：指定文件或自动加载，再应用命令行覆盖
fn load_config(
    path: Option<&Path>,
    api_url: Option<String>,
    token: Option<String>,
) -> Result<TutorConfig> {
    let config = match path {
        Some(path) => TutorConfig::load_from(path)?,
        None => TutorConfig::auto_load(),
    };
    let config = config.with_overrides(api_url, token);
    debug!(api_base_url = %config.api_base_url, "Loaded config");
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tutor_chat=info,tutor-chat=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let Cli {
        api_url,
        token,
        config,
        command,
    } = Cli::parse();

    match command {
        Commands::Extract(args) => handle_extract(args)?,
        Commands::Replay(args) => handle_replay(args).await?,
        Commands::Ask(args) => {
            let config = load_config(config.as_deref(), api_url, token)?;
            handle_ask(args, config).await?
        }
        Commands::Session { command } => {
            let config = load_config(config.as_deref(), api_url, token)?;
            handle_session(command, config).await?
        }
    }

    Ok(())
}
