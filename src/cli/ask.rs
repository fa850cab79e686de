//! Ask 命令 - 在指定会话中发送一条消息并实时显示回复
//!
//! Ctrl-C 取消当前交换。

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::api::TutorClient;
use crate::cli::output::{format_output, ExchangeReport};
use crate::cli::render::{SilentObserver, TerminalRenderer};
use crate::config::TutorConfig;
use crate::exchange::{reject_exchange, run_exchange, ExchangeObserver, ExchangeOutcome};
use crate::stream::cancel_pair;

/// Ask 命令参数
#[derive(Args)]
pub struct AskArgs {
    /// 会话 ID
    pub session_id: String,

    /// 消息内容
    pub message: String,

    /// 显示答案与解析
    #[arg(long)]
    pub reveal: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 ask 命令
pub async fn handle_ask(args: AskArgs, config: TutorConfig) -> Result<()> {
    let client = TutorClient::new(config)?;

    let outcome = if args.json {
        let outcome = exchange(&client, &args, &mut SilentObserver).await;
        println!("{}", format_output(&ExchangeReport::from_outcome(&outcome)));
        outcome
    } else {
        let mut renderer = TerminalRenderer::stdout(args.reveal);
        exchange(&client, &args, &mut renderer).await
    };

    match outcome {
        ExchangeOutcome::Failed(e) => Err(e),
        ExchangeOutcome::Cancelled => {
            if !args.json {
                eprintln!("\n已取消");
            }
            Ok(())
        }
        ExchangeOutcome::Completed { .. } => Ok(()),
    }
}

async fn exchange<O: ExchangeObserver>(
    client: &TutorClient,
    args: &AskArgs,
    observer: &mut O,
) -> ExchangeOutcome {
    let stream = match client
        .send_message_stream(&args.session_id, &args.message)
        .await
    {
        Ok(stream) => stream,
        Err(e) => return reject_exchange(e, observer),
    };

    let (handle, signal) = cancel_pair();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, cancelling exchange");
            handle.cancel();
        }
    });

    let outcome = run_exchange(stream, Some(signal), observer).await;
    ctrl_c.abort();
    outcome
}
