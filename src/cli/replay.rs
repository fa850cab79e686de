//! Replay 命令 - 把录制的流式响应按固定块大小重放一遍完整交换

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::Args;
use std::path::PathBuf;
use tracing::debug;

use crate::cli::output::{format_output, ExchangeReport};
use crate::cli::render::{SilentObserver, TerminalRenderer};
use crate::exchange::{run_exchange, ExchangeOutcome};

/// Replay 命令参数
#[derive(Args)]
pub struct ReplayArgs {
    /// 录制的 NDJSON 响应文件
    pub file: PathBuf,

    /// 每个块的字节数
    #[arg(long, default_value = "64")]
    pub chunk_size: usize,

    /// 显示答案与解析
    #[arg(long)]
    pub reveal: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 replay 命令
pub async fn handle_replay(args: ReplayArgs) -> Result<()> {
    if args.chunk_size == 0 {
        bail!("--chunk-size must be greater than 0");
    }

    let recorded = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let chunks = split_chunks(Bytes::from(recorded), args.chunk_size);
    debug!(chunks = chunks.len(), "Replaying recorded stream");

    let stream = futures::stream::iter(chunks.into_iter().map(Ok::<_, std::io::Error>));

    let outcome = if args.json {
        let outcome = run_exchange(stream, None, &mut SilentObserver).await;
        println!("{}", format_output(&ExchangeReport::from_outcome(&outcome)));
        outcome
    } else {
        let mut renderer = TerminalRenderer::stdout(args.reveal);
        run_exchange(stream, None, &mut renderer).await
    };

    match outcome {
        ExchangeOutcome::Failed(e) => Err(e),
        _ => Ok(()),
    }
}

/// 按固定大小切块（不关心 UTF-8 边界，用来模拟真实传输）
pub fn split_chunks(data: Bytes, chunk_size: usize) -> Vec<Bytes> {
    let mut chunks = Vec::new();
    let mut offset = 0;
    while offset < data.len() {
        let end = (offset + chunk_size).min(data.len());
        chunks.push(data.slice(offset..end));
        offset = end;
    }
    chunks
}
