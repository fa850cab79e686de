//! Extract 命令 - 对一条完整回复运行测验提取

use anyhow::{Context, Result};
use clap::Args;
use std::io::Read;
use std::path::PathBuf;

use crate::cli::output::{format_output, format_result};
use crate::quiz::extract_quiz;

/// Extract 命令参数
#[derive(Args)]
pub struct ExtractArgs {
    /// 回复文本文件（省略时读取 stdin）
    pub file: Option<PathBuf>,

    /// 显示答案与解析
    #[arg(long)]
    pub reveal: bool,

    /// 输出 JSON 格式
    #[arg(long)]
    pub json: bool,
}

/// 处理 extract 命令
pub fn handle_extract(args: ExtractArgs) -> Result<()> {
    let text = match &args.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    let result = extract_quiz(&text);

    if args.json {
        println!("{}", format_output(&result));
    } else if result.has_quiz() {
        print!("{}", format_result(&result, args.reveal));
    } else {
        println!("未发现测验，原文如下:\n");
        println!("{}", result.remaining_text);
    }

    Ok(())
}
