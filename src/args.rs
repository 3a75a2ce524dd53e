// 该文件是 Tuili （推理） 项目的一部分。
// src/args.rs - 命令行参数
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use clap::Parser;
use url::Url;

/// Tuili 推理任务参数
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 推理后端，例如 replay:///path/to/outputs.json
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，例如 image:///path/to/image.jpg
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出解码器
  /// 支持: bbox5label1://, bbox7://, pixel-bbox5label1://, heatmap://, argmax://
  #[arg(long, value_name = "DECODER")]
  pub decoder: Url,
  /// 结果输出，jsonl:///path/out.jsonl、stdout:// 或 log://
  #[arg(long, value_name = "OUTPUT", default_value = "stdout://")]
  pub output: Url,

  /// 连续处理的最大帧数，不指定时只处理第一帧
  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frames: Option<usize>,
}
