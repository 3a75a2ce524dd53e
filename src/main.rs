// 该文件是 Tuili （推理） 项目的一部分。
// src/main.rs - 推理任务主程序
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

mod args;

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tuili::{
  FromUrl,
  backend::MemoryBackend,
  input::ImageFileInput,
  output::OutputWrapper,
  postprocess::AnyDecoder,
  preprocess::FloatChw,
  task::{ContinuousTask, InferenceTask, OneShotTask, Task},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("推理后端: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("解码器: {}", args.decoder);
  info!("输出路径: {}", args.output);

  let input = ImageFileInput::from_url(&args.input)?;
  let backend = MemoryBackend::from_url(&args.model)?;
  let decoder = AnyDecoder::from_url(&args.decoder)?;
  let output = OutputWrapper::from_url(&args.output)?;

  let task = InferenceTask::new(backend, FloatChw::new(), decoder);

  match args.frames {
    None => OneShotTask.run_task(input, task, output)?,
    Some(frames) => {
      let stop = Arc::new(AtomicBool::new(false));
      let flag = stop.clone();
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        flag.store(true, Ordering::SeqCst);
      })?;

      ContinuousTask::default()
        .with_frame_number(Some(frames))
        .with_stop_flag(stop)
        .run_task(input, task, output)?;
    }
  }

  Ok(())
}
