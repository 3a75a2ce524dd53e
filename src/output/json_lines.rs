// 该文件是 Tuili （推理） 项目的一部分。
// src/output/json_lines.rs - 每帧一行 JSON 的结果输出
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

use std::{
  fs::File,
  io::{BufWriter, Write},
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, output::Render, url_file_path};

pub const STDOUT_SCHEME: &str = "stdout";

#[derive(Error, Debug)]
pub enum JsonLinesOutputError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("写入错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化错误: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("输出锁已失效")]
  Poisoned,
}

#[derive(Serialize)]
struct Record<'a, T> {
  frame: usize,
  result: &'a T,
}

/// 每渲染一帧写入一行 `{"frame": n, "result": ...}`
pub struct JsonLinesOutput {
  writer: Mutex<Box<dyn Write + Send>>,
  frame_index: AtomicUsize,
}

impl JsonLinesOutput {
  pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
    Self {
      writer: Mutex::new(Box::new(writer)),
      frame_index: AtomicUsize::new(0),
    }
  }

  pub fn stdout() -> Self {
    Self::new(std::io::stdout())
  }

  pub fn create(path: &str) -> Result<Self, JsonLinesOutputError> {
    let file = File::create(path)?;
    info!("结果写入文件: {}", path);
    Ok(Self::new(BufWriter::new(file)))
  }
}

impl FromUrlWithScheme for JsonLinesOutput {
  const SCHEME: &'static str = "jsonl";
}

impl FromUrl for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      Self::SCHEME => Self::create(&url_file_path(url)),
      STDOUT_SCHEME => Ok(Self::stdout()),
      other => {
        error!(
          "URI 方案不匹配: 期望 '{}' 或 '{}', 实际 '{}'",
          Self::SCHEME,
          STDOUT_SCHEME,
          other
        );
        Err(JsonLinesOutputError::SchemeMismatch(other.to_string()))
      }
    }
  }
}

impl<F, T: Serialize> Render<F, T> for JsonLinesOutput {
  type Error = JsonLinesOutputError;

  fn render_result(&self, _frame: &F, result: &T) -> Result<(), Self::Error> {
    let frame = self.frame_index.fetch_add(1, Ordering::SeqCst);
    let mut writer = self
      .writer
      .lock()
      .map_err(|_| JsonLinesOutputError::Poisoned)?;

    serde_json::to_writer(&mut *writer, &Record { frame, result })?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    debug!("第 {} 帧结果已写出", frame);
    Ok(())
  }
}
