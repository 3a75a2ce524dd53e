// 该文件是 Tuili （推理） 项目的一部分。
// src/error.rs - 任务错误定义
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

use thiserror::Error;

/// 推理任务中同步抛出的错误，核心不做任何重试
#[derive(Error, Debug)]
pub enum TaskError {
  #[error("图像无效: {0}")]
  InvalidImage(String),
  #[error("形状不匹配: 期望 {expected}, 实际 {actual}")]
  ShapeMismatch { expected: String, actual: String },
  #[error("模型不兼容: {0}")]
  ModelIncompatible(String),
  #[error("推理后端错误: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl TaskError {
  pub fn incompatible(msg: impl Into<String>) -> Self {
    TaskError::ModelIncompatible(msg.into())
  }

  pub fn shape_mismatch(expected: impl ToString, actual: impl ToString) -> Self {
    TaskError::ShapeMismatch {
      expected: expected.to_string(),
      actual: actual.to_string(),
    }
  }

  pub fn backend<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    TaskError::Backend(Box::new(err))
  }
}
