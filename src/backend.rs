// 该文件是 Tuili （推理） 项目的一部分。
// src/backend.rs - 推理后端接口
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

use ndarray::ArrayView4;

use crate::{
  error::TaskError,
  tensor::{OutputTensor, TensorKey},
};

/// 可按序号或名称读取的模型输出
pub trait ModelOutputs {
  /// 张量不存在时返回 `None`
  fn output(&self, key: &TensorKey) -> Option<OutputTensor<'_>>;

  fn require_output(&self, key: &TensorKey) -> Result<OutputTensor<'_>, TaskError> {
    self
      .output(key)
      .ok_or_else(|| TaskError::incompatible(format!("模型缺少输出 {}", key)))
  }
}

/// 外部推理后端：同步、阻塞地执行已编译的模型
pub trait InferenceBackend: ModelOutputs {
  type Error: std::error::Error + Send + Sync + 'static;

  /// 模型输入维度，通常为 (N, C, H, W)
  fn input_shape(&self) -> Result<Vec<usize>, Self::Error>;

  /// 执行推理，输入张量在调用期间保持有效
  fn infer(&mut self, input: ArrayView4<'_, f32>) -> Result<(), Self::Error>;
}

mod memory;
pub use self::memory::{MemoryBackend, MemoryBackendError};
