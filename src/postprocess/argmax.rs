// 该文件是 Tuili （推理） 项目的一部分。
// src/postprocess/argmax.rs - 分类后处理
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

use tracing::debug;

use crate::{
  backend::ModelOutputs,
  error::TaskError,
  model::Classification,
  postprocess::Postprocess,
  tensor::{ModelShape, TensorKey},
};

/// 取概率向量的最大值作为分类结果
#[derive(Debug, Clone, PartialEq)]
pub struct ArgMax {
  pub scores: TensorKey,
}

impl Default for ArgMax {
  fn default() -> Self {
    Self {
      scores: TensorKey::Index(0),
    }
  }
}

impl ArgMax {
  pub fn with_output(mut self, scores: TensorKey) -> Self {
    self.scores = scores;
    self
  }
}

impl Postprocess for ArgMax {
  type Output = Classification;

  fn postprocess<O: ModelOutputs + ?Sized>(
    &self,
    outputs: &O,
    _shape: &ModelShape,
    _frame_size: (usize, usize),
  ) -> Result<Self::Output, TaskError> {
    let tensor = outputs.require_output(&self.scores)?;
    let scores = tensor.f32_row_major(&self.scores)?;

    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
      if best.is_none_or(|(_, b)| score > b) {
        best = Some((idx, score));
      }
    }
    let (label, confidence) =
      best.ok_or_else(|| TaskError::incompatible(format!("分类输出 {} 为空", self.scores)))?;

    debug!("分类结果: {} ({:.4})", label, confidence);
    Ok(Classification {
      label: label as u32,
      confidence,
    })
  }
}
