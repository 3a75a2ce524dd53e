// 该文件是 Tuili （推理） 项目的一部分。
// src/postprocess/heatmap.rs - 关键点热力图后处理
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
  model::Keypoint,
  postprocess::Postprocess,
  tensor::{ModelShape, TensorKey},
};

/// 热力图 [1,K,H,W]，每个关节取最大值所在位置
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
  pub heatmaps: TensorKey,
}

impl Default for Heatmap {
  fn default() -> Self {
    Self {
      heatmaps: TensorKey::Index(0),
    }
  }
}

impl Heatmap {
  pub fn with_output(mut self, heatmaps: TensorKey) -> Self {
    self.heatmaps = heatmaps;
    self
  }
}

// 并列最大值取最小的下标
fn argmax(plane: &[f32]) -> (usize, f32) {
  let mut best = (0, plane[0]);
  for (idx, &value) in plane.iter().enumerate().skip(1) {
    if value > best.1 {
      best = (idx, value);
    }
  }
  best
}

impl Postprocess for Heatmap {
  type Output = Vec<Keypoint>;

  fn postprocess<O: ModelOutputs + ?Sized>(
    &self,
    outputs: &O,
    _shape: &ModelShape,
    _frame_size: (usize, usize),
  ) -> Result<Self::Output, TaskError> {
    let tensor = outputs.require_output(&self.heatmaps)?;
    let (batch, joints, height, width) = {
      let shape = tensor.expect_rank(&self.heatmaps, 4)?;
      (shape[0], shape[1], shape[2], shape[3])
    };
    if batch == 0 || height == 0 || width == 0 {
      return Err(TaskError::incompatible(format!(
        "热力图尺寸为零: [{}, {}, {}, {}]",
        batch, joints, height, width
      )));
    }
    let data = tensor.f32_row_major(&self.heatmaps)?;

    let plane_size = height * width;
    let keypoints: Vec<Keypoint> = data[..joints * plane_size]
      .chunks_exact(plane_size)
      .map(|plane| {
        let (idx, confidence) = argmax(plane);
        Keypoint {
          x: (idx % width) as f32 / width as f32,
          y: (idx / width) as f32 / height as f32,
          confidence,
        }
      })
      .collect();

    debug!("解码得到 {} 个关键点", keypoints.len());
    Ok(keypoints)
  }
}
