// 该文件是 Tuili （推理） 项目的一部分。
// src/postprocess/bbox7.rs - 检测框 [1,1,N,7] 后处理
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
  model::{Detection, Rect},
  postprocess::Postprocess,
  tensor::{ModelShape, TensorKey},
};

pub const BBOX7_MAX_DETECTION: usize = 200;

const BOX_COLUMNS: usize = 7;

/// 单个输出 [1,1,N,7]，每行为
/// (image_id, label, confidence, xmin, ymin, xmax, ymax)，坐标已归一化
#[derive(Debug, Clone, PartialEq)]
pub struct BBox7 {
  pub max_detection: usize,
  pub boxes: TensorKey,
}

impl Default for BBox7 {
  fn default() -> Self {
    Self {
      max_detection: BBOX7_MAX_DETECTION,
      boxes: TensorKey::Index(0),
    }
  }
}

impl BBox7 {
  pub fn with_max_detection(mut self, max_detection: usize) -> Self {
    self.max_detection = max_detection;
    self
  }

  pub fn with_output(mut self, boxes: TensorKey) -> Self {
    self.boxes = boxes;
    self
  }
}

impl Postprocess for BBox7 {
  type Output = Vec<Detection>;

  fn postprocess<O: ModelOutputs + ?Sized>(
    &self,
    outputs: &O,
    _shape: &ModelShape,
    _frame_size: (usize, usize),
  ) -> Result<Self::Output, TaskError> {
    let boxes_tensor = outputs.require_output(&self.boxes)?;
    let (num_boxes, num_data_each_box) = {
      let shape = boxes_tensor.expect_rank(&self.boxes, 4)?;
      (shape[2], shape[3])
    };
    if num_data_each_box < BOX_COLUMNS {
      return Err(TaskError::incompatible(format!(
        "检测框每行至少 {} 列, 实际 {} 列",
        BOX_COLUMNS, num_data_each_box
      )));
    }
    let boxes = boxes_tensor.f32_row_major(&self.boxes)?;

    let mut detections = Vec::new();
    for idx in 0..num_boxes.min(self.max_detection) {
      let row = &boxes[idx * num_data_each_box..idx * num_data_each_box + BOX_COLUMNS];

      // 先截断为整数再判断，(-1, 0) 之间的值会变成 0，不会结束扫描
      let image_id = row[0] as i32;
      if image_id < 0 {
        break;
      }

      let label = row[1] as i32;
      let label = u32::try_from(label).map_err(|_| {
        TaskError::incompatible(format!("第 {} 行 image_id 有效但标签为负: {}", idx, label))
      })?;

      detections.push(Detection {
        rect: Rect::from_corners(row[3], row[4], row[5], row[6]),
        label,
        confidence: row[2],
      });
    }

    debug!("解码得到 {} 个检测框", detections.len());
    Ok(detections)
  }
}
