// 该文件是 Tuili （推理） 项目的一部分。
// src/postprocess/bbox5_label1.rs - 检测框 [N,5] 与标签 [N] 后处理
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

pub const BBOX5_LABEL1_MAX_DETECTION: usize = 100;

const BOX_COLUMNS: usize = 5;

/// 一行原始检测框，坐标为模型输入分辨率下的像素
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Box5Row {
  pub label: u32,
  pub xmin: f32,
  pub ymin: f32,
  pub xmax: f32,
  pub ymax: f32,
  pub confidence: f32,
}

/// 逐行扫描检测框与标签，遇到负标签即停止，最多读取 `max_detection` 行
pub(crate) fn scan_box5_label1<O: ModelOutputs + ?Sized>(
  outputs: &O,
  boxes_key: &TensorKey,
  labels_key: &TensorKey,
  max_detection: usize,
) -> Result<Vec<Box5Row>, TaskError> {
  let boxes_tensor = outputs.require_output(boxes_key)?;
  let labels_tensor = outputs.require_output(labels_key)?;

  let (num_boxes, num_data_each_box) = {
    let shape = boxes_tensor.expect_rank(boxes_key, 2)?;
    (shape[0], shape[1])
  };
  if num_data_each_box < BOX_COLUMNS {
    return Err(TaskError::incompatible(format!(
      "检测框每行至少 {} 列, 实际 {} 列",
      BOX_COLUMNS, num_data_each_box
    )));
  }
  if labels_tensor.ndim() == 0 {
    return Err(TaskError::incompatible(format!(
      "标签输出 {} 不能是标量",
      labels_key
    )));
  }

  let boxes = boxes_tensor.f32_row_major(boxes_key)?;
  let labels = labels_tensor.i64_row_major(labels_key)?;

  let mut rows = Vec::new();
  for idx in 0..num_boxes.min(max_detection) {
    // 结束标记之前标签就用完了才算不兼容
    let label = *labels.get(idx).ok_or_else(|| {
      TaskError::incompatible(format!(
        "标签数量 {} 少于检测框数量 {}",
        labels.len(),
        num_boxes
      ))
    })?;
    // 负标签之后都是填充行
    if label < 0 {
      break;
    }
    let label = u32::try_from(label)
      .map_err(|_| TaskError::incompatible(format!("标签超出范围: {}", label)))?;

    let row = &boxes[idx * num_data_each_box..idx * num_data_each_box + BOX_COLUMNS];
    rows.push(Box5Row {
      label,
      xmin: row[0],
      ymin: row[1],
      xmax: row[2],
      ymax: row[3],
      confidence: row[4],
    });
  }

  Ok(rows)
}

/// 检测框 [N,5] 与标签 [N]，输出按模型输入尺寸归一化的坐标
#[derive(Debug, Clone, PartialEq)]
pub struct BBox5Label1 {
  pub max_detection: usize,
  pub boxes: TensorKey,
  pub labels: TensorKey,
}

impl Default for BBox5Label1 {
  fn default() -> Self {
    Self {
      max_detection: BBOX5_LABEL1_MAX_DETECTION,
      boxes: TensorKey::Index(0),
      labels: TensorKey::Index(1),
    }
  }
}

impl BBox5Label1 {
  pub fn with_max_detection(mut self, max_detection: usize) -> Self {
    self.max_detection = max_detection;
    self
  }

  pub fn with_outputs(mut self, boxes: TensorKey, labels: TensorKey) -> Self {
    self.boxes = boxes;
    self.labels = labels;
    self
  }
}

impl Postprocess for BBox5Label1 {
  type Output = Vec<Detection>;

  fn postprocess<O: ModelOutputs + ?Sized>(
    &self,
    outputs: &O,
    shape: &ModelShape,
    _frame_size: (usize, usize),
  ) -> Result<Self::Output, TaskError> {
    let rows = scan_box5_label1(outputs, &self.boxes, &self.labels, self.max_detection)?;

    let input_w = shape.width as f32;
    let input_h = shape.height as f32;
    let detections: Vec<Detection> = rows
      .into_iter()
      .map(|row| Detection {
        rect: Rect::from_corners(
          row.xmin / input_w,
          row.ymin / input_h,
          row.xmax / input_w,
          row.ymax / input_h,
        ),
        label: row.label,
        confidence: row.confidence,
      })
      .collect();

    debug!("解码得到 {} 个检测框", detections.len());
    Ok(detections)
  }
}
