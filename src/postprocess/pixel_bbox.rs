// 该文件是 Tuili （推理） 项目的一部分。
// src/postprocess/pixel_bbox.rs - 输出像素坐标的检测框后处理
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
  model::{PixelDetection, PixelRect},
  postprocess::{
    Postprocess,
    bbox5_label1::{BBOX5_LABEL1_MAX_DETECTION, scan_box5_label1},
  },
  tensor::{ModelShape, TensorKey},
};

/// 与 [`BBox5Label1`](super::BBox5Label1) 相同的输出布局，
/// 但直接换算为显示图像上截断取整的像素坐标
///
/// 未指定显示尺寸时使用输入图像本身的尺寸。
/// 设置 `min_confidence` 后，置信度低于阈值的行同样结束扫描。
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBBox5Label1 {
  pub max_detection: usize,
  pub boxes: TensorKey,
  pub labels: TensorKey,
  pub display_size: Option<(usize, usize)>,
  pub min_confidence: Option<f32>,
}

impl Default for PixelBBox5Label1 {
  fn default() -> Self {
    Self {
      max_detection: BBOX5_LABEL1_MAX_DETECTION,
      boxes: TensorKey::Index(0),
      labels: TensorKey::Index(1),
      display_size: None,
      min_confidence: None,
    }
  }
}

impl PixelBBox5Label1 {
  pub fn with_display_size(mut self, width: usize, height: usize) -> Self {
    self.display_size = Some((width, height));
    self
  }

  pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
    self.min_confidence = Some(min_confidence);
    self
  }

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

impl Postprocess for PixelBBox5Label1 {
  type Output = Vec<PixelDetection>;

  fn postprocess<O: ModelOutputs + ?Sized>(
    &self,
    outputs: &O,
    shape: &ModelShape,
    frame_size: (usize, usize),
  ) -> Result<Self::Output, TaskError> {
    let rows = scan_box5_label1(outputs, &self.boxes, &self.labels, self.max_detection)?;

    let (display_w, display_h) = self.display_size.unwrap_or(frame_size);
    let (display_w, display_h) = (display_w as f32, display_h as f32);
    let input_w = shape.width as f32;
    let input_h = shape.height as f32;

    let detections: Vec<PixelDetection> = rows
      .into_iter()
      .take_while(|row| self.min_confidence.is_none_or(|min| row.confidence >= min))
      .map(|row| PixelDetection {
        rect: PixelRect::from_corners(
          (row.xmin / input_w * display_w) as i32,
          (row.ymin / input_h * display_h) as i32,
          (row.xmax / input_w * display_w) as i32,
          (row.ymax / input_h * display_h) as i32,
        ),
        label: row.label,
        confidence: row.confidence,
      })
      .collect();

    debug!("解码得到 {} 个像素检测框", detections.len());
    Ok(detections)
  }
}
