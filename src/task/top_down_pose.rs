// 该文件是 Tuili （推理） 项目的一部分。
// src/task/top_down_pose.rs - 先检测人体再逐个估计姿态
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

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
  error::TaskError,
  frame::ImageFrame,
  model::{Detection, Keypoint, Model, PixelRect},
};

pub const TOP_DOWN_MIN_CONFIDENCE: f32 = 0.2;

/// 一个人的检测框、裁剪区域与其中的关键点
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonPose {
  pub detection: Detection,
  /// 实际裁剪的像素区域（已限制在图像内）
  pub crop: PixelRect,
  /// 相对于裁剪区域的比例坐标
  pub keypoints: Vec<Keypoint>,
}

impl PersonPose {
  /// 将关键点换算回整幅图像的比例坐标
  pub fn keypoints_in_frame(&self, width: usize, height: usize) -> Vec<Keypoint> {
    let (width, height) = (width as f32, height as f32);
    self
      .keypoints
      .iter()
      .map(|kp| Keypoint {
        x: (self.crop.x as f32 + kp.x * self.crop.width as f32) / width,
        y: (self.crop.y as f32 + kp.y * self.crop.height as f32) / height,
        confidence: kp.confidence,
      })
      .collect()
  }
}

pub struct TopDownPose<D, P> {
  detector: D,
  pose: P,
  min_confidence: f32,
}

impl<D, P> TopDownPose<D, P>
where
  D: Model<Input = ImageFrame, Output = Vec<Detection>, Error = TaskError>,
  P: Model<Input = ImageFrame, Output = Vec<Keypoint>, Error = TaskError>,
{
  pub fn new(detector: D, pose: P) -> Self {
    Self {
      detector,
      pose,
      min_confidence: TOP_DOWN_MIN_CONFIDENCE,
    }
  }

  pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
    self.min_confidence = min_confidence;
    self
  }

  pub fn detector(&self) -> &D {
    &self.detector
  }

  pub fn pose(&self) -> &P {
    &self.pose
  }
}

impl<D, P> Model for TopDownPose<D, P>
where
  D: Model<Input = ImageFrame, Output = Vec<Detection>, Error = TaskError>,
  P: Model<Input = ImageFrame, Output = Vec<Keypoint>, Error = TaskError>,
{
  type Input = ImageFrame;
  type Output = Vec<PersonPose>;
  type Error = TaskError;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    let (width, height) = (input.width(), input.height());
    let detections = self.detector.infer(input)?;
    debug!("检测到 {} 个候选框", detections.len());

    let mut poses = Vec::new();
    for detection in detections {
      if detection.confidence < self.min_confidence {
        continue;
      }

      let crop = detection
        .rect
        .to_pixels(width, height)
        .clamp_to(width as i32, height as i32);
      let Some(person) = input.crop(&crop) else {
        warn!("裁剪区域为空, 跳过: {:?}", detection.rect);
        continue;
      };

      let keypoints = self.pose.infer(&person)?;
      poses.push(PersonPose {
        detection,
        crop,
        keypoints,
      });
    }

    debug!("估计了 {} 个人体姿态", poses.len());
    Ok(poses)
  }
}
