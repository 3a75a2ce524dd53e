// 该文件是 Tuili （推理） 项目的一部分。
// src/model/skeleton.rs - 人体骨架拓扑
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

use super::Keypoint;

pub const COCO_KEYPOINT_COUNT: usize = 17;

/// COCO 骨架连线，每一项是一对关节序号
pub const COCO_SKELETON: [(usize, usize); 19] = [
  (15, 13),
  (13, 11),
  (16, 14),
  (14, 12),
  (11, 12),
  (5, 11),
  (6, 12),
  (5, 6),
  (5, 7),
  (6, 8),
  (7, 9),
  (8, 10),
  (1, 2),
  (0, 1),
  (0, 2),
  (1, 3),
  (2, 4),
  (3, 5),
  (4, 6),
];

/// COCO 关节序号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeypointIndex {
  Nose = 0,
  LeftEye = 1,
  RightEye = 2,
  LeftEar = 3,
  RightEar = 4,
  LeftShoulder = 5,
  RightShoulder = 6,
  LeftElbow = 7,
  RightElbow = 8,
  LeftWrist = 9,
  RightWrist = 10,
  LeftHip = 11,
  RightHip = 12,
  LeftKnee = 13,
  RightKnee = 14,
  LeftAnkle = 15,
  RightAnkle = 16,
}

impl From<KeypointIndex> for usize {
  fn from(index: KeypointIndex) -> usize {
    index as usize
  }
}

/// 姿态模型族的骨架：关节数与连线
#[derive(Debug, Clone, Copy)]
pub struct Skeleton {
  pub joints: usize,
  pub edges: &'static [(usize, usize)],
}

impl Skeleton {
  pub const COCO: Skeleton = Skeleton {
    joints: COCO_KEYPOINT_COUNT,
    edges: &COCO_SKELETON,
  };

  pub const DEFAULT_THRESHOLD: f32 = 0.001;

  pub fn keypoint(keypoints: &[Keypoint], index: KeypointIndex) -> Option<&Keypoint> {
    keypoints.get(usize::from(index))
  }

  /// 两端置信度都不低于阈值的连线；越界的关节序号会被跳过
  pub fn visible_edges<'a>(
    &self,
    keypoints: &'a [Keypoint],
    threshold: f32,
  ) -> impl Iterator<Item = (&'a Keypoint, &'a Keypoint)> + 'a {
    self.edges.iter().filter_map(move |&(a, b)| {
      let (ka, kb) = (keypoints.get(a)?, keypoints.get(b)?);
      (ka.confidence >= threshold && kb.confidence >= threshold).then_some((ka, kb))
    })
  }
}
