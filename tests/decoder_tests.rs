// 该文件是 Tuili （推理） 项目的一部分。
// tests/decoder_tests.rs - 各模型族输出解码测试
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

mod common;

use common::{assert_close, box5_backend, box7_backend, heatmap_backend};
use tuili::{
  TaskError,
  backend::MemoryBackend,
  model::PixelRect,
  postprocess::{
    ArgMax, BBOX5_LABEL1_MAX_DETECTION, BBOX7_MAX_DETECTION, BBox5Label1, BBox7, Heatmap,
    PixelBBox5Label1, Postprocess,
  },
  tensor::{ModelShape, TensorKey},
};

const SHAPE: ModelShape = ModelShape {
  batch: 1,
  channels: 3,
  height: 100,
  width: 200,
};

#[test]
fn bbox5_stops_at_first_negative_label() {
  let backend = box5_backend(
    &[1, 3, 100, 200],
    &[
      [20.0, 10.0, 120.0, 60.0, 0.9],
      [0.0, 0.0, 200.0, 100.0, 0.8],
      [10.0, 10.0, 20.0, 20.0, 0.7],
      [10.0, 10.0, 20.0, 20.0, 0.6],
    ],
    &[2, 0, -1, 5],
  );

  let detections = BBox5Label1::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();

  assert_eq!(detections.len(), 2);
  assert_eq!(detections[0].label, 2);
  assert_eq!(detections[1].label, 0);
  assert_close(detections[0].rect.x, 0.1);
  assert_close(detections[0].rect.y, 0.1);
  assert_close(detections[0].rect.width, 0.5);
  assert_close(detections[0].rect.height, 0.5);
  assert_close(detections[0].confidence, 0.9);
}

#[test]
fn bbox5_full_frame_box_round_trips() {
  let backend = box5_backend(&[1, 3, 100, 200], &[[0.0, 0.0, 200.0, 100.0, 0.5]], &[1]);

  let detections = BBox5Label1::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();

  assert_eq!(detections.len(), 1);
  let rect = detections[0].rect;
  assert_eq!((rect.x, rect.y, rect.width, rect.height), (0.0, 0.0, 1.0, 1.0));
}

#[test]
fn bbox5_caps_at_max_detection() {
  let rows = vec![[0.0, 0.0, 10.0, 10.0, 0.5]; 150];
  let labels = vec![1; 150];
  let backend = box5_backend(&[1, 3, 100, 200], &rows, &labels);

  let detections = BBox5Label1::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();
  assert_eq!(detections.len(), BBOX5_LABEL1_MAX_DETECTION);

  let detections = BBox5Label1::default()
    .with_max_detection(3)
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();
  assert_eq!(detections.len(), 3);
}

#[test]
fn bbox5_outputs_can_be_selected_by_name() {
  // 名称查找与顺序无关
  let backend = MemoryBackend::new(&[1, 3, 100, 200])
    .with_i64_output(Some("labels"), &[1], vec![7])
    .unwrap()
    .with_f32_output(Some("boxes"), &[1, 5], vec![0.0, 0.0, 100.0, 50.0, 0.4])
    .unwrap();

  let detections = BBox5Label1::default()
    .with_outputs(TensorKey::from("boxes"), TensorKey::from("labels"))
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();

  assert_eq!(detections.len(), 1);
  assert_eq!(detections[0].label, 7);
  assert_close(detections[0].rect.width, 0.5);
}

#[test]
fn bbox5_missing_output_is_incompatible() {
  let backend = MemoryBackend::new(&[1, 3, 100, 200])
    .with_f32_output(None, &[1, 5], vec![0.0, 0.0, 1.0, 1.0, 0.5])
    .unwrap();

  let result = BBox5Label1::default().postprocess(&backend, &SHAPE, (640, 480));
  assert!(matches!(result, Err(TaskError::ModelIncompatible(_))));
}

#[test]
fn bbox5_wrong_rank_is_incompatible() {
  let backend = MemoryBackend::new(&[1, 3, 100, 200])
    .with_f32_output(None, &[5], vec![0.0, 0.0, 1.0, 1.0, 0.5])
    .unwrap()
    .with_i64_output(None, &[1], vec![1])
    .unwrap();

  let result = BBox5Label1::default().postprocess(&backend, &SHAPE, (640, 480));
  assert!(matches!(result, Err(TaskError::ModelIncompatible(_))));
}

#[test]
fn bbox7_stops_at_negative_image_id() {
  let backend = box7_backend(
    &[1, 3, 100, 200],
    &[
      [0.0, 1.0, 0.9, 0.1, 0.2, 0.5, 0.6],
      [0.0, 3.0, 0.8, 0.0, 0.0, 1.0, 1.0],
      [-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
      [0.0, 2.0, 0.7, 0.1, 0.1, 0.2, 0.2],
    ],
  );

  let detections = BBox7::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();

  assert_eq!(detections.len(), 2);
  assert_eq!(detections[0].label, 1);
  assert_close(detections[0].confidence, 0.9);
  assert_close(detections[0].rect.x, 0.1);
  assert_close(detections[0].rect.y, 0.2);
  assert_close(detections[0].rect.width, 0.4);
  assert_close(detections[0].rect.height, 0.4);
  assert_eq!(detections[1].label, 3);
}

#[test]
fn bbox7_truncates_image_id_toward_zero() {
  // -0.5 截断为 0，不是结束标记
  let backend = box7_backend(
    &[1, 3, 100, 200],
    &[
      [-0.5, 1.0, 0.9, 0.0, 0.0, 1.0, 1.0],
      [-1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    ],
  );

  let detections = BBox7::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();
  assert_eq!(detections.len(), 1);
}

#[test]
fn bbox7_caps_at_max_detection() {
  let rows = vec![[0.0, 1.0, 0.5, 0.0, 0.0, 0.5, 0.5]; 250];
  let backend = box7_backend(&[1, 3, 100, 200], &rows);

  let detections = BBox7::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();
  assert_eq!(detections.len(), BBOX7_MAX_DETECTION);
}

#[test]
fn bbox7_requires_four_dimensions() {
  let backend = MemoryBackend::new(&[1, 3, 100, 200])
    .with_f32_output(None, &[1, 7], vec![0.0; 7])
    .unwrap();

  let result = BBox7::default().postprocess(&backend, &SHAPE, (640, 480));
  assert!(matches!(result, Err(TaskError::ModelIncompatible(_))));
}

#[test]
fn bbox7_negative_label_with_valid_image_is_incompatible() {
  let backend = box7_backend(&[1, 3, 100, 200], &[[0.0, -2.0, 0.9, 0.0, 0.0, 1.0, 1.0]]);

  let result = BBox7::default().postprocess(&backend, &SHAPE, (640, 480));
  assert!(matches!(result, Err(TaskError::ModelIncompatible(_))));
}

#[test]
fn pixel_decoder_scales_to_display_size() {
  let backend = box5_backend(
    &[1, 3, 100, 200],
    &[[20.0, 10.0, 120.0, 60.0, 0.9], [0.0, 0.0, 1.0, 1.0, 0.1]],
    &[1, -1],
  );

  let detections = PixelBBox5Label1::default()
    .with_display_size(400, 300)
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();

  assert_eq!(detections.len(), 1);
  assert_eq!(
    detections[0].rect,
    PixelRect {
      x: 40,
      y: 30,
      width: 200,
      height: 150,
    }
  );
  assert_eq!(detections[0].label, 1);
}

#[test]
fn pixel_decoder_defaults_to_frame_size() {
  let backend = box5_backend(&[1, 3, 100, 200], &[[0.0, 0.0, 100.0, 50.0, 0.9]], &[1]);

  let detections = PixelBBox5Label1::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();

  assert_eq!(
    detections[0].rect,
    PixelRect {
      x: 0,
      y: 0,
      width: 320,
      height: 240,
    }
  );
}

#[test]
fn pixel_decoder_stops_below_min_confidence() {
  let backend = box5_backend(
    &[1, 3, 100, 200],
    &[
      [0.0, 0.0, 10.0, 10.0, 0.9],
      [0.0, 0.0, 10.0, 10.0, 0.3],
      [0.0, 0.0, 10.0, 10.0, 0.8],
    ],
    &[1, 1, 1],
  );

  let decoder = PixelBBox5Label1::default().with_min_confidence(0.5);
  let detections = decoder.postprocess(&backend, &SHAPE, (200, 100)).unwrap();
  assert_eq!(detections.len(), 1);

  let detections = PixelBBox5Label1::default()
    .postprocess(&backend, &SHAPE, (200, 100))
    .unwrap();
  assert_eq!(detections.len(), 3);
}

#[test]
fn pixel_decoder_saturates_extreme_coordinates() {
  let backend = box5_backend(
    &[1, 3, 100, 200],
    &[[-1e10, 0.0, 1e10, 10.0, 0.9]],
    &[1],
  );

  let detections = PixelBBox5Label1::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();

  assert_eq!(detections.len(), 1);
  assert_eq!(
    detections[0].rect,
    PixelRect {
      x: i32::MIN,
      y: 0,
      width: i32::MAX,
      height: 48,
    }
  );
}

#[test]
fn bbox5_short_labels_are_fine_before_the_sentinel() {
  let rows = [
    [20.0, 10.0, 120.0, 60.0, 0.9],
    [0.0, 0.0, 1.0, 1.0, 0.1],
    [0.0, 0.0, 1.0, 1.0, 0.1],
  ];

  let backend = box5_backend(&[1, 3, 100, 200], &rows, &[2, -1]);
  let detections = BBox5Label1::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();
  assert_eq!(detections.len(), 1);
  assert_eq!(detections[0].label, 2);

  // 标签在结束标记之前就用完了
  let backend = box5_backend(&[1, 3, 100, 200], &rows, &[2, 0]);
  let result = BBox5Label1::default().postprocess(&backend, &SHAPE, (640, 480));
  assert!(matches!(result, Err(TaskError::ModelIncompatible(_))));
}

#[test]
fn heatmap_emits_one_keypoint_per_joint() {
  let (joints, height, width) = (3, 4, 5);
  let mut data = vec![0.0; joints * height * width];
  // 第 0 个关节在 (x=4, y=0)，第 2 个在 (x=1, y=3)
  data[4] = 0.7;
  data[2 * height * width + 3 * width + 1] = 0.6;
  let backend = heatmap_backend(&[1, 3, 8, 8], joints, height, width, data);

  let keypoints = Heatmap::default()
    .postprocess(&backend, &SHAPE, (640, 480))
    .unwrap();

  assert_eq!(keypoints.len(), joints);
  assert_close(keypoints[0].x, 4.0 / 5.0);
  assert_close(keypoints[0].y, 0.0);
  assert_close(keypoints[0].confidence, 0.7);
  // 全零平面落在下标 0
  assert_eq!((keypoints[1].x, keypoints[1].y, keypoints[1].confidence), (0.0, 0.0, 0.0));
  assert_close(keypoints[2].x, 1.0 / 5.0);
  assert_close(keypoints[2].y, 3.0 / 4.0);
}

#[test]
fn heatmap_with_zero_plane_is_incompatible() {
  let backend = heatmap_backend(&[1, 3, 8, 8], 2, 0, 4, Vec::new());

  let result = Heatmap::default().postprocess(&backend, &SHAPE, (640, 480));
  assert!(matches!(result, Err(TaskError::ModelIncompatible(_))));
}

#[test]
fn argmax_picks_highest_score() {
  let backend = MemoryBackend::new(&[1, 3, 64, 64])
    .with_f32_output(
      Some("prob_emotion"),
      &[1, 5, 1, 1],
      vec![0.1, 0.05, 0.6, 0.2, 0.05],
    )
    .unwrap();

  let classification = ArgMax::default()
    .with_output(TensorKey::from("prob_emotion"))
    .postprocess(&backend, &SHAPE, (64, 64))
    .unwrap();

  assert_eq!(classification.label, 2);
  assert_close(classification.confidence, 0.6);
}

#[test]
fn argmax_on_empty_output_is_incompatible() {
  let backend = MemoryBackend::new(&[1, 3, 64, 64])
    .with_f32_output(None, &[1, 0], Vec::new())
    .unwrap();

  let result = ArgMax::default().postprocess(&backend, &SHAPE, (64, 64));
  assert!(matches!(result, Err(TaskError::ModelIncompatible(_))));
}

#[test]
fn decoding_twice_gives_the_same_result() {
  let backend = box5_backend(
    &[1, 3, 100, 200],
    &[[20.0, 10.0, 120.0, 60.0, 0.9], [0.0, 0.0, 1.0, 1.0, 0.1]],
    &[3, -1],
  );
  let decoder = BBox5Label1::default();

  let first = decoder.postprocess(&backend, &SHAPE, (640, 480)).unwrap();
  let second = decoder.postprocess(&backend, &SHAPE, (640, 480)).unwrap();
  assert_eq!(first, second);
}
