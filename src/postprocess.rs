// 该文件是 Tuili （推理） 项目的一部分。
// src/postprocess.rs - 后处理：模型输出到结果对象
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

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::{
  FromUrl,
  backend::ModelOutputs,
  error::TaskError,
  model::{Classification, Detection, Keypoint, PixelDetection},
  tensor::{ModelShape, TensorKey},
};

pub trait Postprocess {
  type Output;

  /// 解码模型输出
  ///
  /// `frame_size` 为输入图像的 (宽, 高)，只有输出像素坐标的解码器会用到。
  fn postprocess<O: ModelOutputs + ?Sized>(
    &self,
    outputs: &O,
    shape: &ModelShape,
    frame_size: (usize, usize),
  ) -> Result<Self::Output, TaskError>;
}

mod argmax;
mod bbox5_label1;
mod bbox7;
mod heatmap;
mod pixel_bbox;

pub use self::argmax::ArgMax;
pub use self::bbox5_label1::{BBOX5_LABEL1_MAX_DETECTION, BBox5Label1};
pub use self::bbox7::{BBOX7_MAX_DETECTION, BBox7};
pub use self::heatmap::Heatmap;
pub use self::pixel_bbox::PixelBBox5Label1;

#[derive(Error, Debug)]
pub enum DecoderConfigError {
  #[error("未知的解码器: {0}")]
  UnknownDecoder(String),
  #[error("参数 {key} 的取值无效: {value}")]
  InvalidParameter { key: String, value: String },
}

/// 封闭的解码器集合，在运行时按配置选择
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDecoder {
  BBox5Label1(BBox5Label1),
  BBox7(BBox7),
  PixelBBox5Label1(PixelBBox5Label1),
  Heatmap(Heatmap),
  ArgMax(ArgMax),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum Decoded {
  Detections(Vec<Detection>),
  PixelDetections(Vec<PixelDetection>),
  Keypoints(Vec<Keypoint>),
  Classification(Classification),
}

impl Decoded {
  pub fn len(&self) -> usize {
    match self {
      Decoded::Detections(items) => items.len(),
      Decoded::PixelDetections(items) => items.len(),
      Decoded::Keypoints(items) => items.len(),
      Decoded::Classification(_) => 1,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl Postprocess for AnyDecoder {
  type Output = Decoded;

  fn postprocess<O: ModelOutputs + ?Sized>(
    &self,
    outputs: &O,
    shape: &ModelShape,
    frame_size: (usize, usize),
  ) -> Result<Self::Output, TaskError> {
    match self {
      AnyDecoder::BBox5Label1(d) => d
        .postprocess(outputs, shape, frame_size)
        .map(Decoded::Detections),
      AnyDecoder::BBox7(d) => d
        .postprocess(outputs, shape, frame_size)
        .map(Decoded::Detections),
      AnyDecoder::PixelBBox5Label1(d) => d
        .postprocess(outputs, shape, frame_size)
        .map(Decoded::PixelDetections),
      AnyDecoder::Heatmap(d) => d
        .postprocess(outputs, shape, frame_size)
        .map(Decoded::Keypoints),
      AnyDecoder::ArgMax(d) => d
        .postprocess(outputs, shape, frame_size)
        .map(Decoded::Classification),
    }
  }
}

fn parse_param<T: std::str::FromStr>(
  query: &HashMap<String, String>,
  key: &str,
) -> Result<Option<T>, DecoderConfigError> {
  query
    .get(key)
    .map(|value| {
      value
        .parse::<T>()
        .map_err(|_| DecoderConfigError::InvalidParameter {
          key: key.to_string(),
          value: value.clone(),
        })
    })
    .transpose()
}

fn parse_key(query: &HashMap<String, String>, key: &str) -> Option<TensorKey> {
  query.get(key).map(|value| match value.parse::<usize>() {
    Ok(index) => TensorKey::Index(index),
    Err(_) => TensorKey::Name(value.clone()),
  })
}

impl FromUrl for AnyDecoder {
  type Error = DecoderConfigError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    let query: HashMap<String, String> = url
      .query_pairs()
      .map(|(k, v)| (String::from(k), String::from(v)))
      .collect();

    let decoder = match url.scheme() {
      "bbox5label1" => {
        let mut d = BBox5Label1::default();
        if let Some(max) = parse_param(&query, "max")? {
          d = d.with_max_detection(max);
        }
        let boxes = parse_key(&query, "boxes").unwrap_or_else(|| d.boxes.clone());
        let labels = parse_key(&query, "labels").unwrap_or_else(|| d.labels.clone());
        AnyDecoder::BBox5Label1(d.with_outputs(boxes, labels))
      }
      "bbox7" => {
        let mut d = BBox7::default();
        if let Some(max) = parse_param(&query, "max")? {
          d = d.with_max_detection(max);
        }
        if let Some(boxes) = parse_key(&query, "boxes") {
          d = d.with_output(boxes);
        }
        AnyDecoder::BBox7(d)
      }
      "pixel-bbox5label1" => {
        let mut d = PixelBBox5Label1::default();
        if let Some(max) = parse_param(&query, "max")? {
          d = d.with_max_detection(max);
        }
        let width: Option<usize> = parse_param(&query, "width")?;
        let height: Option<usize> = parse_param(&query, "height")?;
        match (width, height) {
          (Some(width), Some(height)) => d = d.with_display_size(width, height),
          (None, None) => {}
          _ => {
            return Err(DecoderConfigError::InvalidParameter {
              key: "width/height".to_string(),
              value: "需要同时指定".to_string(),
            });
          }
        }
        if let Some(min) = parse_param(&query, "min_confidence")? {
          d = d.with_min_confidence(min);
        }
        let boxes = parse_key(&query, "boxes").unwrap_or_else(|| d.boxes.clone());
        let labels = parse_key(&query, "labels").unwrap_or_else(|| d.labels.clone());
        AnyDecoder::PixelBBox5Label1(d.with_outputs(boxes, labels))
      }
      "heatmap" => {
        let d = Heatmap::default();
        match parse_key(&query, "output") {
          Some(key) => AnyDecoder::Heatmap(d.with_output(key)),
          None => AnyDecoder::Heatmap(d),
        }
      }
      "argmax" => {
        let d = ArgMax::default();
        match parse_key(&query, "output") {
          Some(key) => AnyDecoder::ArgMax(d.with_output(key)),
          None => AnyDecoder::ArgMax(d),
        }
      }
      other => return Err(DecoderConfigError::UnknownDecoder(other.to_string())),
    };

    Ok(decoder)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(s: &str) -> Result<AnyDecoder, DecoderConfigError> {
    AnyDecoder::from_url(&Url::parse(s).unwrap())
  }

  #[test]
  fn defaults_follow_family_limits() {
    let AnyDecoder::BBox5Label1(d) = parse("bbox5label1://").unwrap() else {
      panic!("应为 BBox5Label1");
    };
    assert_eq!(d.max_detection, 100);
    let AnyDecoder::BBox7(d) = parse("bbox7://").unwrap() else {
      panic!("应为 BBox7");
    };
    assert_eq!(d.max_detection, 200);
  }

  #[test]
  fn query_configures_decoder() {
    let decoder = parse("pixel-bbox5label1://?width=640&height=480&min_confidence=0.2&labels=labels")
      .unwrap();
    assert_eq!(
      decoder,
      AnyDecoder::PixelBBox5Label1(
        PixelBBox5Label1::default()
          .with_display_size(640, 480)
          .with_min_confidence(0.2)
          .with_outputs(TensorKey::Index(0), TensorKey::from("labels"))
      )
    );

    let decoder = parse("argmax://?output=prob_emotion").unwrap();
    assert_eq!(
      decoder,
      AnyDecoder::ArgMax(ArgMax::default().with_output(TensorKey::from("prob_emotion")))
    );
  }

  #[test]
  fn bad_parameters_are_rejected() {
    assert!(matches!(
      parse("bbox7://?max=many"),
      Err(DecoderConfigError::InvalidParameter { .. })
    ));
    assert!(matches!(
      parse("pixel-bbox5label1://?width=640"),
      Err(DecoderConfigError::InvalidParameter { .. })
    ));
    assert!(matches!(
      parse("yolo://"),
      Err(DecoderConfigError::UnknownDecoder(_))
    ));
  }
}
