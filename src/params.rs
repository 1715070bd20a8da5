// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Scalar frame/tile header fields the tile-syntax decoder needs but does not
// itself parse out of OBUs; the probe driver supplies them directly.

use crate::enums::TxMode;

pub const MAX_SEGMENTS: usize = 8;
pub const FRAME_LF_COUNT: usize = 4;

#[derive(Debug, Clone)]
pub struct TileParams {
  pub mi_cols: u32,
  pub mi_rows: u32,
  pub sb_size_log2: u32,
  pub use_128x128_superblock: bool,
  pub mono_chrome: bool,
  pub base_q_idx: u32,
  pub delta_q_y_dc: i32,
  pub delta_q_u_dc: i32,
  pub delta_q_u_ac: i32,
  pub delta_q_v_dc: i32,
  pub delta_q_v_ac: i32,
  pub delta_q_present: bool,
  pub delta_q_res: u32,
  pub delta_lf_present: bool,
  pub delta_lf_res: u32,
  pub delta_lf_multi: bool,
  pub segmentation_enabled: bool,
  pub seg_id_pre_skip: bool,
  pub last_active_seg_id: u32,
  pub seg_feature_enabled_alt_q: [bool; MAX_SEGMENTS],
  pub seg_feature_data_alt_q: [i32; MAX_SEGMENTS],
  pub tx_mode: TxMode,
  pub reduced_tx_set: bool,
  pub allow_screen_content_tools: bool,
  pub enable_filter_intra: bool,
  pub subsampling_x: u32,
  pub subsampling_y: u32,
  pub disable_cdf_update: bool,
}

impl Default for TileParams {
  fn default() -> Self {
    Self {
      mi_cols: 0,
      mi_rows: 0,
      sb_size_log2: 4,
      use_128x128_superblock: false,
      mono_chrome: false,
      base_q_idx: 0,
      delta_q_y_dc: 0,
      delta_q_u_dc: 0,
      delta_q_u_ac: 0,
      delta_q_v_dc: 0,
      delta_q_v_ac: 0,
      delta_q_present: false,
      delta_q_res: 0,
      delta_lf_present: false,
      delta_lf_res: 0,
      delta_lf_multi: false,
      segmentation_enabled: false,
      seg_id_pre_skip: false,
      last_active_seg_id: (MAX_SEGMENTS - 1) as u32,
      seg_feature_enabled_alt_q: [false; MAX_SEGMENTS],
      seg_feature_data_alt_q: [0; MAX_SEGMENTS],
      tx_mode: TxMode::Largest,
      reduced_tx_set: false,
      allow_screen_content_tools: false,
      enable_filter_intra: false,
      subsampling_x: 1,
      subsampling_y: 1,
      disable_cdf_update: false,
    }
  }
}

impl TileParams {
  /// `qindex_for_segment`: the effective base_q_idx after the segment's
  /// alt-q delta, clamped to `[0, 255]`.
  pub fn qindex_for_segment(&self, segment_id: u32) -> u32 {
    let mut q = self.base_q_idx as i32;
    if self.segmentation_enabled {
      if let Some(&enabled) = self.seg_feature_enabled_alt_q.get(segment_id as usize) {
        if enabled {
          q += self.seg_feature_data_alt_q[segment_id as usize];
        }
      }
    }
    q.clamp(0, 255) as u32
  }

  /// `lossless_for_segment`: true when this segment's qindex and every
  /// per-plane delta_q are all zero.
  pub fn lossless_for_segment(&self, segment_id: u32) -> bool {
    self.qindex_for_segment(segment_id) == 0
      && self.delta_q_y_dc == 0
      && self.delta_q_u_dc == 0
      && self.delta_q_u_ac == 0
      && self.delta_q_v_dc == 0
      && self.delta_q_v_ac == 0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn qindex_applies_segment_alt_q() {
    let mut params = TileParams {
      base_q_idx: 100,
      segmentation_enabled: true,
      ..Default::default()
    };
    params.seg_feature_enabled_alt_q[2] = true;
    params.seg_feature_data_alt_q[2] = -50;
    assert_eq!(params.qindex_for_segment(2), 50);
    assert_eq!(params.qindex_for_segment(0), 100);
  }

  #[test]
  fn qindex_clamps_to_byte_range() {
    let mut params = TileParams {
      base_q_idx: 10,
      segmentation_enabled: true,
      ..Default::default()
    };
    params.seg_feature_enabled_alt_q[0] = true;
    params.seg_feature_data_alt_q[0] = -100;
    assert_eq!(params.qindex_for_segment(0), 0);
  }

  #[test]
  fn lossless_requires_all_deltas_zero() {
    let params = TileParams::default();
    assert!(params.lossless_for_segment(0));
    let params = TileParams { delta_q_u_ac: 1, ..Default::default() };
    assert!(!params.lossless_for_segment(0));
  }
}
