// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Coefficient-context scratch: per-plane above/left culLevel and DC-category
// running state (consulted by txb_skip_ctx/dc_sign_ctx), plus the
// position-based context derivations consulted within one transform block
// (coeff_base_ctx/coeff_br_ctx/coeff_base_eob_ctx), grounded directly in the
// reference decoder's per-transform-block helpers.

use crate::enums::{PlaneType, TxClass};
use crate::tables::{COEFF_BASE_CTX_OFFSET, MAG_REF_OFFSET, SIG_REF_DIFF_OFFSET};

const NUM_BASE_LEVELS: i32 = 2;
const COEFF_BASE_RANGE: i32 = 12;
const SIG_COEF_CONTEXTS_2D: u32 = 26;
const LEVEL_CONTEXTS: u32 = 21;

/// Above/left `culLevel`/DC-category scratch for one plane, spanning a
/// tile's full width/height in 4x4 units. Reset once per tile (above) or
/// superblock row (left); carried across every transform block in raster
/// order. `above_dc`/`left_dc` use `{0 = no contribution, 1 = negative,
/// 2 = positive}`, matching the DC-sign-context encoding directly.
#[derive(Debug, Clone)]
pub struct CoeffContext {
  above_level: Vec<u8>,
  left_level: Vec<u8>,
  above_dc: Vec<u8>,
  left_dc: Vec<u8>,
}

impl CoeffContext {
  pub fn new(mi_cols: usize, mi_rows: usize) -> Self {
    Self {
      above_level: vec![0; mi_cols],
      left_level: vec![0; mi_rows],
      above_dc: vec![0; mi_cols],
      left_dc: vec![0; mi_rows],
    }
  }

  pub fn reset_above(&mut self) {
    self.above_level.iter_mut().for_each(|v| *v = 0);
    self.above_dc.iter_mut().for_each(|v| *v = 0);
  }

  pub fn reset_left(&mut self) {
    self.left_level.iter_mut().for_each(|v| *v = 0);
    self.left_dc.iter_mut().for_each(|v| *v = 0);
  }

  /// `txb_skip_ctx`: plane 0 compares the clamped above/left culLevel maxima
  /// against the transform size relative to the covering block's size;
  /// planes >0 fold above/left nonzero-or-DC presence into a 7..12 context.
  #[allow(clippy::too_many_arguments)]
  pub fn txb_skip_ctx(
    &self,
    plane: PlaneType,
    mi_col: usize,
    mi_row: usize,
    w4: usize,
    h4: usize,
    bw_px: usize,
    bh_px: usize,
    tw_px: usize,
    th_px: usize,
  ) -> u32 {
    if plane == PlaneType::Luma {
      let top: u32 = self.above_level[mi_col..mi_col + w4].iter().map(|&v| v as u32).max().unwrap_or(0).min(255);
      let left: u32 = self.left_level[mi_row..mi_row + h4].iter().map(|&v| v as u32).max().unwrap_or(0).min(255);

      if (bw_px, bh_px) == (tw_px, th_px) {
        return 0;
      }
      if top == 0 && left == 0 {
        return 1;
      }
      if top == 0 || left == 0 {
        let other = top.max(left);
        return if other > 3 { 3 } else { 2 };
      }
      if top <= 3 && left <= 3 {
        return 4;
      }
      if top <= 3 || left <= 3 {
        return 5;
      }
      return 6;
    }

    let above = self.above_level[mi_col..mi_col + w4].iter().zip(&self.above_dc[mi_col..mi_col + w4]).any(|(&l, &d)| l != 0 || d != 0);
    let left = self.left_level[mi_row..mi_row + h4].iter().zip(&self.left_dc[mi_row..mi_row + h4]).any(|(&l, &d)| l != 0 || d != 0);

    let size_bump = if bw_px * bh_px > tw_px * th_px { 3 } else { 0 };
    above as u32 + left as u32 + 7 + size_bump
  }

  /// `dc_sign_ctx`: net sign balance across the above/left DC-category
  /// scratch; `1` if net negative, `2` if net positive, else `0`.
  pub fn dc_sign_ctx(&self, mi_col: usize, mi_row: usize, w4: usize, h4: usize) -> u32 {
    let mut sum = 0i32;
    for &d in &self.above_dc[mi_col..mi_col + w4] {
      sum += dc_category_sign(d);
    }
    for &d in &self.left_dc[mi_row..mi_row + h4] {
      sum += dc_category_sign(d);
    }
    if sum < 0 {
      1
    } else if sum > 0 {
      2
    } else {
      0
    }
  }

  /// Records this transform block's outcome into the above/left scratch:
  /// `cul_level = min(63, sum of |quant|)`, and a DC category of `{0,1,2}`
  /// from the sign of the DC coefficient (`0` if the DC coefficient is 0).
  pub fn update(&mut self, mi_col: usize, mi_row: usize, w4: usize, h4: usize, cul_level: u8, dc_category: u8) {
    for v in &mut self.above_level[mi_col..mi_col + w4] {
      *v = cul_level;
    }
    for v in &mut self.left_level[mi_row..mi_row + h4] {
      *v = cul_level;
    }
    for v in &mut self.above_dc[mi_col..mi_col + w4] {
      *v = dc_category;
    }
    for v in &mut self.left_dc[mi_row..mi_row + h4] {
      *v = dc_category;
    }
  }
}

fn dc_category_sign(d: u8) -> i32 {
  match d {
    1 => -1,
    2 => 1,
    _ => 0,
  }
}

fn tx_class_index(tx_class: TxClass) -> usize {
  match tx_class {
    TxClass::Class2D => 0,
    TxClass::Horiz => 1,
    TxClass::Vert => 2,
  }
}

/// `coeff_base_ctx`: context for `coeff_base` at scan position `pos`
/// (raster `row = pos >> bwl`, `col = pos - (row << bwl)`), from the sum of
/// already-decoded neighboring magnitudes in `quant` (local to this
/// transform block, raster-addressed, capped tx_size indexed into
/// `COEFF_BASE_CTX_OFFSET` by its square-adjusted index).
pub fn coeff_base_ctx(
  adj_tx_size: usize,
  tx_class: TxClass,
  bwl: u32,
  width: usize,
  height: usize,
  pos: usize,
  quant: &[i32],
) -> u32 {
  let class_idx = tx_class_index(tx_class);
  let row = pos >> bwl;
  let col = pos - (row << bwl);

  let mut mag = 0i32;
  for &(dr, dc) in &SIG_REF_DIFF_OFFSET[class_idx] {
    let rr = row as i32 + dr;
    let cc = col as i32 + dc;
    if rr >= 0 && cc >= 0 && (rr as usize) < height && (cc as usize) < width {
      let idx = ((rr as usize) << bwl) + cc as usize;
      mag += quant[idx].unsigned_abs().min(3) as i32;
    }
  }

  let mut ctx = ((mag + 1) >> 1).min(4) as u32;

  if tx_class == TxClass::Class2D {
    if row == 0 && col == 0 {
      return 0;
    }
    let rr = row.min(4);
    let cc = col.min(4);
    ctx += COEFF_BASE_CTX_OFFSET[adj_tx_size][rr][cc] as u32;
    return ctx;
  }

  let idx = if tx_class == TxClass::Vert { row } else { col };
  let cap = idx.min(2) as u32;
  ctx += SIG_COEF_CONTEXTS_2D + cap * 5;
  ctx
}

/// `coeff_base_eob_ctx`: context for `coeff_base_eob`, from the scan index
/// `c` relative to the transform block's total coefficient count.
pub fn coeff_base_eob_ctx(width: usize, height: usize, c: usize) -> u32 {
  let coeffs = width * height;
  if c == 0 {
    0
  } else if c <= coeffs / 8 {
    1
  } else if c <= coeffs / 4 {
    2
  } else {
    3
  }
}

/// `coeff_br_ctx`: context for the `coeff_br` Golomb-extension loop.
pub fn coeff_br_ctx(tx_class: TxClass, bwl: u32, width: usize, height: usize, pos: usize, quant: &[i32]) -> u32 {
  let class_idx = tx_class_index(tx_class);
  let row = pos >> bwl;
  let col = pos - (row << bwl);

  let cap = COEFF_BASE_RANGE + NUM_BASE_LEVELS + 1;
  let mut mag = 0i32;
  for &(dr, dc) in &MAG_REF_OFFSET[class_idx] {
    let rr = row as i32 + dr;
    let cc = col as i32 + dc;
    if rr >= 0 && cc >= 0 && (rr as usize) < height && (cc as usize) < width {
      let idx = (rr as usize) * width + cc as usize;
      mag += quant[idx].unsigned_abs().min(cap as u32) as i32;
    }
  }

  mag = ((mag + 1) >> 1).min(6);

  let ctx = if pos == 0 {
    mag
  } else if tx_class == TxClass::Class2D {
    if row < 2 && col < 2 {
      mag + 7
    } else {
      mag + 14
    }
  } else if tx_class == TxClass::Horiz {
    if col == 0 {
      mag + 7
    } else {
      mag + 14
    }
  } else if row == 0 {
    mag + 7
  } else {
    mag + 14
  };

  (ctx as u32).min(LEVEL_CONTEXTS - 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn txb_skip_ctx_whole_block_transform_is_zero() {
    let ctx = CoeffContext::new(16, 16);
    assert_eq!(ctx.txb_skip_ctx(PlaneType::Luma, 0, 0, 2, 2, 8, 8, 8, 8), 0);
  }

  #[test]
  fn txb_skip_ctx_no_neighbors_split_block() {
    let ctx = CoeffContext::new(16, 16);
    assert_eq!(ctx.txb_skip_ctx(PlaneType::Luma, 0, 0, 1, 1, 8, 8, 4, 4), 1);
  }

  #[test]
  fn txb_skip_ctx_updates_from_neighbors() {
    let mut ctx = CoeffContext::new(16, 16);
    ctx.update(0, 0, 2, 2, 1, 0);
    assert_eq!(ctx.txb_skip_ctx(PlaneType::Luma, 2, 0, 2, 2, 8, 8, 4, 4), 2);
  }

  #[test]
  fn txb_skip_ctx_chroma_folds_above_left_presence() {
    let mut ctx = CoeffContext::new(16, 16);
    ctx.update(0, 0, 2, 2, 5, 0);
    assert_eq!(ctx.txb_skip_ctx(PlaneType::Chroma, 2, 0, 2, 2, 8, 8, 4, 4), 11);
    assert_eq!(ctx.txb_skip_ctx(PlaneType::Chroma, 2, 2, 2, 2, 8, 8, 4, 4), 10);
  }

  #[test]
  fn dc_sign_ctx_tracks_sign_balance() {
    let mut ctx = CoeffContext::new(16, 16);
    ctx.update(0, 0, 2, 2, 1, 1);
    assert_eq!(ctx.dc_sign_ctx(2, 0, 2, 2), 1);
    ctx.update(2, 0, 2, 2, 1, 2);
    assert_eq!(ctx.dc_sign_ctx(0, 0, 4, 2), 2);
  }

  #[test]
  fn coeff_base_ctx_dc_position_is_zero() {
    let quant = vec![0i32; 16];
    let ctx = coeff_base_ctx(0, TxClass::Class2D, 2, 4, 4, 0, &quant);
    assert_eq!(ctx, 0);
  }

  #[test]
  fn coeff_base_eob_ctx_first_position_is_zero() {
    assert_eq!(coeff_base_eob_ctx(4, 4, 0), 0);
    assert_eq!(coeff_base_eob_ctx(4, 4, 15), 3);
  }
}
