// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Per-MI (4x4 luma unit) scratch grid the partition walker and block decoder
// consult to derive above/left contexts, mirroring the reference decoder's
// `Av1MiSize` record.

use crate::error::{DecodeError, Result};

/// One 4x4 mode-info record. `wlog2`/`hlog2` let a single record stand in
/// for every MI unit covered by the block that set it, the same economy the
/// reference decoder uses instead of tracking block shape separately.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiRecord {
  pub wlog2: u8,
  pub hlog2: u8,
  pub skip: u8,
  pub y_mode: u8,
  pub palette_y_size: u8,
  pub palette_uv_size: u8,
  pub segment_id: u8,
}

#[derive(Debug, Clone)]
pub struct MiGrid {
  mi_cols: usize,
  mi_rows: usize,
  mi: Vec<MiRecord>,
}

impl MiGrid {
  pub fn new(mi_cols: usize, mi_rows: usize) -> Self {
    Self { mi_cols, mi_rows, mi: vec![MiRecord::default(); mi_cols * mi_rows] }
  }

  pub fn mi_cols(&self) -> usize {
    self.mi_cols
  }

  pub fn mi_rows(&self) -> usize {
    self.mi_rows
  }

  fn mi_index(&self, mi_col: usize, mi_row: usize) -> usize {
    mi_row * self.mi_cols + mi_col
  }

  pub fn get(&self, mi_col: usize, mi_row: usize) -> Option<&MiRecord> {
    if mi_col < self.mi_cols && mi_row < self.mi_rows {
      Some(&self.mi[self.mi_index(mi_col, mi_row)])
    } else {
      None
    }
  }

  /// Fills every MI unit covered by a `w4 x h4` block at `(mi_col, mi_row)`
  /// with the same record, clipped to the tile/frame boundary.
  pub fn fill_block(&mut self, mi_col: usize, mi_row: usize, w4: usize, h4: usize, record: MiRecord) -> Result<()> {
    let col_end = (mi_col + w4).min(self.mi_cols);
    let row_end = (mi_row + h4).min(self.mi_rows);
    if mi_col >= col_end || mi_row >= row_end {
      return Err(DecodeError::Internal("fill_block outside grid bounds".to_string()));
    }
    for row in mi_row..row_end {
      for col in mi_col..col_end {
        let idx = self.mi_index(col, row);
        self.mi[idx] = record;
      }
    }
    Ok(())
  }

  /// `partition_ctx`: combines whether the above and left neighboring MI
  /// units are each "smaller" than `bsl` (narrower/shorter, respectively)
  /// into the 0..3 partition-CDF row selector.
  pub fn partition_ctx(&self, mi_col: usize, mi_row: usize, bsl: u32) -> u32 {
    let above = if mi_row == 0 {
      0
    } else {
      self.get(mi_col, mi_row - 1).map(|m| (m.wlog2 as u32) < bsl).unwrap_or(false) as u32
    };
    let left = if mi_col == 0 {
      0
    } else {
      self.get(mi_col - 1, mi_row).map(|m| (m.hlog2 as u32) < bsl).unwrap_or(false) as u32
    };
    left * 2 + above
  }

  /// `skip_ctx`: sum of above/left skip flags.
  pub fn skip_ctx(&self, mi_col: usize, mi_row: usize) -> u32 {
    let above = if mi_row == 0 { 0 } else { self.get(mi_col, mi_row - 1).map(|m| m.skip as u32).unwrap_or(0) };
    let left = if mi_col == 0 { 0 } else { self.get(mi_col - 1, mi_row).map(|m| m.skip as u32).unwrap_or(0) };
    above + left
  }

  /// `segment_id_ctx`: compares the above-left, above and left segment ids
  /// and folds them into the 0..2 context used by `read_intra_segment_id`'s
  /// CDF selection.
  pub fn segment_id_ctx(&self, mi_col: usize, mi_row: usize) -> u32 {
    let avail_u = mi_row > 0;
    let avail_l = mi_col > 0;
    let avail_ul = avail_u && avail_l;

    let prev_ul = if avail_ul { self.get(mi_col - 1, mi_row - 1).map(|m| m.segment_id as i32) } else { None };
    let prev_u = if avail_u { self.get(mi_col, mi_row - 1).map(|m| m.segment_id as i32) } else { None };
    let prev_l = if avail_l { self.get(mi_col - 1, mi_row).map(|m| m.segment_id as i32) } else { None };

    match prev_ul {
      None => 0,
      Some(ul) => {
        if Some(ul) == prev_u && Some(ul) == prev_l {
          2
        } else if Some(ul) == prev_u || Some(ul) == prev_l || prev_u == prev_l {
          1
        } else {
          0
        }
      }
    }
  }

  /// `segment_id_pred`: predicted segment id fed into `neg_deinterleave`.
  pub fn segment_id_pred(&self, mi_col: usize, mi_row: usize) -> u32 {
    let avail_u = mi_row > 0;
    let avail_l = mi_col > 0;

    let prev_ul = if avail_u && avail_l { self.get(mi_col - 1, mi_row - 1).map(|m| m.segment_id as u32) } else { None };
    let prev_u = if avail_u { self.get(mi_col, mi_row - 1).map(|m| m.segment_id as u32) } else { None };
    let prev_l = if avail_l { self.get(mi_col - 1, mi_row).map(|m| m.segment_id as u32) } else { None };

    match (prev_u, prev_l) {
      (None, None) => 0,
      (None, Some(l)) => l,
      (Some(u), None) => u,
      (Some(u), Some(l)) => {
        if prev_ul == Some(u) {
          u
        } else {
          l
        }
      }
    }
  }

  /// `palette_y_ctx`: counts above/left blocks that used a luma palette.
  pub fn palette_y_ctx(&self, mi_col: usize, mi_row: usize) -> u32 {
    let above = if mi_row == 0 { 0 } else { self.get(mi_col, mi_row - 1).map(|m| (m.palette_y_size > 0) as u32).unwrap_or(0) };
    let left = if mi_col == 0 { 0 } else { self.get(mi_col - 1, mi_row).map(|m| (m.palette_y_size > 0) as u32).unwrap_or(0) };
    above + left
  }
}

/// `neg_deinterleave(diff, reference, max)`: maps a read `diff` symbol back
/// onto a signed offset around `reference`, used by `read_intra_segment_id`.
pub fn neg_deinterleave(diff: u32, reference: u32, max: u32) -> u32 {
  if reference == 0 {
    return diff;
  }
  if reference >= max.saturating_sub(1) {
    return max.saturating_sub(diff).saturating_sub(1);
  }
  if 2 * reference < max {
    if diff <= 2 * reference {
      if diff & 1 != 0 {
        reference + ((diff + 1) >> 1)
      } else {
        reference - (diff >> 1)
      }
    } else {
      diff
    }
  } else if diff <= 2 * (max - reference - 1) {
    if diff & 1 != 0 {
      reference + ((diff + 1) >> 1)
    } else {
      reference - (diff >> 1)
    }
  } else {
    max - (diff + 1)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fill_block_clips_to_grid() {
    let mut grid = MiGrid::new(4, 4);
    grid.fill_block(2, 2, 4, 4, MiRecord { skip: 1, ..Default::default() }).unwrap();
    assert_eq!(grid.get(3, 3).unwrap().skip, 1);
  }

  #[test]
  fn skip_ctx_sums_neighbors() {
    let mut grid = MiGrid::new(4, 4);
    grid.fill_block(0, 0, 1, 1, MiRecord { skip: 1, ..Default::default() }).unwrap();
    grid.fill_block(1, 1, 1, 1, MiRecord { skip: 1, ..Default::default() }).unwrap();
    assert_eq!(grid.skip_ctx(1, 0), 1);
    assert_eq!(grid.skip_ctx(1, 1), 1);
  }

  #[test]
  fn neg_deinterleave_zero_reference_is_identity() {
    assert_eq!(neg_deinterleave(5, 0, 8), 5);
  }

  #[test]
  fn neg_deinterleave_roundtrips_small_cases() {
    for reference in 0..8u32 {
      for diff in 0..8u32 {
        let v = neg_deinterleave(diff, reference, 8);
        assert!(v < 8);
      }
    }
  }
}
