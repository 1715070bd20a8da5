// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Recursive partition-tree walker: decides how each superblock is split
// into coding blocks, handling the forced splits/merges the AV1 spec
// applies at tile and frame boundaries, then hands each leaf to a caller
// callback for block-syntax decoding.

use crate::cdf::TilePartitionCdfs;
use crate::enums::{BlockSize, Partition};
use crate::error::{DecodeError, Result};
use crate::mi_grid::MiGrid;
use crate::symbol::SymbolDecoder;

pub struct PartitionWalker<'p> {
  cdfs: &'p mut TilePartitionCdfs,
  mi_cols: usize,
  mi_rows: usize,
}

impl<'p> PartitionWalker<'p> {
  pub fn new(cdfs: &'p mut TilePartitionCdfs, mi_cols: usize, mi_rows: usize) -> Self {
    Self { cdfs, mi_cols, mi_rows }
  }

  /// Walks one superblock rooted at `(mi_col, mi_row)` with size `bsl`
  /// (log2 of its width/height in MI units), invoking `on_leaf` for every
  /// coding block the tree bottoms out at.
  pub fn walk(
    &mut self,
    sd: &mut SymbolDecoder,
    mi_grid: &mut MiGrid,
    mi_col: usize,
    mi_row: usize,
    bsl: u32,
    on_leaf: &mut dyn FnMut(&mut SymbolDecoder, &mut MiGrid, usize, usize, BlockSize) -> Result<()>,
  ) -> Result<()> {
    let has_rows = mi_row + (1usize << bsl) <= self.mi_rows;
    let has_cols = mi_col + (1usize << bsl) <= self.mi_cols;

    if !has_rows && !has_cols {
      if bsl == 0 {
        return Err(DecodeError::Internal("partition tree split past minimum block size".to_string()));
      }
      return self.recurse_split(sd, mi_grid, mi_col, mi_row, bsl, on_leaf);
    }

    let partition = if bsl == 0 {
      Partition::NONE
    } else if has_rows && has_cols {
      self.read_partition(sd, mi_grid, mi_col, mi_row, bsl)?
    } else if has_cols {
      // Only the column extent fits: the block either stays whole or
      // splits horizontally (top/bottom halves).
      if self.read_split_or(sd, mi_grid, mi_col, mi_row, bsl, true)? {
        Partition::SPLIT
      } else {
        Partition::HORZ
      }
    } else {
      if self.read_split_or(sd, mi_grid, mi_col, mi_row, bsl, false)? {
        Partition::SPLIT
      } else {
        Partition::VERT
      }
    };

    self.apply_partition(sd, mi_grid, mi_col, mi_row, bsl, partition, on_leaf)
  }

  fn recurse_split(
    &mut self,
    sd: &mut SymbolDecoder,
    mi_grid: &mut MiGrid,
    mi_col: usize,
    mi_row: usize,
    bsl: u32,
    on_leaf: &mut dyn FnMut(&mut SymbolDecoder, &mut MiGrid, usize, usize, BlockSize) -> Result<()>,
  ) -> Result<()> {
    let half = 1usize << (bsl - 1);
    for (dc, dr) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
      let col = mi_col + dc * half;
      let row = mi_row + dr * half;
      if col < self.mi_cols && row < self.mi_rows {
        self.walk(sd, mi_grid, col, row, bsl - 1, on_leaf)?;
      }
    }
    Ok(())
  }

  fn read_partition(
    &mut self,
    sd: &mut SymbolDecoder,
    mi_grid: &mut MiGrid,
    mi_col: usize,
    mi_row: usize,
    bsl: u32,
  ) -> Result<Partition> {
    let ctx = mi_grid.partition_ctx(mi_col, mi_row, bsl) as usize;
    let sym = match bsl {
      1 => sd.read_symbol(&mut self.cdfs.w8[ctx], 4)?,
      2 => sd.read_symbol(&mut self.cdfs.w16[ctx], 10)?,
      3 => sd.read_symbol(&mut self.cdfs.w32[ctx], 10)?,
      4 => sd.read_symbol(&mut self.cdfs.w64[ctx], 10)?,
      5 => sd.read_symbol(&mut self.cdfs.w128[ctx], 8)?,
      _ => {
        return Err(DecodeError::Internal(format!("partition bsl {bsl} out of range")));
      }
    };
    Partition::from_symbol(sym).ok_or_else(|| DecodeError::InvalidSymbol {
      where_: "partition".to_string(),
      symbol: sym,
      detail: "not a valid Partition value".to_string(),
    })
  }

  /// Derived binary "must split" decision used at a tile edge where only
  /// one of rows/cols fits, ported from the reference decoder's
  /// `derive_split_or_horz/vert_cdf`. Each sums the probability mass of a
  /// specific subset of partition outcomes (not simply "everything but
  /// NONE") into a synthetic two-symbol CDF.
  fn read_split_or(
    &mut self,
    sd: &mut SymbolDecoder,
    mi_grid: &mut MiGrid,
    mi_col: usize,
    mi_row: usize,
    bsl: u32,
    rows_missing: bool,
  ) -> Result<bool> {
    let ctx = mi_grid.partition_ctx(mi_col, mi_row, bsl) as usize;
    let is_128 = bsl == 5;
    let cdf: &[u16] = match bsl {
      1 => &self.cdfs.w8[ctx],
      2 => &self.cdfs.w16[ctx],
      3 => &self.cdfs.w32[ctx],
      4 => &self.cdfs.w64[ctx],
      5 => &self.cdfs.w128[ctx],
      _ => return Err(DecodeError::Internal(format!("partition bsl {bsl} out of range"))),
    };

    // w8 only carries NONE/HORZ/VERT/SPLIT: the extended partitions don't
    // exist at 8x8, so their contribution to the derived CDF is zero.
    let last_valid = cdf.len() - 2;
    let mass = |idx: usize| -> u32 {
      if idx > last_valid {
        return 0;
      }
      if idx == 0 {
        cdf[0] as u32
      } else {
        cdf[idx] as u32 - cdf[idx - 1] as u32
      }
    };

    // Partition indices: NONE=0 HORZ=1 VERT=2 SPLIT=3 HORZ_A=4 HORZ_B=5
    // VERT_A=6 VERT_B=7 HORZ_4=8 VERT_4=9.
    let mut psum = if rows_missing {
      mass(2) + mass(3) + mass(4) + mass(6) + mass(7) + if is_128 { 0 } else { mass(9) }
    } else {
      mass(1) + mass(3) + mass(4) + mass(5) + mass(6) + if is_128 { 0 } else { mass(8) }
    };
    psum = psum.min(1 << 15);

    let mut split_or_cdf = [(((1u32 << 15) - psum) as u16), 1u16 << 15, 0];
    let sym = sd.read_symbol(&mut split_or_cdf, 2)?;
    Ok(sym == 1)
  }

  fn apply_partition(
    &mut self,
    sd: &mut SymbolDecoder,
    mi_grid: &mut MiGrid,
    mi_col: usize,
    mi_row: usize,
    bsl: u32,
    partition: Partition,
    on_leaf: &mut dyn FnMut(&mut SymbolDecoder, &mut MiGrid, usize, usize, BlockSize) -> Result<()>,
  ) -> Result<()> {
    let unit = 1usize << bsl;
    let half = if bsl == 0 { 0 } else { 1usize << (bsl - 1) };
    let quarter = if bsl <= 1 { 0 } else { 1usize << (bsl - 2) };

    match partition {
      Partition::NONE => {
        let bs = BlockSize::from_wlog2_hlog2(bsl, bsl).ok_or_else(|| {
          DecodeError::Internal(format!("no BlockSize for bsl {bsl}"))
        })?;
        on_leaf(sd, mi_grid, mi_col, mi_row, bs)
      }
      Partition::SPLIT => self.recurse_split(sd, mi_grid, mi_col, mi_row, bsl, on_leaf),
      Partition::HORZ => {
        let bs = BlockSize::from_wlog2_hlog2(bsl, bsl - 1)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for HORZ".to_string()))?;
        on_leaf(sd, mi_grid, mi_col, mi_row, bs)?;
        if mi_row + half < self.mi_rows {
          on_leaf(sd, mi_grid, mi_col, mi_row + half, bs)?;
        }
        Ok(())
      }
      Partition::VERT => {
        let bs = BlockSize::from_wlog2_hlog2(bsl - 1, bsl)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for VERT".to_string()))?;
        on_leaf(sd, mi_grid, mi_col, mi_row, bs)?;
        if mi_col + half < self.mi_cols {
          on_leaf(sd, mi_grid, mi_col + half, mi_row, bs)?;
        }
        Ok(())
      }
      Partition::HORZ_A => {
        let small = BlockSize::from_wlog2_hlog2(bsl - 1, bsl - 1)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for HORZ_A small".to_string()))?;
        let wide = BlockSize::from_wlog2_hlog2(bsl, bsl - 1)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for HORZ_A wide".to_string()))?;
        on_leaf(sd, mi_grid, mi_col, mi_row, small)?;
        on_leaf(sd, mi_grid, mi_col + half, mi_row, small)?;
        on_leaf(sd, mi_grid, mi_col, mi_row + half, wide)
      }
      Partition::HORZ_B => {
        let wide = BlockSize::from_wlog2_hlog2(bsl, bsl - 1)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for HORZ_B wide".to_string()))?;
        let small = BlockSize::from_wlog2_hlog2(bsl - 1, bsl - 1)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for HORZ_B small".to_string()))?;
        on_leaf(sd, mi_grid, mi_col, mi_row, wide)?;
        on_leaf(sd, mi_grid, mi_col, mi_row + half, small)?;
        on_leaf(sd, mi_grid, mi_col + half, mi_row + half, small)
      }
      Partition::VERT_A => {
        let small = BlockSize::from_wlog2_hlog2(bsl - 1, bsl - 1)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for VERT_A small".to_string()))?;
        let tall = BlockSize::from_wlog2_hlog2(bsl - 1, bsl)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for VERT_A tall".to_string()))?;
        on_leaf(sd, mi_grid, mi_col, mi_row, small)?;
        on_leaf(sd, mi_grid, mi_col, mi_row + half, small)?;
        on_leaf(sd, mi_grid, mi_col + half, mi_row, tall)
      }
      Partition::VERT_B => {
        let tall = BlockSize::from_wlog2_hlog2(bsl - 1, bsl)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for VERT_B tall".to_string()))?;
        let small = BlockSize::from_wlog2_hlog2(bsl - 1, bsl - 1)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for VERT_B small".to_string()))?;
        on_leaf(sd, mi_grid, mi_col, mi_row, tall)?;
        on_leaf(sd, mi_grid, mi_col + half, mi_row, small)?;
        on_leaf(sd, mi_grid, mi_col + half, mi_row + half, small)
      }
      Partition::HORZ_4 => {
        let bs = BlockSize::from_wlog2_hlog2(bsl, bsl - 2)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for HORZ_4".to_string()))?;
        for i in 0..4 {
          let row = mi_row + i * quarter;
          if row < self.mi_rows {
            on_leaf(sd, mi_grid, mi_col, row, bs)?;
          }
        }
        Ok(())
      }
      Partition::VERT_4 => {
        let bs = BlockSize::from_wlog2_hlog2(bsl - 2, bsl)
          .ok_or_else(|| DecodeError::Internal("no BlockSize for VERT_4".to_string()))?;
        for i in 0..4 {
          let col = mi_col + i * quarter;
          if col < self.mi_cols {
            on_leaf(sd, mi_grid, col, mi_row, bs)?;
          }
        }
        Ok(())
      }
    }
    .map(|_| {
      let _ = unit;
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn leaf_block_at_bsl_zero_is_4x4_none() {
    let mut cdfs = TilePartitionCdfs::new();
    let mut grid = MiGrid::new(4, 4);
    let data = [0u8; 4];
    let mut sd = SymbolDecoder::new(&data, false).unwrap();
    let mut walker = PartitionWalker::new(&mut cdfs, 4, 4);
    let mut seen = Vec::new();
    walker
      .walk(&mut sd, &mut grid, 0, 0, 0, &mut |_, _, c, r, bs| {
        seen.push((c, r, bs));
        Ok(())
      })
      .unwrap();
    assert_eq!(seen, vec![(0, 0, BlockSize::Block4x4)]);
  }
}
