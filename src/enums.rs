// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

#![allow(non_camel_case_types)]

/// Partition decision at one node of the superblock partition tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
  NONE = 0,
  HORZ = 1,
  VERT = 2,
  SPLIT = 3,
  HORZ_A = 4,
  HORZ_B = 5,
  VERT_A = 6,
  VERT_B = 7,
  HORZ_4 = 8,
  VERT_4 = 9,
}

impl Partition {
  pub fn from_symbol(sym: u32) -> Option<Self> {
    use Partition::*;
    Some(match sym {
      0 => NONE,
      1 => HORZ,
      2 => VERT,
      3 => SPLIT,
      4 => HORZ_A,
      5 => HORZ_B,
      6 => VERT_A,
      7 => VERT_B,
      8 => HORZ_4,
      9 => VERT_4,
      _ => return None,
    })
  }
}

/// AV1 `TxSize` enum, in the ordering the spec's per-TxSize lookup tables use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxSize {
  Tx4x4 = 0,
  Tx8x8 = 1,
  Tx16x16 = 2,
  Tx32x32 = 3,
  Tx64x64 = 4,
  Tx4x8 = 5,
  Tx8x4 = 6,
  Tx8x16 = 7,
  Tx16x8 = 8,
  Tx16x32 = 9,
  Tx32x16 = 10,
  Tx32x64 = 11,
  Tx64x32 = 12,
  Tx4x16 = 13,
  Tx16x4 = 14,
  Tx8x32 = 15,
  Tx32x8 = 16,
  Tx16x64 = 17,
  Tx64x16 = 18,
}

pub const TX_SIZES_ALL: usize = 19;

impl TxSize {
  pub fn from_index(idx: usize) -> Option<Self> {
    use TxSize::*;
    const TABLE: [TxSize; TX_SIZES_ALL] = [
      Tx4x4, Tx8x8, Tx16x16, Tx32x32, Tx64x64, Tx4x8, Tx8x4, Tx8x16, Tx16x8, Tx16x32, Tx32x16,
      Tx32x64, Tx64x32, Tx4x16, Tx16x4, Tx8x32, Tx32x8, Tx16x64, Tx64x16,
    ];
    TABLE.get(idx).copied()
  }

  pub fn index(self) -> usize {
    self as usize
  }

  pub fn width_log2(self) -> u32 {
    crate::tables::TX_WIDTH_LOG2[self.index()] as u32
  }

  pub fn height_log2(self) -> u32 {
    crate::tables::TX_HEIGHT_LOG2[self.index()] as u32
  }
}

/// Transform class, governing scan order and coefficient-context offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxClass {
  Class2D,
  Horiz,
  Vert,
}

/// Transform type, restricted to the intra-only subset this kernel decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxType {
  Idtx,
  DctDct,
  VDct,
  HDct,
  AdstAdst,
  AdstDct,
  DctAdst,
}

impl TxType {
  pub fn class(self) -> TxClass {
    match self {
      TxType::VDct => TxClass::Vert,
      TxType::HDct => TxClass::Horiz,
      _ => TxClass::Class2D,
    }
  }
}

/// `get_tx_set(txSz)` result for intra blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxSet {
  DctOnly,
  Intra1,
  Intra2,
}

/// Plane type used to select coefficient CDFs: 0 = luma, 1 = chroma.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneType {
  Luma = 0,
  Chroma = 1,
}

/// `tx_mode` frame header field: governs whether `read_tx_size` ever reads
/// a `tx_depth` symbol at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxMode {
  Only4x4,
  Largest,
  Select,
}

/// AV1 `BlockSize` enum (22 sizes), spec ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockSize {
  Block4x4 = 0,
  Block4x8 = 1,
  Block8x4 = 2,
  Block8x8 = 3,
  Block8x16 = 4,
  Block16x8 = 5,
  Block16x16 = 6,
  Block16x32 = 7,
  Block32x16 = 8,
  Block32x32 = 9,
  Block32x64 = 10,
  Block64x32 = 11,
  Block64x64 = 12,
  Block64x128 = 13,
  Block128x64 = 14,
  Block128x128 = 15,
  Block4x16 = 16,
  Block16x4 = 17,
  Block8x32 = 18,
  Block32x8 = 19,
  Block16x64 = 20,
  Block64x16 = 21,
}

pub const BLOCK_SIZES: usize = 22;

impl BlockSize {
  /// `wlog2`/`hlog2` are log2 of the block's width/height in MI (4x4) units.
  pub fn from_wlog2_hlog2(wlog2: u32, hlog2: u32) -> Option<Self> {
    use BlockSize::*;
    Some(match (wlog2, hlog2) {
      (0, 0) => Block4x4,
      (0, 1) => Block4x8,
      (1, 0) => Block8x4,
      (1, 1) => Block8x8,
      (1, 2) => Block8x16,
      (2, 1) => Block16x8,
      (2, 2) => Block16x16,
      (2, 3) => Block16x32,
      (3, 2) => Block32x16,
      (3, 3) => Block32x32,
      (3, 4) => Block32x64,
      (4, 3) => Block64x32,
      (4, 4) => Block64x64,
      (4, 5) => Block64x128,
      (5, 4) => Block128x64,
      (5, 5) => Block128x128,
      (0, 2) => Block4x16,
      (2, 0) => Block16x4,
      (1, 3) => Block8x32,
      (3, 1) => Block32x8,
      (2, 4) => Block16x64,
      (4, 2) => Block64x16,
      _ => return None,
    })
  }

  pub fn wlog2(self) -> u32 {
    use BlockSize::*;
    match self {
      Block4x4 | Block4x8 | Block4x16 => 0,
      Block8x4 | Block8x8 | Block8x16 | Block8x32 => 1,
      Block16x8 | Block16x16 | Block16x32 | Block16x4 | Block16x64 => 2,
      Block32x16 | Block32x32 | Block32x64 | Block32x8 => 3,
      Block64x32 | Block64x64 | Block64x128 | Block64x16 => 4,
      Block128x64 | Block128x128 => 5,
    }
  }

  pub fn hlog2(self) -> u32 {
    use BlockSize::*;
    match self {
      Block4x4 | Block8x4 | Block16x4 => 0,
      Block4x8 | Block8x8 | Block16x8 | Block32x8 => 1,
      Block8x16 | Block16x16 | Block32x16 | Block64x16 => 2,
      Block16x32 | Block32x32 | Block64x32 | Block4x16 => 3,
      Block32x64 | Block64x64 | Block128x64 | Block8x32 => 4,
      Block64x128 | Block128x128 | Block16x64 => 5,
    }
  }
}
