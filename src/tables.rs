// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Per-TxSize constant lookup tables from the AV1 spec. These are pure data;
// tabulate them directly rather than deriving them at runtime.

use crate::enums::TX_SIZES_ALL;

/// `Adjusted_Tx_Size`: collapses oversized (64-wide) transforms down to the
/// largest size the coefficient-context/scan machinery actually handles.
pub const ADJUSTED_TX_SIZE: [u8; TX_SIZES_ALL] = [
  0, // TX_4X4
  1, // TX_8X8
  2, // TX_16X16
  3, // TX_32X32
  3, // TX_64X64 -> TX_32X32
  5, // TX_4X8
  6, // TX_8X4
  7, // TX_8X16
  8, // TX_16X8
  9, // TX_16X32
  10, // TX_32X16
  3, // TX_32X64 -> TX_32X32
  3, // TX_64X32 -> TX_32X32
  13, // TX_4X16
  14, // TX_16X4
  15, // TX_8X32
  16, // TX_32X8
  9, // TX_16X64 -> TX_16X32
  10, // TX_64X16 -> TX_32X16
];

/// `Tx_Size_Sqr`: maps each TxSize to the square TxSize index (0..4 for
/// {4x4,8x8,16x16,32x32,64x64}) sharing its smaller dimension.
pub const TX_SIZE_SQR: [u8; TX_SIZES_ALL] = [
  0, 1, 2, 3, 4, // 4x4, 8x8, 16x16, 32x32, 64x64
  0, 0, // 4x8, 8x4
  1, 1, // 8x16, 16x8
  2, 2, // 16x32, 32x16
  3, 3, // 32x64, 64x32
  0, 0, // 4x16, 16x4
  1, 1, // 8x32, 32x8
  2, 2, // 16x64, 64x16
];

/// `Tx_Size_Sqr_Up`: as above, but rounding up to the larger dimension.
pub const TX_SIZE_SQR_UP: [u8; TX_SIZES_ALL] = [
  0, 1, 2, 3, 4, // 4x4, 8x8, 16x16, 32x32, 64x64
  1, 1, // 4x8, 8x4
  2, 2, // 8x16, 16x8
  3, 3, // 16x32, 32x16
  4, 4, // 32x64, 64x32
  2, 2, // 4x16, 16x4
  3, 3, // 8x32, 32x8
  4, 4, // 16x64, 64x16
];

pub const TX_WIDTH_LOG2: [u8; TX_SIZES_ALL] = [
  2, 3, 4, 5, 6, // 4x4, 8x8, 16x16, 32x32, 64x64
  2, 3, // 4x8, 8x4
  3, 4, // 8x16, 16x8
  4, 5, // 16x32, 32x16
  5, 6, // 32x64, 64x32
  2, 4, // 4x16, 16x4
  3, 5, // 8x32, 32x8
  4, 6, // 16x64, 64x16
];

pub const TX_HEIGHT_LOG2: [u8; TX_SIZES_ALL] = [
  2, 3, 4, 5, 6, // 4x4, 8x8, 16x16, 32x32, 64x64
  3, 2, // 4x8, 8x4
  4, 3, // 8x16, 16x8
  5, 4, // 16x32, 32x16
  6, 5, // 32x64, 64x32
  4, 2, // 4x16, 16x4
  5, 3, // 8x32, 32x8
  6, 4, // 16x64, 64x16
];

/// Coefficient-context neighborhood offsets by tx class, from
/// `Sig_Ref_Diff_Offset` in the spec: (row, col) deltas used to sum
/// neighboring absolute coefficient magnitudes for `coeff_base_ctx`.
pub const SIG_REF_DIFF_OFFSET: [[(i32, i32); 5]; 3] = [
  // TX_CLASS_2D
  [(0, 1), (1, 0), (1, 1), (0, 2), (2, 0)],
  // TX_CLASS_HORIZ
  [(0, 1), (1, 0), (0, 2), (0, 3), (0, 4)],
  // TX_CLASS_VERT
  [(0, 1), (1, 0), (2, 0), (3, 0), (4, 0)],
];

/// `Mag_Ref_Offset` by tx class, used by `coeff_br_ctx`.
pub const MAG_REF_OFFSET: [[(i32, i32); 3]; 3] = [
  [(0, 1), (1, 0), (1, 1)],
  [(0, 1), (1, 0), (0, 2)],
  [(0, 1), (1, 0), (2, 0)],
];

/// `Coeff_Base_Ctx_Offset[txSize][row][col]` for `row,col` capped to 4: the
/// 2D-class position offset table, one row per (adjusted) TxSize.
pub const COEFF_BASE_CTX_OFFSET: [[[u8; 5]; 5]; 5] = [
  // TX_4X4
  [
    [0, 1, 6, 6, 0],
    [1, 6, 6, 21, 0],
    [6, 6, 21, 21, 0],
    [6, 21, 21, 21, 0],
    [0, 0, 0, 0, 0],
  ],
  // TX_8X8
  [
    [0, 1, 6, 6, 21],
    [1, 6, 6, 21, 21],
    [6, 6, 21, 21, 21],
    [6, 21, 21, 21, 21],
    [21, 21, 21, 21, 21],
  ],
  // TX_16X16
  [
    [0, 1, 6, 6, 21],
    [1, 6, 6, 21, 21],
    [6, 6, 21, 21, 21],
    [6, 21, 21, 21, 21],
    [21, 21, 21, 21, 21],
  ],
  // TX_32X32
  [
    [0, 1, 6, 6, 21],
    [1, 6, 6, 21, 21],
    [6, 6, 21, 21, 21],
    [6, 21, 21, 21, 21],
    [21, 21, 21, 21, 21],
  ],
  // rectangular adjusted sizes reuse the square table of their Tx_Size_Sqr.
  [
    [0, 1, 6, 6, 21],
    [1, 6, 6, 21, 21],
    [6, 6, 21, 21, 21],
    [6, 21, 21, 21, 21],
    [21, 21, 21, 21, 21],
  ],
];

/// `Max_Tx_Size_Rect[BlockSize]`: the largest transform size a block of the
/// given size can use before `read_tx_size()` applies any depth reduction.
pub const MAX_TX_SIZE_RECT: [u8; crate::enums::BLOCK_SIZES] = [
  0, // 4x4 -> TX_4X4
  5, // 4x8 -> TX_4X8
  6, // 8x4 -> TX_8X4
  1, // 8x8 -> TX_8X8
  7, // 8x16 -> TX_8X16
  8, // 16x8 -> TX_16X8
  2, // 16x16 -> TX_16X16
  9, // 16x32 -> TX_16X32
  10, // 32x16 -> TX_32X16
  3, // 32x32 -> TX_32X32
  11, // 32x64 -> TX_32X64
  12, // 64x32 -> TX_64X32
  4, // 64x64 -> TX_64X64
  4, // 64x128 -> TX_64X64
  4, // 128x64 -> TX_64X64
  4, // 128x128 -> TX_64X64
  13, // 4x16 -> TX_4X16
  14, // 16x4 -> TX_16X4
  15, // 8x32 -> TX_8X32
  16, // 32x8 -> TX_32X8
  17, // 16x64 -> TX_16X64
  18, // 64x16 -> TX_64X16
];

/// `Split_Tx_Size[txSize]`: the TxSize one notch smaller, used by
/// `read_tx_size()`'s `tx_depth` loop.
pub const SPLIT_TX_SIZE: [u8; TX_SIZES_ALL] = [
  0, // TX_4X4 (no smaller size)
  0, // TX_8X8 -> TX_4X4
  1, // TX_16X16 -> TX_8X8
  2, // TX_32X32 -> TX_16X16
  3, // TX_64X64 -> TX_32X32
  0, // TX_4X8 -> TX_4X4
  0, // TX_8X4 -> TX_4X4
  1, // TX_8X16 -> TX_8X8
  1, // TX_16X8 -> TX_8X8
  2, // TX_16X32 -> TX_16X16
  2, // TX_32X16 -> TX_16X16
  3, // TX_32X64 -> TX_32X32
  3, // TX_64X32 -> TX_32X32
  5, // TX_4X16 -> TX_4X8
  6, // TX_16X4 -> TX_8X4
  7, // TX_8X32 -> TX_8X16
  8, // TX_32X8 -> TX_16X8
  9, // TX_16X64 -> TX_16X32
  10, // TX_64X16 -> TX_32X16
];
