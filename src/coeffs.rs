// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Per-transform-block coefficient syntax: txb_skip, eob construction,
// coeff_base_eob/coeff_base, the coeff_br Golomb extension, and signs.

use crate::cdf::TileCoeffCdfs;
use crate::coeff_context::{coeff_base_ctx, coeff_base_eob_ctx, coeff_br_ctx, CoeffContext};
use crate::enums::{PlaneType, TxClass};
use crate::error::{DecodeError, Result};
use crate::scan::build_scan;
use crate::symbol::SymbolDecoder;

const NUM_BASE_LEVELS: i32 = 2;
const COEFF_BASE_RANGE: i32 = 12;
const BR_CDF_SIZE: usize = 4;

/// Result of decoding one transform block's coefficients: the quantized
/// values in raster order plus the end-of-block position actually read.
pub struct DecodedCoeffs {
  pub quant: Vec<i32>,
  pub eob: usize,
  pub all_zero: bool,
}

/// Reads the `eob_pt` symbol and derives the resulting `eob` position.
/// `eob_multisize` is `min(wlog2,5) + min(hlog2,5) - 4`, selecting one of
/// the seven `eob_pt` CDF sizes: sizes beyond 32x32 only ever carry
/// coefficients in their top-left 32x32 corner.
fn read_eob(
  sd: &mut SymbolDecoder,
  cdfs: &mut TileCoeffCdfs,
  plane: PlaneType,
  tx_size_ctx: usize,
  eob_multisize: u32,
  ctx: usize,
) -> Result<usize> {
  let p = plane as usize;
  let eob_pt_sym = match eob_multisize {
    0 => sd.read_symbol(&mut cdfs.eob_pt_16[p][ctx], 5)?,
    1 => sd.read_symbol(&mut cdfs.eob_pt_32[p][ctx], 6)?,
    2 => sd.read_symbol(&mut cdfs.eob_pt_64[p][ctx], 7)?,
    3 => sd.read_symbol(&mut cdfs.eob_pt_128[p][ctx], 8)?,
    4 => sd.read_symbol(&mut cdfs.eob_pt_256[p][ctx], 9)?,
    5 => sd.read_symbol(&mut cdfs.eob_pt_512[p], 10)?,
    _ => sd.read_symbol(&mut cdfs.eob_pt_1024[p], 11)?,
  };

  let eob_pt = eob_pt_sym + 1;
  if eob_pt < 2 {
    return Ok(eob_pt as usize);
  }

  let mut eob = (1usize << (eob_pt - 2)) + 1;

  if eob_pt >= 3 {
    let ctx_idx = (eob_pt - 3) as usize;
    let eob_shift0 = eob_pt - 3;
    let eob_extra = sd.read_symbol(&mut cdfs.eob_extra[p][tx_size_ctx][ctx_idx], 2)?;
    if eob_extra != 0 {
      eob += 1usize << eob_shift0;
    }
    let eob_pt_minus2 = eob_pt - 2;
    for i in 1..eob_pt_minus2 {
      let shift = (eob_pt_minus2 - 1) - i;
      let bit = sd.read_bool()? as usize;
      if bit != 0 {
        eob += 1usize << shift;
      }
    }
  }

  Ok(eob)
}

/// Decodes one transform block's residual. `width`/`height` are the
/// transform's pixel dimensions; `bwl` is `log2(width)`; `adj_tx_size` is
/// `Adjusted_Tx_Size` of the (possibly oversized) transform; `tx_size_ctx`
/// and `br_tx_size_ctx` select the tile's mutable CDF rows for this size;
/// `bw_px`/`bh_px` are the covering block's pixel dimensions, needed by
/// `txb_skip_ctx` to tell whether this transform spans the whole block.
#[allow(clippy::too_many_arguments)]
pub fn decode_coeffs(
  sd: &mut SymbolDecoder,
  cdfs: &mut TileCoeffCdfs,
  ctx: &mut CoeffContext,
  plane: PlaneType,
  tx_class: TxClass,
  bwl: u32,
  width: usize,
  height: usize,
  bw_px: usize,
  bh_px: usize,
  mi_col: usize,
  mi_row: usize,
  w4: usize,
  h4: usize,
  tx_size_ctx: usize,
  br_tx_size_ctx: usize,
  txb_skip_ctx_override: Option<u32>,
) -> Result<DecodedCoeffs> {
  let p = plane as usize;
  let txb_ctx = txb_skip_ctx_override
    .unwrap_or_else(|| ctx.txb_skip_ctx(plane, mi_col, mi_row, w4, h4, bw_px, bh_px, width, height));
  let all_zero = sd.read_symbol(&mut cdfs.txb_skip[tx_size_ctx][txb_ctx as usize], 2)? == 1;

  if all_zero {
    ctx.update(mi_col, mi_row, w4, h4, 0, 0);
    return Ok(DecodedCoeffs { quant: vec![0; width * height], eob: 0, all_zero: true });
  }

  // eobMultisize caps each dimension's log2 at 5: tx sizes wider/taller than
  // 32 only ever carry coefficients in their top-left 32x32 corner.
  let wlog2 = width.trailing_zeros().min(5);
  let hlog2 = height.trailing_zeros().min(5);
  let eob_multisize = wlog2 + hlog2 - 4;
  let eob_plane_ctx = if tx_class == TxClass::Class2D { 0 } else { 1 };
  let seg_eob = (width * height).min(1024);
  let eob = read_eob(sd, cdfs, plane, tx_size_ctx, eob_multisize, eob_plane_ctx)?.max(1).min(seg_eob);

  let scan = build_scan(tx_class, width, height);
  let mut quant = vec![0i32; width * height];

  for (idx, &pos) in scan[..eob].iter().enumerate().rev() {
    let pos = pos as usize;
    let c = idx;

    let level: i32 = if c == eob - 1 {
      let base_ctx = coeff_base_eob_ctx(width, height, c);
      let sym = sd.read_symbol(&mut cdfs.coeff_base_eob[p][tx_size_ctx][base_ctx as usize], 3)?;
      1 + sym as i32
    } else {
      let base_ctx = coeff_base_ctx(tx_size_ctx, tx_class, bwl, width, height, pos, &quant);
      let sym = sd.read_symbol(&mut cdfs.coeff_base[tx_size_ctx][p][base_ctx as usize], 4)?;
      sym as i32
    };

    let mut level = level;
    if level > NUM_BASE_LEVELS {
      let br_ctx = coeff_br_ctx(tx_class, bwl, width, height, pos, &quant);
      for _ in 0..4 {
        let sym = sd.read_symbol(&mut cdfs.coeff_br[br_tx_size_ctx][p][br_ctx as usize], BR_CDF_SIZE)?;
        level += sym as i32;
        if sym < (BR_CDF_SIZE as u32 - 1) {
          break;
        }
      }
    }

    quant[pos] = level;
  }

  let dc_sign_ctx = ctx.dc_sign_ctx(mi_col, mi_row, w4, h4);
  let mut dc_sign_out = 0i8;

  for (c, &pos) in scan[..eob].iter().enumerate() {
    let pos = pos as usize;
    if quant[pos] == 0 {
      continue;
    }
    let sign = if pos == 0 {
      let sym = sd.read_symbol(&mut cdfs.dc_sign[p][dc_sign_ctx as usize], 2)?;
      dc_sign_out = if sym == 1 { -1 } else { 1 };
      sym
    } else {
      sd.read_bool()?
    };

    if quant[pos] > COEFF_BASE_RANGE + NUM_BASE_LEVELS {
      let x = read_golomb(sd)?;
      quant[pos] = x as i32 + COEFF_BASE_RANGE + NUM_BASE_LEVELS;
    }

    if sign == 1 {
      quant[pos] = -quant[pos];
    }
    let _ = c;
  }

  let cul_level: u32 = quant.iter().map(|&v| v.unsigned_abs()).sum();
  let dc_category = if dc_sign_out < 0 { 1 } else if dc_sign_out > 0 { 2 } else { 0 };
  ctx.update(mi_col, mi_row, w4, h4, cul_level.min(63) as u8, dc_category);

  Ok(DecodedCoeffs { quant, eob, all_zero: false })
}

/// Exp-Golomb tail used once a coefficient saturates `coeff_br`'s range.
/// Returns the raw decoded magnitude `x`; the caller adds
/// `COEFF_BASE_RANGE + NUM_BASE_LEVELS` to get the final coefficient level.
fn read_golomb(sd: &mut SymbolDecoder) -> Result<u32> {
  let mut length = 0u32;
  let mut golomb_length_bit = 0u32;
  while golomb_length_bit == 0 {
    golomb_length_bit = sd.read_bool()?;
    length += 1;
    if length > 20 {
      return Err(DecodeError::InvalidSymbol {
        where_: "golomb".to_string(),
        symbol: length,
        detail: "unary prefix too long".to_string(),
      });
    }
  }
  let mut x = 1u32;
  for _ in 0..length - 1 {
    let bit = sd.read_bool()?;
    x = (x << 1) | bit;
  }
  Ok(x)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_coeffs_produces_well_formed_block() {
    let mut cdfs = TileCoeffCdfs::new(0);
    let mut ctx = CoeffContext::new(16, 16);
    // All-zero input bits push the symbol decoder toward the low end of
    // every CDF, which for the uniform 2-symbol txb_skip placeholder lands
    // on all_zero = true: no further reads are attempted.
    let data = [0u8; 8];
    let mut sd = SymbolDecoder::new(&data, false).unwrap();
    let out = decode_coeffs(
      &mut sd,
      &mut cdfs,
      &mut ctx,
      PlaneType::Luma,
      TxClass::Class2D,
      2,
      4,
      4,
      4,
      4,
      0,
      0,
      1,
      1,
      0,
      0,
      Some(0),
    )
    .unwrap();
    assert_eq!(out.quant.len(), 16);
    if out.all_zero {
      assert_eq!(out.eob, 0);
      assert!(out.quant.iter().all(|&v| v == 0));
    }
  }
}
