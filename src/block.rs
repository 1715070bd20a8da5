// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Per-leaf block syntax: segment_id, skip, the superblock delta-q/delta-lf
// pair, intra mode info (y_mode/uv_mode/angle_delta/CFL/palette/filter
// intra), tx_size, and the transform-block loop that drives `coeffs.rs`.
// This kernel decodes tile SYNTAX only: every field below is read off the
// bitstream and folded into context state, never turned into pixels.

use crate::cdf::{TileCoeffCdfs, TileModeCdfs};
use crate::coeff_context::CoeffContext;
use crate::enums::{BlockSize, PlaneType, TxClass, TxMode, TxSize};
use crate::error::{DecodeError, Result};
use crate::mi_grid::{neg_deinterleave, MiGrid, MiRecord};
use crate::params::TileParams;
use crate::symbol::SymbolDecoder;
use crate::tables::{MAX_TX_SIZE_RECT, SPLIT_TX_SIZE, TX_SIZE_SQR_UP};

const MAX_TX_DEPTH: u32 = 2;
const DC_PRED: u32 = 0;

pub struct BlockContext<'a> {
  pub params: &'a TileParams,
  pub mode_cdfs: &'a mut TileModeCdfs,
  pub coeff_cdfs: &'a mut TileCoeffCdfs,
  pub luma_ctx: &'a mut CoeffContext,
  pub chroma_ctx: &'a mut CoeffContext,
}

/// Everything this kernel records about one decoded block, for the probe
/// driver to accumulate into its summary statistics.
#[derive(Debug, Default, Clone)]
pub struct BlockOutcome {
  pub skip: bool,
  pub segment_id: u32,
  pub y_mode: u32,
  pub tx_size: u8,
  pub luma_coeffs_decoded: u32,
  pub chroma_coeffs_decoded: u32,
}

pub fn decode_block(
  sd: &mut SymbolDecoder,
  mi_grid: &mut MiGrid,
  ctx: &mut BlockContext,
  mi_col: usize,
  mi_row: usize,
  bs: BlockSize,
) -> Result<BlockOutcome> {
  let w4 = 1usize << bs.wlog2();
  let h4 = 1usize << bs.hlog2();

  let pre_skip_segment_id = if ctx.params.segmentation_enabled && ctx.params.seg_id_pre_skip {
    read_segment_id(sd, mi_grid, ctx, mi_col, mi_row)?
  } else {
    0
  };

  let skip_ctx = mi_grid.skip_ctx(mi_col, mi_row).min(2) as usize;
  let skip = sd.read_symbol(&mut ctx.mode_cdfs.skip[skip_ctx], 2)? == 1;

  let segment_id = if ctx.params.segmentation_enabled && !ctx.params.seg_id_pre_skip {
    if skip {
      mi_grid.segment_id_pred(mi_col, mi_row)
    } else {
      read_segment_id(sd, mi_grid, ctx, mi_col, mi_row)?
    }
  } else {
    pre_skip_segment_id
  };

  if ctx.params.delta_q_present {
    read_delta_qindex(sd, ctx, skip)?;
  }
  if ctx.params.delta_lf_present {
    read_delta_lf(sd, ctx, skip)?;
  }

  let y_mode = sd.read_symbol(&mut ctx.mode_cdfs.y_mode[0], 13)?;
  if is_directional(y_mode) {
    let angle_ctx = size_group(bs).min(7) as usize;
    let _angle_delta = sd.read_symbol(&mut ctx.mode_cdfs.angle_delta[angle_ctx], 7)?;
  }

  let has_chroma = !ctx.params.mono_chrome;
  let mut uv_mode = 0u32;
  if has_chroma {
    let cfl_allowed = bs.wlog2() <= 3 && bs.hlog2() <= 3;
    uv_mode = if cfl_allowed {
      sd.read_symbol(&mut ctx.mode_cdfs.uv_mode_cfl_allowed[y_mode as usize], 14)?
    } else {
      sd.read_symbol(&mut ctx.mode_cdfs.uv_mode_cfl_not_allowed[y_mode as usize], 13)?
    };
    if cfl_allowed && uv_mode == 13 {
      read_cfl_alphas(sd, ctx)?;
    }
    if is_directional(uv_mode) {
      let _angle_delta_uv = sd.read_symbol(&mut ctx.mode_cdfs.angle_delta[0], 7)?;
    }
  }

  let mut palette_y_size = 0u8;
  let palette_allowed = ctx.params.allow_screen_content_tools
    && w4 >= 2
    && h4 >= 2
    && (w4 * 4) <= 64
    && (h4 * 4) <= 64
    && y_mode == DC_PRED;
  let bsize_ctx = (bs.wlog2() + bs.hlog2()).saturating_sub(2).min(6) as usize;
  if palette_allowed {
    let neigh_ctx = mi_grid.palette_y_ctx(mi_col, mi_row).min(2) as usize;
    let has_palette_y = sd.read_symbol(&mut ctx.mode_cdfs.palette_y_mode[bsize_ctx][neigh_ctx], 2)? == 1;
    if has_palette_y {
      let size_minus_2 = sd.read_symbol(&mut ctx.mode_cdfs.palette_y_size[bsize_ctx], 7)?;
      palette_y_size = (size_minus_2 + 2) as u8;
      return Err(DecodeError::UnsupportedFeature("palette luma mode".to_string()));
    }
  }
  if has_chroma && palette_allowed && uv_mode == DC_PRED {
    let uv_ctx = (palette_y_size > 0) as usize;
    let has_palette_uv = sd.read_symbol(&mut ctx.mode_cdfs.palette_uv_mode[uv_ctx], 2)? == 1;
    if has_palette_uv {
      let _size_minus_2 = sd.read_symbol(&mut ctx.mode_cdfs.palette_uv_size[bsize_ctx], 7)?;
      return Err(DecodeError::UnsupportedFeature("palette chroma mode".to_string()));
    }
  }

  if ctx.params.enable_filter_intra && use_filter_intra(bs, y_mode) && palette_y_size == 0 {
    let fi_ctx = bs as usize;
    if sd.read_symbol(&mut ctx.mode_cdfs.filter_intra[fi_ctx], 2)? == 1 {
      let _mode = sd.read_symbol(&mut ctx.mode_cdfs.filter_intra_mode, 5)?;
    }
  }

  let tx_size = read_tx_size(sd, ctx, bs, skip)?;

  let record = MiRecord {
    wlog2: bs.wlog2() as u8,
    hlog2: bs.hlog2() as u8,
    skip: skip as u8,
    y_mode: y_mode as u8,
    palette_y_size,
    palette_uv_size: 0,
    segment_id: segment_id as u8,
  };
  mi_grid.fill_block(mi_col, mi_row, w4, h4, record)?;

  let mut outcome = BlockOutcome {
    skip,
    segment_id,
    y_mode,
    tx_size: tx_size.index() as u8,
    ..Default::default()
  };

  if !skip {
    decode_residual(sd, ctx, mi_col, mi_row, w4, h4, tx_size, &mut outcome)?;
  }

  Ok(outcome)
}

fn read_segment_id(sd: &mut SymbolDecoder, mi_grid: &mut MiGrid, ctx: &mut BlockContext, mi_col: usize, mi_row: usize) -> Result<u32> {
  if !ctx.params.segmentation_enabled {
    return Ok(0);
  }
  let seg_ctx = mi_grid.segment_id_ctx(mi_col, mi_row) as usize;
  let pred = mi_grid.segment_id_pred(mi_col, mi_row);
  let diff = sd.read_symbol(&mut ctx.mode_cdfs.segment_id[seg_ctx], 8)?;
  let seg = neg_deinterleave(diff, pred, ctx.params.last_active_seg_id + 1);
  if seg > ctx.params.last_active_seg_id {
    return Err(DecodeError::InvalidSymbol {
      where_: "segment_id".to_string(),
      symbol: seg,
      detail: "segment id out of range".to_string(),
    });
  }
  Ok(seg)
}

fn read_delta_qindex(sd: &mut SymbolDecoder, ctx: &mut BlockContext, skip: bool) -> Result<()> {
  if skip {
    return Ok(());
  }
  let abs = sd.read_symbol(&mut ctx.mode_cdfs.delta_q_abs, 4)?;
  let delta = if abs == 3 {
    let rem_bits = sd.read_literal(3)? + 1;
    let v = sd.read_literal(rem_bits)?;
    (v as i32) + (1 << rem_bits) - 1
  } else {
    abs as i32
  };
  if delta != 0 {
    let sign = sd.read_bool()?;
    let delta = if sign == 1 { -delta } else { delta };
    let scaled = delta << ctx.params.delta_q_res;
    ctx.mode_cdfs.current_qindex = (ctx.mode_cdfs.current_qindex as i32 + scaled).clamp(1, 255) as u32;
  }
  Ok(())
}

fn read_delta_lf(sd: &mut SymbolDecoder, ctx: &mut BlockContext, skip: bool) -> Result<()> {
  if skip {
    return Ok(());
  }
  let count = if ctx.params.delta_lf_multi { 4 } else { 1 };
  for i in 0..count {
    let abs = if ctx.params.delta_lf_multi {
      sd.read_symbol(&mut ctx.mode_cdfs.delta_lf_multi[i], 4)?
    } else {
      sd.read_symbol(&mut ctx.mode_cdfs.delta_lf_abs, 4)?
    };
    let delta = if abs == 3 {
      let rem_bits = sd.read_literal(3)? + 1;
      let v = sd.read_literal(rem_bits)?;
      (v as i32) + (1 << rem_bits) - 1
    } else {
      abs as i32
    };
    if delta != 0 {
      let sign = sd.read_bool()?;
      let delta = if sign == 1 { -delta } else { delta };
      let scaled = delta << ctx.params.delta_lf_res;
      ctx.mode_cdfs.delta_lf[i] = (ctx.mode_cdfs.delta_lf[i] + scaled).clamp(0, 63);
    }
  }
  Ok(())
}

/// `read_cfl_alphas`: one 8-ary `cfl_alpha_signs` symbol splits into a
/// `signU`/`signV` pair (`{0=zero, 1=neg, 2=pos}`); each non-zero sign then
/// reads its own magnitude from a context row derived from both signs.
fn read_cfl_alphas(sd: &mut SymbolDecoder, ctx: &mut BlockContext) -> Result<()> {
  let joint_sign = sd.read_symbol(&mut ctx.mode_cdfs.cfl_sign, 8)?;
  let sign_u = (joint_sign + 1) / 3;
  let sign_v = (joint_sign + 1) % 3;

  if sign_u != 0 {
    let cfl_ctx = (joint_sign - 2) as usize;
    let _alpha_u = sd.read_symbol(&mut ctx.mode_cdfs.cfl_alpha[cfl_ctx], 16)?;
  }
  if sign_v != 0 {
    let cfl_ctx = ((sign_v - 1) * 3 + sign_u) as usize;
    let _alpha_v = sd.read_symbol(&mut ctx.mode_cdfs.cfl_alpha[cfl_ctx], 16)?;
  }
  Ok(())
}

fn read_tx_size(sd: &mut SymbolDecoder, ctx: &mut BlockContext, bs: BlockSize, skip: bool) -> Result<TxSize> {
  let max_rect = MAX_TX_SIZE_RECT[bs as usize] as usize;
  let max_tx_size = TxSize::from_index(max_rect)
    .ok_or_else(|| DecodeError::Internal("invalid max tx size index".to_string()))?;

  if ctx.params.tx_mode == TxMode::Only4x4 || ctx.params.lossless_for_segment(0) {
    return Ok(TxSize::Tx4x4);
  }
  if ctx.params.tx_mode != TxMode::Select || skip {
    return Ok(max_tx_size);
  }

  let max_depth = MAX_TX_DEPTH.min(tx_depth_bound(bs));
  let mut depth = 0u32;
  let mut tx_size = max_tx_size;
  while depth < max_depth {
    let tx_ctx = 0usize;
    let cont = match tx_size.width_log2().max(tx_size.height_log2()) {
      3 => sd.read_symbol(&mut ctx.mode_cdfs.tx8x8[tx_ctx], 2)?,
      4 => sd.read_symbol(&mut ctx.mode_cdfs.tx16x16[tx_ctx], 3)?,
      5 => sd.read_symbol(&mut ctx.mode_cdfs.tx32x32[tx_ctx], 3)?,
      _ => sd.read_symbol(&mut ctx.mode_cdfs.tx64x64[tx_ctx], 3)?,
    };
    if cont == 0 {
      break;
    }
    let next = SPLIT_TX_SIZE[tx_size.index()];
    tx_size = TxSize::from_index(next as usize)
      .ok_or_else(|| DecodeError::Internal("invalid split tx size".to_string()))?;
    depth += 1;
  }
  Ok(tx_size)
}

fn tx_depth_bound(bs: BlockSize) -> u32 {
  let shift = bs.wlog2().max(bs.hlog2());
  shift.min(MAX_TX_DEPTH)
}

#[allow(clippy::too_many_arguments)]
fn decode_residual(
  sd: &mut SymbolDecoder,
  ctx: &mut BlockContext,
  mi_col: usize,
  mi_row: usize,
  w4: usize,
  h4: usize,
  tx_size: TxSize,
  outcome: &mut BlockOutcome,
) -> Result<()> {
  let tw = 1usize << tx_size.width_log2();
  let th = 1usize << tx_size.height_log2();
  let bwl = tx_size.width_log2();
  let tx_class = TxClass::Class2D;
  let bw_px = w4 * 4;
  let bh_px = h4 * 4;
  let tx_size_ctx = (TX_SIZE_SQR_UP[tx_size.index()] as usize).min(4);
  let br_tx_size_ctx = tx_size_ctx.min(3);

  let cols = w4 * 4 / tw.max(1);
  let rows = h4 * 4 / th.max(1);

  for ty in 0..rows.max(1) {
    for tx in 0..cols.max(1) {
      let tb_col = mi_col + tx * (tw / 4).max(1);
      let tb_row = mi_row + ty * (th / 4).max(1);
      if tb_col >= mi_col + w4 || tb_row >= mi_row + h4 {
        continue;
      }
      let out = crate::coeffs::decode_coeffs(
        sd,
        ctx.coeff_cdfs,
        ctx.luma_ctx,
        PlaneType::Luma,
        tx_class,
        bwl,
        tw,
        th,
        bw_px,
        bh_px,
        tb_col,
        tb_row,
        (tw / 4).max(1),
        (th / 4).max(1),
        tx_size_ctx,
        br_tx_size_ctx,
        None,
      )?;
      outcome.luma_coeffs_decoded += out.eob as u32;
    }
  }

  let sub_x = ctx.params.subsampling_x;
  let sub_y = ctx.params.subsampling_y;
  if w4 > (1usize << sub_x) || h4 > (1usize << sub_y) || (w4 >= 2 && h4 >= 2) {
    let cw4 = (w4 >> sub_x).max(1);
    let ch4 = (h4 >> sub_y).max(1);
    let cbw_px = cw4 * 4;
    let cbh_px = ch4 * 4;
    let max_chroma_tx = MAX_TX_SIZE_RECT[BlockSize::from_wlog2_hlog2(
      cw4.trailing_zeros(),
      ch4.trailing_zeros(),
    )
    .map(|b| b as usize)
    .unwrap_or(0)] as usize;
    let chroma_tx = TxSize::from_index(max_chroma_tx).unwrap_or(TxSize::Tx4x4);
    let ctw = 1usize << chroma_tx.width_log2();
    let cth = 1usize << chroma_tx.height_log2();
    let chroma_tx_size_ctx = (TX_SIZE_SQR_UP[chroma_tx.index()] as usize).min(4);
    let chroma_br_tx_size_ctx = chroma_tx_size_ctx.min(3);
    let ccols = (cw4 * 4 / ctw.max(1)).max(1);
    let crows = (ch4 * 4 / cth.max(1)).max(1);
    for ty in 0..crows {
      for tx in 0..ccols {
        let tb_col = (mi_col >> sub_x) + tx * (ctw / 4).max(1);
        let tb_row = (mi_row >> sub_y) + ty * (cth / 4).max(1);
        let out = crate::coeffs::decode_coeffs(
          sd,
          ctx.coeff_cdfs,
          ctx.chroma_ctx,
          PlaneType::Chroma,
          TxClass::Class2D,
          chroma_tx.width_log2(),
          ctw,
          cth,
          cbw_px,
          cbh_px,
          tb_col,
          tb_row,
          (ctw / 4).max(1),
          (cth / 4).max(1),
          chroma_tx_size_ctx,
          chroma_br_tx_size_ctx,
          None,
        )?;
        outcome.chroma_coeffs_decoded += out.eob as u32;
      }
    }
  }

  Ok(())
}

fn is_directional(mode: u32) -> bool {
  (1..=8).contains(&mode)
}

fn use_filter_intra(bs: BlockSize, y_mode: u32) -> bool {
  y_mode == 0 && bs.wlog2() <= 3 && bs.hlog2() <= 3
}

fn size_group(bs: BlockSize) -> u32 {
  bs.wlog2().min(bs.hlog2())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cdf::{TileCoeffCdfs, TileModeCdfs, TilePartitionCdfs};

  #[test]
  fn decode_skip_block_does_not_touch_residual() {
    let params = TileParams::default();
    let mut mode_cdfs = TileModeCdfs::new(0);
    let mut coeff_cdfs = TileCoeffCdfs::new(0);
    let mut luma_ctx = CoeffContext::new(16, 16);
    let mut chroma_ctx = CoeffContext::new(16, 16);
    let mut grid = MiGrid::new(16, 16);
    let data = [0xFFu8; 16];
    let mut sd = SymbolDecoder::new(&data, false).unwrap();
    let mut ctx = BlockContext {
      params: &params,
      mode_cdfs: &mut mode_cdfs,
      coeff_cdfs: &mut coeff_cdfs,
      luma_ctx: &mut luma_ctx,
      chroma_ctx: &mut chroma_ctx,
    };
    let outcome = decode_block(&mut sd, &mut grid, &mut ctx, 0, 0, BlockSize::Block4x4).unwrap();
    assert_eq!(outcome.luma_coeffs_decoded == 0, outcome.skip);
    let _ = TilePartitionCdfs::new();
  }
}
