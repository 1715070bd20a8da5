// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// CLI driver: reads a raw tile payload off disk, decodes its syntax, and
// prints the resulting probe stats.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use av1_tile_kernel::params::TileParams;
use av1_tile_kernel::probe::{probe_tile, ProbeOptions, TileDecodeStatus};

/// Decodes one AV1 tile's entropy-coded syntax and reports probe stats.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
  /// Path to the raw tile payload (the tile_group_obu's per-tile bytes).
  tile_path: String,

  #[arg(long, default_value_t = 32)]
  mi_cols: u32,

  #[arg(long, default_value_t = 32)]
  mi_rows: u32,

  #[arg(long, default_value_t = 4)]
  sb_size_log2: u32,

  #[arg(long, default_value_t = 60)]
  base_q_idx: u32,

  #[arg(long)]
  segmentation_enabled: bool,

  #[arg(long)]
  reduced_tx_set: bool,

  #[arg(long)]
  disable_cdf_update: bool,

  #[arg(long)]
  try_exit_symbol: bool,
}

/// Distinguishes a well-defined scope gap from a hard decode failure in the
/// process exit code, per the CLI's `ERROR`/`UNSUPPORTED` contract.
const EXIT_UNSUPPORTED: u8 = 2;

fn run() -> av1_tile_kernel::Result<ExitCode> {
  env_logger::init();
  let cli = Cli::parse();

  let data = fs::read(&cli.tile_path).map_err(|e| {
    av1_tile_kernel::DecodeError::InvalidContainer(format!("reading {}: {e}", cli.tile_path))
  })?;

  let params = TileParams {
    mi_cols: cli.mi_cols,
    mi_rows: cli.mi_rows,
    sb_size_log2: cli.sb_size_log2,
    base_q_idx: cli.base_q_idx,
    segmentation_enabled: cli.segmentation_enabled,
    reduced_tx_set: cli.reduced_tx_set,
    disable_cdf_update: cli.disable_cdf_update,
    ..Default::default()
  };

  let options = ProbeOptions { try_exit_symbol: cli.try_exit_symbol };
  let stats = probe_tile(&data, &params, options)?;
  println!("{stats:#?}");
  match &stats.status {
    TileDecodeStatus::Ok => Ok(ExitCode::SUCCESS),
    TileDecodeStatus::Unsupported(detail) => {
      eprintln!("unsupported: {detail}");
      Ok(ExitCode::from(EXIT_UNSUPPORTED))
    }
  }
}

fn main() -> ExitCode {
  match run() {
    Ok(code) => code,
    Err(e) => {
      error!("{e}");
      eprintln!("error: {e}");
      ExitCode::FAILURE
    }
  }
}
