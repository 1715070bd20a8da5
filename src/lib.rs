// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! AV1 tile-syntax decoder kernel: the adaptive binary arithmetic decoder,
//! CDF tables, partition tree walker, block syntax decoder and coefficient
//! decoder needed to walk one AV1 tile's entropy-coded bitstream and
//! recover its syntax elements. Deliberately stops short of pixel
//! reconstruction, inter-frame coding, multi-tile scheduling and
//! profile > 0 features.

pub mod bitreader;
pub mod block;
pub mod cdf;
pub mod coeff_context;
pub mod coeffs;
pub mod enums;
pub mod error;
pub mod mi_grid;
pub mod params;
pub mod partition;
pub mod probe;
pub mod scan;
pub mod symbol;
pub mod tables;

pub use error::{DecodeError, Result};
pub use params::TileParams;
pub use probe::{probe_tile, ProbeOptions, TileDecodeStatus, TileSyntaxProbeStats};
