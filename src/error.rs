// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Error taxonomy for the tile-syntax decoder kernel.

use thiserror::Error;

/// Conceptual error kinds produced while decoding one tile.
///
/// Every decoding operation is fallible; failures propagate upward
/// immediately and never leave partial side effects that a caller could
/// mistake for a valid result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
  #[error("truncated bitstream at bit {bitpos}: {detail}")]
  Truncated { bitpos: u64, detail: String },

  #[error("invalid container state: {0}")]
  InvalidContainer(String),

  #[error("unsupported feature: {0}")]
  UnsupportedFeature(String),

  #[error("invalid cdf at {where_}: {detail}")]
  InvalidCdf { where_: String, detail: String },

  #[error("invalid symbol {symbol} in {where_}: {detail}")]
  InvalidSymbol {
    where_: String,
    symbol: u32,
    detail: String,
  },

  #[error("invalid context {context} in {where_}")]
  InvalidContext { where_: String, context: u32 },

  #[error("internal invariant failure: {0}")]
  Internal(String),
}

/// Crate-wide result alias, matching the shape other AVIF-domain crates use
/// for their own parser error enums.
pub type Result<T> = std::result::Result<T, DecodeError>;
