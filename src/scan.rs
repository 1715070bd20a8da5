// Copyright (c) 2024-2025, The tinyavif contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

// Builds the coefficient scan order for a transform block: the permutation
// from scan index to raster position that `coeffs.rs` walks in both
// directions (forward for coeff_base_eob/coeff_base, backward for coeff_br).

use crate::enums::TxClass;

/// Returns `scan[c] = row * width + col`, the raster position visited at
/// scan index `c`. 2D transforms use the up-right diagonal zigzag; HORIZ
/// and VERT classes fall back to row-major / column-major order, matching
/// the restriction that only DCT_DCT, V_DCT and H_DCT reach this kernel.
pub fn build_scan(tx_class: TxClass, width: usize, height: usize) -> Vec<u16> {
  let mut scan = Vec::with_capacity(width * height);

  match tx_class {
    TxClass::Vert => {
      for col in 0..width {
        for row in 0..height {
          scan.push((row * width + col) as u16);
        }
      }
    }
    TxClass::Horiz => {
      for row in 0..height {
        for col in 0..width {
          scan.push((row * width + col) as u16);
        }
      }
    }
    TxClass::Class2D => {
      let max_sum = width.saturating_add(height).saturating_sub(2);
      for sum in 0..=max_sum {
        if sum % 2 == 0 {
          // Even diagonal: walk bottom-up (decreasing row).
          let row_hi = sum.min(height.saturating_sub(1));
          let row_lo = sum.saturating_sub(width.saturating_sub(1));
          let mut row = row_hi;
          loop {
            let col = sum - row;
            scan.push((row * width + col) as u16);
            if row == row_lo {
              break;
            }
            row -= 1;
          }
        } else {
          // Odd diagonal: walk right-to-left (decreasing col).
          let col_hi = sum.min(width.saturating_sub(1));
          let col_lo = sum.saturating_sub(height.saturating_sub(1));
          let mut col = col_hi;
          loop {
            let row = sum - col;
            scan.push((row * width + col) as u16);
            if col == col_lo {
              break;
            }
            col -= 1;
          }
        }
      }
    }
  }

  scan
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scan_is_a_permutation() {
    for (w, h) in [(4usize, 4usize), (8, 4), (4, 8), (16, 16)] {
      for class in [TxClass::Class2D, TxClass::Horiz, TxClass::Vert] {
        let scan = build_scan(class, w, h);
        assert_eq!(scan.len(), w * h);
        let mut seen = vec![false; w * h];
        for &pos in &scan {
          let pos = pos as usize;
          assert!(!seen[pos], "position visited twice");
          seen[pos] = true;
        }
        assert!(seen.iter().all(|&b| b));
      }
    }
  }

  #[test]
  fn class_2d_4x4_matches_known_zigzag() {
    let scan = build_scan(TxClass::Class2D, 4, 4);
    // Default_Scan_4x4 from the AV1 spec.
    let expected: [u16; 16] = [0, 1, 4, 8, 5, 2, 3, 6, 9, 12, 13, 10, 7, 11, 14, 15];
    assert_eq!(scan, expected);
  }

  #[test]
  fn horiz_is_row_major() {
    let scan = build_scan(TxClass::Horiz, 3, 2);
    assert_eq!(scan, vec![0, 1, 2, 3, 4, 5]);
  }

  #[test]
  fn vert_is_column_major() {
    let scan = build_scan(TxClass::Vert, 3, 2);
    assert_eq!(scan, vec![0, 3, 1, 4, 2, 5]);
  }
}
