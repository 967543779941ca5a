//! Decimation of a fine frequency-bin series down to what the plot can show.
//!
//! Two reductions live here and they deliberately differ:
//! - log axis: an octave pyramid (`LogBinTree` -> `RebinPlan`) reduced by max,
//!   so narrow peaks at high frequency stay visible;
//! - linear axis: uniform blocks (`BlockPlan`) reduced by mean.

use crate::constants::{LOWEST_EDGE_HZ, MAX_REBIN_LEVELS, MIN_BIN_WIDTH_PX};
use anyhow::{bail, Result};

/// Left/right edges of every bin, in data or screen units.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BinEdges {
    pub x1: Vec<f32>,
    pub x2: Vec<f32>,
}

impl BinEdges {
    pub fn new(x1: Vec<f32>, x2: Vec<f32>) -> Result<Self> {
        if x1.len() != x2.len() {
            bail!("edge sequences differ in length ({} vs {})", x1.len(), x2.len());
        }
        Ok(Self { x1, x2 })
    }

    /// Derives edges from bin centres: each inner edge sits halfway between
    /// two centres, the first bin starts just above 0 Hz and the last one
    /// ends at `nyquist`.
    pub fn from_centers(centers: &[f32], nyquist: f32) -> Self {
        let n = centers.len();
        let mut x1 = Vec::with_capacity(n);
        let mut x2 = Vec::with_capacity(n);
        if n == 0 {
            return Self { x1, x2 };
        }

        x1.push(LOWEST_EDGE_HZ);
        x1.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
        x2.extend_from_slice(&x1[1..]);
        x2.push(nyquist);

        Self { x1, x2 }
    }

    pub fn len(&self) -> usize {
        self.x1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x1.is_empty()
    }

    pub fn width(&self, i: usize) -> f32 {
        self.x2[i] - self.x1[i]
    }

    pub fn clear(&mut self) {
        self.x1.clear();
        self.x2.clear();
    }
}

/// Split offsets of the octave pyramid in original bin index space.
///
/// Level `i` spans `splits[i]..splits[i + 1]` and groups `2^i` original bins
/// into one displayed bin. A level may be empty, in which case two
/// consecutive offsets are equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebinPlan {
    splits: Vec<usize>,
    output_len: usize,
}

impl RebinPlan {
    /// Builds a plan from raw split offsets, checking that every level
    /// divides evenly into its group size.
    pub fn from_splits(splits: Vec<usize>) -> Result<Self> {
        if splits.first() != Some(&0) {
            bail!("rebin plan must start at offset 0");
        }
        if splits.len() > MAX_REBIN_LEVELS + 1 {
            bail!(
                "rebin plan has {} levels, limit is {}",
                splits.len() - 1,
                MAX_REBIN_LEVELS
            );
        }
        let mut output_len = 0;
        for (level, w) in splits.windows(2).enumerate() {
            if w[1] < w[0] {
                bail!("rebin split offsets must not decrease ({} -> {})", w[0], w[1]);
            }
            let group = 1usize << level;
            let segment = w[1] - w[0];
            if segment % group != 0 {
                bail!("level {} spans {} bins, not a multiple of {}", level, segment, group);
            }
            output_len += segment / group;
        }
        Ok(Self { splits, output_len })
    }

    pub fn splits(&self) -> &[usize] {
        &self.splits
    }

    pub fn levels(&self) -> usize {
        self.splits.len() - 1
    }

    /// Number of displayed bins (`N`).
    pub fn output_len(&self) -> usize {
        self.output_len
    }

    /// Number of original bins the plan consumes.
    pub fn source_len(&self) -> usize {
        self.splits.last().copied().unwrap_or(0)
    }

    /// Reduces `raw` level by level, keeping the maximum of each group.
    pub fn reduce_max(&self, raw: &[f32], out: &mut Vec<f32>) -> Result<()> {
        if raw.len() != self.source_len() {
            bail!(
                "magnitude series has {} bins, rebin plan expects {}",
                raw.len(),
                self.source_len()
            );
        }

        out.clear();
        for (level, w) in self.splits.windows(2).enumerate() {
            let group = 1usize << level;
            out.extend(
                raw[w[0]..w[1]]
                    .chunks_exact(group)
                    .map(|g| g.iter().copied().fold(f32::NEG_INFINITY, f32::max)),
            );
        }
        Ok(())
    }
}

/// Builds octave pyramid plans. Holds scratch buffers so that rebuilding on
/// every resize does not reallocate.
#[derive(Debug, Default)]
pub struct LogBinTree {
    cur: BinEdges,
    next: BinEdges,
}

impl LogBinTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the plan for screen-space `edges` and writes the merged edges
    /// of every displayed bin into `merged`.
    pub fn build_plan(&mut self, edges: &BinEdges, merged: &mut BinEdges) -> Result<RebinPlan> {
        merged.clear();
        self.cur.clear();
        self.cur.x1.extend_from_slice(&edges.x1);
        self.cur.x2.extend_from_slice(&edges.x2);

        let mut splits = vec![0];
        let mut offset = 0usize;
        let mut level = 0usize;

        while !self.cur.is_empty() {
            if level >= MAX_REBIN_LEVELS {
                bail!(
                    "octave pyramid exceeded {} levels for {} bins",
                    MAX_REBIN_LEVELS,
                    edges.len()
                );
            }

            let len = self.cur.len();
            // bins wider than half a pixel stay as they are
            let mut n0 = (0..len)
                .rev()
                .find(|&k| self.cur.width(k) >= MIN_BIN_WIDTH_PX)
                .map_or(0, |k| k + 1);
            // the tail must pair up evenly
            n0 += (len - n0) % 2;

            merged.x1.extend_from_slice(&self.cur.x1[..n0]);
            merged.x2.extend_from_slice(&self.cur.x2[..n0]);

            offset += n0 << level;
            splits.push(offset);

            self.next.clear();
            self.next
                .x1
                .extend(self.cur.x1[n0..].iter().step_by(2).copied());
            self.next
                .x2
                .extend(self.cur.x2[n0..].iter().skip(1).step_by(2).copied());
            std::mem::swap(&mut self.cur, &mut self.next);

            level += 1;
        }

        let plan = RebinPlan::from_splits(splits)?;
        debug_assert_eq!(plan.output_len(), merged.len());
        debug_assert_eq!(plan.source_len(), edges.len());
        Ok(plan)
    }
}

/// Uniform block decimation for a linear frequency axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPlan {
    offset: usize,
    block: usize,
    source_len: usize,
}

impl BlockPlan {
    pub fn new(source_len: usize, block: usize) -> Self {
        let block = block.max(1);
        Self {
            offset: source_len % block,
            block,
            source_len,
        }
    }

    /// Picks the block size so that one block covers about one pixel.
    pub fn from_edges(edges: &BinEdges) -> Self {
        let width = match edges.len() {
            0 => 0.0,
            1 => edges.width(0),
            _ => edges.width(1),
        };
        let block = if width.is_finite() && width > 0.0 {
            (1.0 / width).floor() as usize
        } else {
            1
        };
        Self::new(edges.len(), block)
    }

    pub fn block(&self) -> usize {
        self.block
    }

    /// Bins dropped from the front so the rest divides into whole blocks.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn output_len(&self) -> usize {
        (self.source_len - self.offset) / self.block
    }

    pub fn decimate_edges(&self, edges: &BinEdges, out: &mut BinEdges) {
        out.clear();
        for j in 0..self.output_len() {
            let first = self.offset + j * self.block;
            out.x1.push(edges.x1[first]);
            out.x2.push(edges.x2[first + self.block - 1]);
        }
    }

    /// Averages each block of `raw`.
    pub fn reduce_mean(&self, raw: &[f32], out: &mut Vec<f32>) -> Result<()> {
        if raw.len() != self.source_len {
            bail!(
                "magnitude series has {} bins, block plan expects {}",
                raw.len(),
                self.source_len
            );
        }

        out.clear();
        let scale = 1.0 / self.block as f32;
        out.extend(
            raw[self.offset..]
                .chunks_exact(self.block)
                .map(|b| b.iter().sum::<f32>() * scale),
        );
        Ok(())
    }
}

/// The cached decimation for the current axis mode.
#[derive(Debug, Clone, PartialEq)]
pub enum Decimation {
    Tree(RebinPlan),
    Block(BlockPlan),
}

impl Decimation {
    pub fn output_len(&self) -> usize {
        match self {
            Decimation::Tree(plan) => plan.output_len(),
            Decimation::Block(plan) => plan.output_len(),
        }
    }

    pub fn reduce(&self, raw: &[f32], out: &mut Vec<f32>) -> Result<()> {
        match self {
            Decimation::Tree(plan) => plan.reduce_max(raw, out),
            Decimation::Block(plan) => plan.reduce_mean(raw, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edges_from_widths(widths: &[f32]) -> BinEdges {
        let mut x1 = Vec::new();
        let mut x2 = Vec::new();
        let mut x = 0.0f32;
        for &w in widths {
            x1.push(x);
            x += w;
            x2.push(x);
        }
        BinEdges { x1, x2 }
    }

    fn log_spaced_edges(bins: usize, pixels: f32) -> BinEdges {
        // FFT bins are linear in Hz, so on a log axis their pixel width shrinks
        let decades = (bins as f32).log10();
        let px = |i: usize| (i as f32).max(0.5).log10() / decades * pixels;
        BinEdges {
            x1: (0..bins).map(px).collect(),
            x2: (1..=bins).map(px).collect(),
        }
    }

    #[test]
    fn test_from_centers_places_edges_between_centres() {
        let e = BinEdges::from_centers(&[0.0, 100.0, 200.0, 300.0], 400.0);
        assert_eq!(e.x1, vec![LOWEST_EDGE_HZ, 50.0, 150.0, 250.0]);
        assert_eq!(e.x2, vec![50.0, 150.0, 250.0, 400.0]);
    }

    #[test]
    fn test_from_centers_empty() {
        assert!(BinEdges::from_centers(&[], 24000.0).is_empty());
    }

    #[test]
    fn test_build_plan_groups_one_one_two_four() {
        // two wide bins, a pair that is only wide once merged, then four narrow bins
        let edges = edges_from_widths(&[1.0, 1.0, 0.3, 0.3, 0.1, 0.1, 0.1, 0.1]);
        let mut tree = LogBinTree::new();
        let mut merged = BinEdges::default();
        let plan = tree.build_plan(&edges, &mut merged).unwrap();

        assert_eq!(plan.splits(), &[0, 2, 4, 8]);
        assert_eq!(plan.output_len(), 4);
        assert_eq!(merged.len(), 4);
        assert!((merged.x1[2] - 2.0).abs() < 1e-5);
        assert!((merged.x2[2] - 2.6).abs() < 1e-5);
        assert!((merged.x1[3] - 2.6).abs() < 1e-5);
        assert!((merged.x2[3] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_reduce_max_keeps_group_maximum() {
        let plan = RebinPlan::from_splits(vec![0, 2, 4, 8]).unwrap();
        let raw = [-10.0, -20.0, -30.0, -5.0, -40.0, -1.0, -50.0, -60.0];
        let mut out = Vec::new();
        plan.reduce_max(&raw, &mut out).unwrap();
        assert_eq!(out, vec![-10.0, -20.0, -5.0, -1.0]);
    }

    #[test]
    fn test_output_len_matches_reduce_len() {
        let edges = log_spaced_edges(2048, 600.0);
        let mut tree = LogBinTree::new();
        let mut merged = BinEdges::default();
        let plan = tree.build_plan(&edges, &mut merged).unwrap();

        let raw: Vec<f32> = (0..2048).map(|i| -(i as f32 % 97.0)).collect();
        let mut out = Vec::new();
        plan.reduce_max(&raw, &mut out).unwrap();

        assert_eq!(out.len(), plan.output_len());
        assert_eq!(merged.len(), plan.output_len());
        assert_eq!(plan.source_len(), 2048);
        assert!(plan.output_len() < 2048);
    }

    #[test]
    fn test_build_plan_is_deterministic() {
        let edges = log_spaced_edges(1024, 400.0);
        let mut tree = LogBinTree::new();
        let mut merged_a = BinEdges::default();
        let mut merged_b = BinEdges::default();
        let a = tree.build_plan(&edges, &mut merged_a).unwrap();
        let b = tree.build_plan(&edges, &mut merged_b).unwrap();
        assert_eq!(a, b);
        assert_eq!(merged_a, merged_b);
    }

    #[test]
    fn test_merged_bins_reach_half_a_pixel() {
        let edges = log_spaced_edges(4096, 800.0);
        let mut tree = LogBinTree::new();
        let mut merged = BinEdges::default();
        let plan = tree.build_plan(&edges, &mut merged).unwrap();
        assert!(plan.levels() > 1);
        // the last displayed bin spans the top of the axis
        assert!((merged.x2[merged.len() - 1] - 800.0).abs() < 1e-2);
    }

    #[test]
    fn test_all_narrow_bins_terminate() {
        let edges = edges_from_widths(&[0.1; 5]);
        let mut tree = LogBinTree::new();
        let mut merged = BinEdges::default();
        let plan = tree.build_plan(&edges, &mut merged).unwrap();

        assert_eq!(plan.splits(), &[0, 1, 1, 5]);
        assert_eq!(plan.output_len(), 2);

        let mut out = Vec::new();
        plan.reduce_max(&[1.0, 2.0, 3.0, 4.0, 5.0], &mut out).unwrap();
        assert_eq!(out, vec![1.0, 5.0]);
    }

    #[test]
    fn test_single_narrow_bin() {
        let edges = edges_from_widths(&[0.01]);
        let mut tree = LogBinTree::new();
        let mut merged = BinEdges::default();
        let plan = tree.build_plan(&edges, &mut merged).unwrap();
        assert_eq!(plan.splits(), &[0, 1]);
        assert_eq!(plan.output_len(), 1);
    }

    #[test]
    fn test_empty_edges_give_empty_plan() {
        let mut tree = LogBinTree::new();
        let mut merged = BinEdges::default();
        let plan = tree.build_plan(&BinEdges::default(), &mut merged).unwrap();
        assert_eq!(plan.splits(), &[0]);
        assert_eq!(plan.output_len(), 0);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_reduce_rejects_wrong_length() {
        let plan = RebinPlan::from_splits(vec![0, 2, 4]).unwrap();
        let mut out = Vec::new();
        assert!(plan.reduce_max(&[0.0; 3], &mut out).is_err());
    }

    #[test]
    fn test_from_splits_rejects_uneven_level() {
        assert!(RebinPlan::from_splits(vec![0, 2, 5]).is_err());
        assert!(RebinPlan::from_splits(vec![1, 2]).is_err());
    }

    #[test]
    fn test_block_mean_drops_front_remainder() {
        let edges = edges_from_widths(&[0.3; 10]);
        let plan = BlockPlan::from_edges(&edges);
        assert_eq!(plan.block(), 3);
        assert_eq!(plan.offset(), 1);
        assert_eq!(plan.output_len(), 3);

        let raw: Vec<f32> = (1..=10).map(|v| v as f32).collect();
        let mut out = Vec::new();
        plan.reduce_mean(&raw, &mut out).unwrap();
        assert_eq!(out.len(), 3);
        for (got, want) in out.iter().zip([3.0, 6.0, 9.0]) {
            assert!((got - want).abs() < 1e-5, "{} != {}", got, want);
        }

        let mut decimated = BinEdges::default();
        plan.decimate_edges(&edges, &mut decimated);
        assert_eq!(decimated.len(), 3);
        assert!((decimated.x1[0] - 0.3).abs() < 1e-5);
        assert!((decimated.x2[0] - 1.2).abs() < 1e-5);
        assert!((decimated.x2[2] - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_wide_bins_are_not_blocked() {
        let edges = edges_from_widths(&[2.0; 6]);
        let plan = BlockPlan::from_edges(&edges);
        assert_eq!(plan.block(), 1);
        assert_eq!(plan.offset(), 0);
        assert_eq!(plan.output_len(), 6);
    }

    #[test]
    fn test_zero_width_bins_fall_back_to_identity() {
        let edges = edges_from_widths(&[0.0; 4]);
        let plan = BlockPlan::from_edges(&edges);
        assert_eq!(plan.block(), 1);
        assert_eq!(plan.output_len(), 4);
    }

    #[test]
    fn test_block_wider_than_series_displays_nothing() {
        // 1/16 px per bin asks for blocks of 16 bins
        let edges = edges_from_widths(&[0.0625; 10]);
        let plan = BlockPlan::from_edges(&edges);
        assert_eq!(plan.block(), 16);
        assert_eq!(plan.output_len(), 0);

        let mut out = vec![1.0];
        plan.reduce_mean(&[-20.0; 10], &mut out).unwrap();
        assert!(out.is_empty());

        let mut decimated = BinEdges::default();
        plan.decimate_edges(&edges, &mut decimated);
        assert!(decimated.is_empty());
    }

    #[test]
    fn test_decimation_modes_use_different_reductions() {
        let raw = [0.0, 4.0, 2.0, 6.0];
        let mut out = Vec::new();

        Decimation::Tree(RebinPlan::from_splits(vec![0, 0, 4]).unwrap())
            .reduce(&raw, &mut out)
            .unwrap();
        assert_eq!(out, vec![4.0, 6.0]);

        Decimation::Block(BlockPlan::new(4, 2))
            .reduce(&raw, &mut out)
            .unwrap();
        assert_eq!(out, vec![2.0, 4.0]);
    }
}
