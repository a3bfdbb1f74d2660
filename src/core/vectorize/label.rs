//! Connected-component labeling over square tiles.
//!
//! Tiles are labeled independently in parallel, then regions touching across a tile
//! seam are merged with a union-find. Final ids follow raster-scan order of each
//! region's first pixel, so the result does not depend on the tile size.

use std::collections::VecDeque;

use ndarray::{Array2, ArrayView2, s};
use rayon::prelude::*;
use tracing::debug;

use crate::types::Connectivity;

/// Component ids per pixel; 0 is background, regions are numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub ids: Array2<u32>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy)]
struct Tile {
    row: usize,
    col: usize,
    rows: usize,
    cols: usize,
}

fn tiles(rows: usize, cols: usize, tile_size: usize) -> Vec<Tile> {
    let mut out = Vec::new();
    for row in (0..rows).step_by(tile_size) {
        for col in (0..cols).step_by(tile_size) {
            out.push(Tile {
                row,
                col,
                rows: tile_size.min(rows - row),
                cols: tile_size.min(cols - col),
            });
        }
    }
    out
}

/// Flood-fill labeling of one tile; returns local ids and how many were used.
fn label_tile(grid: ArrayView2<bool>, connectivity: Connectivity) -> (Array2<u32>, u32) {
    let (rows, cols) = grid.dim();
    let mut ids = Array2::<u32>::zeros((rows, cols));
    let mut next = 0u32;
    let mut queue = VecDeque::new();
    for r in 0..rows {
        for c in 0..cols {
            if !grid[[r, c]] || ids[[r, c]] != 0 {
                continue;
            }
            next += 1;
            ids[[r, c]] = next;
            queue.push_back((r, c));
            while let Some((pr, pc)) = queue.pop_front() {
                for &(dr, dc) in connectivity.offsets() {
                    let nr = pr as isize + dr;
                    let nc = pc as isize + dc;
                    if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                        continue;
                    }
                    let (nr, nc) = (nr as usize, nc as usize);
                    if grid[[nr, nc]] && ids[[nr, nc]] == 0 {
                        ids[[nr, nc]] = next;
                        queue.push_back((nr, nc));
                    }
                }
            }
        }
    }
    (ids, next)
}

struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
        }
    }

    fn find(&mut self, mut x: u32) -> u32 {
        while self.parent[x as usize] != x {
            let grand = self.parent[self.parent[x as usize] as usize];
            self.parent[x as usize] = grand;
            x = grand;
        }
        x
    }

    fn union(&mut self, a: u32, b: u32) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi as usize] = lo;
        }
    }
}

/// Label the true pixels of `grid`.
pub fn label_components(grid: &Array2<bool>, connectivity: Connectivity, tile_size: usize) -> Labels {
    let (rows, cols) = grid.dim();
    let tile_size = tile_size.max(1);
    let tiles = tiles(rows, cols, tile_size);

    let labeled: Vec<(Array2<u32>, u32)> = tiles
        .par_iter()
        .map(|t| {
            label_tile(
                grid.slice(s![t.row..t.row + t.rows, t.col..t.col + t.cols]),
                connectivity,
            )
        })
        .collect();

    let mut ids = Array2::<u32>::zeros((rows, cols));
    let mut offset = 0u32;
    for (tile, (local, count)) in tiles.iter().zip(labeled) {
        let mut dst = ids.slice_mut(s![
            tile.row..tile.row + tile.rows,
            tile.col..tile.col + tile.cols
        ]);
        dst.zip_mut_with(&local, |d, &l| {
            if l != 0 {
                *d = l + offset;
            }
        });
        offset += count;
    }

    let mut uf = UnionFind::new(offset as usize + 1);
    let spread: &[isize] = match connectivity {
        Connectivity::Four => &[0],
        Connectivity::Eight => &[-1, 0, 1],
    };
    // horizontal seams: row r-1 above, row r below
    for r in (tile_size..rows).step_by(tile_size) {
        for c in 0..cols {
            let above = ids[[r - 1, c]];
            if above == 0 {
                continue;
            }
            for &dc in spread {
                let nc = c as isize + dc;
                if nc >= 0 && (nc as usize) < cols {
                    let below = ids[[r, nc as usize]];
                    if below != 0 {
                        uf.union(above, below);
                    }
                }
            }
        }
    }
    // vertical seams: column c-1 left, column c right
    for c in (tile_size..cols).step_by(tile_size) {
        for r in 0..rows {
            let left = ids[[r, c - 1]];
            if left == 0 {
                continue;
            }
            for &dr in spread {
                let nr = r as isize + dr;
                if nr >= 0 && (nr as usize) < rows {
                    let right = ids[[nr as usize, c]];
                    if right != 0 {
                        uf.union(left, right);
                    }
                }
            }
        }
    }

    let mut remap = vec![0u32; offset as usize + 1];
    let mut count = 0u32;
    for id in ids.iter_mut() {
        if *id == 0 {
            continue;
        }
        let root = uf.find(*id) as usize;
        if remap[root] == 0 {
            count += 1;
            remap[root] = count;
        }
        *id = remap[root];
    }

    debug!(
        "Labeled {} regions over {} tiles ({} before seam merge)",
        count,
        tiles.len(),
        offset
    );
    Labels {
        ids,
        count: count as usize,
    }
}
