//! Pixel-edge boundary tracing.
//!
//! Every labeled pixel contributes the sides it does not share with a pixel of the same
//! region. Sides are oriented with the region on the right (y grows downward), so
//! exterior rings come out with positive shoelace area and holes negative. At a vertex
//! shared by diagonal pixels the walk turns right; a ring that still revisits a vertex
//! is split there so every ring stays simple.

use std::collections::HashMap;

use geo::{Contains, Coord, LineString, Point, Polygon};
use rayon::prelude::*;

use super::label::Labels;

type Vertex = (i64, i64);
type Dir = (i64, i64);

#[derive(Debug, Clone, Copy)]
struct Edge {
    from: Vertex,
    dir: Dir,
}

/// Closed ring of pixel-corner vertices without the repeated closing vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    pub vertices: Vec<Vertex>,
}

impl Ring {
    /// Shoelace area in pixel units; positive for exteriors.
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        let twice: i64 = (0..n)
            .map(|i| {
                let (x0, y0) = self.vertices[i];
                let (x1, y1) = self.vertices[(i + 1) % n];
                x0 * y1 - x1 * y0
            })
            .sum();
        twice as f64 / 2.0
    }

    pub fn to_line_string(&self) -> LineString<f64> {
        let mut coords: Vec<Coord<f64>> = self
            .vertices
            .iter()
            .map(|&(x, y)| Coord {
                x: x as f64,
                y: y as f64,
            })
            .collect();
        if let Some(&first) = coords.first() {
            coords.push(first);
        }
        LineString::new(coords)
    }

    /// Center of the pixel on the left of the first side: outside the region for an
    /// exterior, inside the hole for a hole.
    fn left_pixel_center(&self) -> Point<f64> {
        let (x0, y0) = self.vertices[0];
        let (x1, y1) = self.vertices[1];
        let (dx, dy) = ((x1 - x0).signum() as f64, (y1 - y0).signum() as f64);
        let (mx, my) = (x0 as f64 + dx * 0.5, y0 as f64 + dy * 0.5);
        Point::new(mx + dy * 0.5, my - dx * 0.5)
    }
}

/// One region as polygons in pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct TracedRegion {
    pub id: u32,
    pub pixel_count: usize,
    pub polygons: Vec<Polygon<f64>>,
}

fn right_of(d: Dir) -> Dir {
    (-d.1, d.0)
}

fn left_of(d: Dir) -> Dir {
    (d.1, -d.0)
}

fn collect_edges(labels: &Labels) -> (Vec<Vec<Edge>>, Vec<usize>) {
    let (rows, cols) = labels.ids.dim();
    let mut edges = vec![Vec::new(); labels.count + 1];
    let mut pixels = vec![0usize; labels.count + 1];
    let ids = &labels.ids;
    for r in 0..rows {
        for c in 0..cols {
            let id = ids[[r, c]];
            if id == 0 {
                continue;
            }
            pixels[id as usize] += 1;
            let (x, y) = (c as i64, r as i64);
            let list = &mut edges[id as usize];
            if r == 0 || ids[[r - 1, c]] != id {
                list.push(Edge { from: (x, y), dir: (1, 0) });
            }
            if c + 1 == cols || ids[[r, c + 1]] != id {
                list.push(Edge { from: (x + 1, y), dir: (0, 1) });
            }
            if r + 1 == rows || ids[[r + 1, c]] != id {
                list.push(Edge { from: (x + 1, y + 1), dir: (-1, 0) });
            }
            if c == 0 || ids[[r, c - 1]] != id {
                list.push(Edge { from: (x, y + 1), dir: (0, -1) });
            }
        }
    }
    (edges, pixels)
}

fn link_rings(edges: &[Edge]) -> Vec<Ring> {
    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::with_capacity(edges.len());
    for (i, e) in edges.iter().enumerate() {
        outgoing.entry(e.from).or_default().push(i);
    }
    let mut used = vec![false; edges.len()];
    let mut rings = Vec::new();

    for start in 0..edges.len() {
        if used[start] {
            continue;
        }
        let mut vertices = Vec::new();
        let mut current = start;
        let mut prev_dir: Option<Dir> = None;
        loop {
            used[current] = true;
            let e = edges[current];
            if prev_dir != Some(e.dir) {
                vertices.push(e.from);
            }
            prev_dir = Some(e.dir);
            let at = (e.from.0 + e.dir.0, e.from.1 + e.dir.1);
            let candidates = outgoing.get(&at).map(Vec::as_slice).unwrap_or(&[]);
            let pick = [right_of(e.dir), e.dir, left_of(e.dir)]
                .iter()
                .find_map(|d| candidates.iter().copied().find(|&i| edges[i].dir == *d));
            match pick {
                Some(next) if next != start && !used[next] => current = next,
                _ => break,
            }
        }
        // first vertex is redundant when the ring closes on a straight run
        if prev_dir == Some(edges[start].dir) && vertices.len() > 1 {
            vertices.remove(0);
        }
        rings.extend(
            split_at_pinches(vertices)
                .into_iter()
                .filter(|part| part.len() >= 4)
                .map(|vertices| Ring { vertices }),
        );
    }
    rings
}

/// Cut a closed vertex walk into loops that each visit a vertex once.
fn split_at_pinches(vertices: Vec<Vertex>) -> Vec<Vec<Vertex>> {
    let mut parts = Vec::new();
    let mut stack: Vec<Vertex> = Vec::with_capacity(vertices.len());
    let mut seen: HashMap<Vertex, usize> = HashMap::new();
    for v in vertices {
        if let Some(&pos) = seen.get(&v) {
            let part: Vec<Vertex> = stack.drain(pos..).collect();
            for u in &part {
                seen.remove(u);
            }
            parts.push(part);
        }
        seen.insert(v, stack.len());
        stack.push(v);
    }
    parts.push(stack);
    parts
}

/// Group rings into polygons: each hole goes to the smallest exterior containing it.
fn assemble(rings: Vec<Ring>) -> Vec<Polygon<f64>> {
    let (exteriors, holes): (Vec<Ring>, Vec<Ring>) =
        rings.into_iter().partition(|r| r.signed_area() > 0.0);
    let shells: Vec<Polygon<f64>> = exteriors
        .iter()
        .map(|r| Polygon::new(r.to_line_string(), vec![]))
        .collect();
    let areas: Vec<f64> = exteriors.iter().map(Ring::signed_area).collect();
    let mut interiors: Vec<Vec<LineString<f64>>> = vec![Vec::new(); shells.len()];
    for hole in holes {
        let inside = hole.left_pixel_center();
        let owner = shells
            .iter()
            .enumerate()
            .filter(|(_, shell)| shell.contains(&inside))
            .min_by(|a, b| areas[a.0].total_cmp(&areas[b.0]))
            .map(|(i, _)| i);
        if let Some(i) = owner {
            interiors[i].push(hole.to_line_string());
        }
    }
    shells
        .into_iter()
        .zip(interiors)
        .map(|(shell, holes)| {
            let (exterior, _) = shell.into_inner();
            Polygon::new(exterior, holes)
        })
        .collect()
}

/// Trace every labeled region into pixel-space polygons, ordered by region id.
pub fn trace_regions(labels: &Labels) -> Vec<TracedRegion> {
    let (edges, pixels) = collect_edges(labels);
    edges
        .into_par_iter()
        .enumerate()
        .skip(1)
        .map(|(id, region_edges)| TracedRegion {
            id: id as u32,
            pixel_count: pixels[id],
            polygons: assemble(link_rings(&region_edges)),
        })
        .collect()
}
