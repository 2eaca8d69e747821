use super::buffer::{any_blocks_endpoint_segment, any_touches_point, any_touches_segment, Blocker};
use crate::domains::path_planning::request::{CancelToken, EngineError};
use geo::Coord;
use ordered_float::OrderedFloat;
use petgraph::graph::{NodeIndex, UnGraph};

/// Endpoints link to free cells within this many cell widths.
const ENDPOINT_LINK_RADIUS: f64 = 2.0;

/// Forward half of the 8-neighbourhood; the other half is covered from the neighbour.
const FORWARD_NEIGHBOURS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (-1, 1)];

/// Visibility-checked grid graph between two planar endpoints.
pub struct SearchGrid {
    pub graph: UnGraph<Coord<f64>, f64>,
    pub source: NodeIndex,
    pub target: NodeIndex,
}

struct Lattice {
    origin: Coord<f64>,
    spacing: f64,
    cols: usize,
    rows: usize,
    cells: Vec<Option<NodeIndex>>,
}

impl Lattice {
    fn position(&self, col: usize, row: usize) -> Coord<f64> {
        Coord {
            x: self.origin.x + col as f64 * self.spacing,
            y: self.origin.y + row as f64 * self.spacing,
        }
    }

    fn node(&self, col: isize, row: isize) -> Option<NodeIndex> {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return None;
        }
        self.cells[row as usize * self.cols + col as usize]
    }
}

fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Lay a lattice of cell centers over the padded bounding box of both endpoints
/// and all blockers, drop cells touching a blocker and connect the rest.
pub fn build(
    source: Coord<f64>,
    target: Coord<f64>,
    blockers: &[Blocker],
    spacing: f64,
    padding: f64,
    max_cells: usize,
    cancel: &CancelToken,
) -> Result<SearchGrid, EngineError> {
    let (mut min, mut max) = (
        Coord { x: source.x.min(target.x), y: source.y.min(target.y) },
        Coord { x: source.x.max(target.x), y: source.y.max(target.y) },
    );
    for blocker in blockers {
        let bounds = blocker.bounds();
        min.x = min.x.min(bounds.min().x);
        min.y = min.y.min(bounds.min().y);
        max.x = max.x.max(bounds.max().x);
        max.y = max.y.max(bounds.max().y);
    }
    let pad_x = ((max.x - min.x) * padding).max(spacing);
    let pad_y = ((max.y - min.y) * padding).max(spacing);
    let origin = Coord { x: min.x - pad_x, y: min.y - pad_y };

    let cols_f = ((max.x - min.x + 2.0 * pad_x) / spacing).floor() + 1.0;
    let rows_f = ((max.y - min.y + 2.0 * pad_y) / spacing).floor() + 1.0;
    let cell_count = cols_f * rows_f;
    if !cell_count.is_finite() || cell_count > max_cells as f64 {
        return Err(EngineError::InvalidParameter(format!(
            "resolution of {} m needs {:.0} grid cells, the limit is {}",
            spacing, cell_count, max_cells
        )));
    }

    let mut lattice = Lattice {
        origin,
        spacing,
        cols: cols_f as usize,
        rows: rows_f as usize,
        cells: vec![None; cols_f as usize * rows_f as usize],
    };
    let mut graph: UnGraph<Coord<f64>, f64> =
        UnGraph::with_capacity(lattice.cells.len() + 2, lattice.cells.len() * 4);

    for row in 0..lattice.rows {
        cancel.check()?;
        for col in 0..lattice.cols {
            let position = lattice.position(col, row);
            if !any_touches_point(blockers, position) {
                lattice.cells[row * lattice.cols + col] = Some(graph.add_node(position));
            }
        }
    }

    for row in 0..lattice.rows as isize {
        cancel.check()?;
        for col in 0..lattice.cols as isize {
            let Some(from) = lattice.node(col, row) else {
                continue;
            };
            for (dc, dr) in FORWARD_NEIGHBOURS {
                let Some(to) = lattice.node(col + dc, row + dr) else {
                    continue;
                };
                let (a, b) = (graph[from], graph[to]);
                if !any_touches_segment(blockers, a, b) {
                    graph.add_edge(from, to, distance(a, b));
                }
            }
        }
    }

    let source_node = graph.add_node(source);
    link_endpoint(&mut graph, &lattice, blockers, source_node);
    let target_node = graph.add_node(target);
    link_endpoint(&mut graph, &lattice, blockers, target_node);

    tracing::debug!(
        cols = lattice.cols,
        rows = lattice.rows,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "search grid built"
    );

    Ok(SearchGrid {
        graph,
        source: source_node,
        target: target_node,
    })
}

fn link_endpoint(
    graph: &mut UnGraph<Coord<f64>, f64>,
    lattice: &Lattice,
    blockers: &[Blocker],
    endpoint: NodeIndex,
) {
    let position = graph[endpoint];
    let reach = ENDPOINT_LINK_RADIUS * lattice.spacing;
    let col = ((position.x - lattice.origin.x) / lattice.spacing).floor() as isize;
    let row = ((position.y - lattice.origin.y) / lattice.spacing).floor() as isize;
    let span = ENDPOINT_LINK_RADIUS.ceil() as isize;

    let mut candidates: Vec<(OrderedFloat<f64>, NodeIndex)> = Vec::new();
    for r in row - span..=row + span + 1 {
        for c in col - span..=col + span + 1 {
            let Some(cell) = lattice.node(c, r) else {
                continue;
            };
            let d = distance(position, graph[cell]);
            if d <= reach && !any_blocks_endpoint_segment(blockers, position, graph[cell]) {
                candidates.push((OrderedFloat(d), cell));
            }
        }
    }
    candidates.sort();
    for (d, cell) in candidates {
        graph.add_edge(endpoint, cell, d.into_inner());
    }
}
