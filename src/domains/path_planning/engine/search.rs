use super::grid::SearchGrid;
use geo::Coord;
use petgraph::algo::astar;
use petgraph::visit::EdgeRef;

/// A* over the grid graph with a straight-line heuristic.
pub fn shortest_route(grid: &SearchGrid) -> Option<Vec<Coord<f64>>> {
    let goal = grid.graph[grid.target];
    let (_, nodes) = astar(
        &grid.graph,
        grid.source,
        |n| n == grid.target,
        |e| *e.weight(),
        |n| {
            let c = grid.graph[n];
            (c.x - goal.x).hypot(c.y - goal.y)
        },
    )?;
    Some(nodes.into_iter().map(|n| grid.graph[n]).collect())
}

/// Drop repeated vertices and vertices lying on the straight line between their neighbours.
pub fn clean_coords(coords: Vec<Coord<f64>>) -> Vec<Coord<f64>> {
    let mut cleaned: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    for c in coords {
        if cleaned.last() == Some(&c) {
            continue;
        }
        while cleaned.len() >= 2 {
            let a = cleaned[cleaned.len() - 2];
            let b = cleaned[cleaned.len() - 1];
            if is_between(a, b, c) {
                cleaned.pop();
            } else {
                break;
            }
        }
        cleaned.push(c);
    }
    cleaned
}

fn is_between(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>) -> bool {
    let (ab, bc) = (b - a, c - b);
    let cross = ab.x * bc.y - ab.y * bc.x;
    let dot = ab.x * bc.x + ab.y * bc.y;
    let scale = ab.x.hypot(ab.y) * bc.x.hypot(bc.y);
    dot > 0.0 && cross.abs() <= scale * 1e-12
}
