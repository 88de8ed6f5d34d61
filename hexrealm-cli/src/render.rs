//! ASCII rendering of a tile graph
//!
//! Rows follow the `r` axis (north-east up), columns use doubled width so
//! neighboring rows interleave like the hex layout.

use hexrealm_core::{TileGraph, TileKindId};

/// Map character for a tile kind
pub fn glyph(kind: TileKindId) -> char {
    match kind {
        TileKindId::Empty => '.',
        TileKindId::Forest => 't',
        TileKindId::Mountain => 'M',
        TileKindId::Lake => 'o',
        TileKindId::Ocean => '~',
        TileKindId::DeepOcean => ' ',
        TileKindId::Ruins => 'x',
        TileKindId::Settlement => 'S',
        TileKindId::Village => 'V',
        TileKindId::City => 'C',
        TileKindId::Field => 'f',
        TileKindId::Woodcutter => 'w',
        TileKindId::Mine => 'm',
        TileKindId::Quarry => 'q',
        TileKindId::Barracks => 'b',
    }
}

/// Render every tile; owned settlements show their owner's number instead
/// of a letter when `owners` is set
pub fn render_ascii(graph: &TileGraph, owners: bool) -> String {
    let Some((min_col, max_col, min_r, max_r)) = extent(graph) else {
        return String::new();
    };
    let width = (max_col - min_col + 1) as usize;
    let height = (max_r - min_r + 1) as usize;
    let mut rows = vec![vec![' '; width]; height];

    for (_, tile) in graph.iter() {
        let hex = tile.hex();
        let row = (max_r - hex.r) as usize;
        let col = (2 * hex.q + hex.r - min_col) as usize;
        let mut c = glyph(tile.kind());
        if owners && tile.kind().is_ownable() {
            if let Some(owner) = tile.owner() {
                c = char::from_digit((owner.index() + 1) as u32 % 10, 10).unwrap_or(c);
            }
        }
        rows[row][col] = c;
    }

    let mut out = String::with_capacity(height * (width + 1));
    for row in rows {
        let line: String = row.into_iter().collect();
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn extent(graph: &TileGraph) -> Option<(i32, i32, i32, i32)> {
    graph.iter().fold(None, |acc, (_, tile)| {
        let hex = tile.hex();
        let col = 2 * hex.q + hex.r;
        Some(match acc {
            None => (col, col, hex.r, hex.r),
            Some((lo, hi, rlo, rhi)) => (lo.min(col), hi.max(col), rlo.min(hex.r), rhi.max(hex.r)),
        })
    })
}

/// Legend lines for the map
pub fn legend() -> String {
    TileKindId::ALL
        .iter()
        .filter(|k| **k != TileKindId::DeepOcean)
        .map(|k| format!("{} {}", glyph(*k), k.kind().title))
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexrealm_core::{Hex, PlayerId};

    #[test]
    fn test_small_map() {
        let mut graph = TileGraph::new(0);
        graph.create(TileKindId::Empty, Hex::new(0, 0)).unwrap();
        graph.create(TileKindId::Forest, Hex::new(1, 0)).unwrap();
        graph.create(TileKindId::Ocean, Hex::new(0, 1)).unwrap();
        let map = render_ascii(&graph, false);
        assert_eq!(map, " ~\n. t\n");
    }

    #[test]
    fn test_owner_digits() {
        let mut graph = TileGraph::new(0);
        let s = graph.create(TileKindId::Settlement, Hex::ORIGIN).unwrap();
        graph.set_owner(s, Some(PlayerId(1)));
        assert_eq!(render_ascii(&graph, true), "2\n");
        assert_eq!(render_ascii(&graph, false), "S\n");
    }

    #[test]
    fn test_empty_graph() {
        assert_eq!(render_ascii(&TileGraph::new(0), true), "");
    }
}
