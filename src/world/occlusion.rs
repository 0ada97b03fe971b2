use super::cell::{Cell, Face};

/// Strip side faces hidden by neighbouring columns.
///
/// A face goes when the column on that side holds a solid cell spanning at
/// least the same vertical range. Runs once over freshly built cells and is
/// never revisited. Returns the number of faces removed.
pub(crate) fn cull_hidden_faces(cells: &mut [Cell], width: u32, length: u32, floors: u32) -> usize {
    let column_len = floors as usize;
    let stride = length as usize;
    let mut removals = Vec::new();

    for x in 0..width as i32 {
        for z in 0..length as i32 {
            let start = (x as usize * stride + z as usize) * column_len;
            for cell in &cells[start..start + column_len] {
                if cell.is_hole() {
                    continue;
                }
                for face in Face::ALL {
                    let (dx, dz) = face.step();
                    let (nx, nz) = (x + dx, z + dz);
                    if nx < 0 || nz < 0 || nx >= width as i32 || nz >= length as i32 {
                        continue;
                    }
                    let neighbour = (nx as usize * stride + nz as usize) * column_len;
                    if cells[neighbour..neighbour + column_len]
                        .iter()
                        .any(|other| other.covers(cell))
                    {
                        removals.push((start + cell.floor() as usize, face));
                    }
                }
            }
        }
    }

    for (idx, face) in &removals {
        cells[*idx].remove_face(*face);
    }
    removals.len()
}
