// THEORY:
// The `BlobDetector` is the engine of the Spatial Grouping Layer. It takes the binary
// `Mask` produced by the color threshold and turns the scattered foreground samples
// into a short list of spatially coherent regions, or "blobs."
//
// Key architectural principles & algorithm steps:
// 1.  **Hole Filling**: Only the *outer* outline of a region matters for tracking, so
//     background samples that cannot reach the image border are treated as part of
//     the region that encloses them. Background is flooded with 4-connectivity from
//     the border; whatever stays dry is a hole. This also means a small region sitting
//     inside the hole of a bigger one is absorbed by it instead of being reported.
// 2.  **Region Growing**: The filled mask is scanned in raster order. Every unvisited
//     foreground sample seeds a new blob that grows over its 8 neighbours. The
//     8/4 pairing for foreground/background keeps the topology consistent: a diagonal
//     chain of samples is one outline, and it seals off what is behind it.
// 3.  **Data Aggregation**: Each grown region is summarised by its axis-aligned
//     bounding box and its area, the number of samples enclosed by the outline.
// 4.  **Ranking**: Blobs are returned largest first. The sort is stable, so equal
//     areas keep their discovery order. Truncating to the top candidates is left to
//     the caller.
// 5.  **Stateless Utility**: Like the rest of the spatial layer, the detector has no
//     memory of previous frames.

use crate::core_modules::color_mask::Mask;

/// An axis-aligned rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The vertical midpoint, rounded down.
    pub fn mid_y(&self) -> u32 {
        self.y + self.height / 2
    }
}

/// A connected foreground region detected in a single mask.
/// This is a "dumb" data container; it carries no identity across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blob {
    /// The rectangle enclosing every sample of the region.
    pub bounding_box: BoundingBox,
    /// The number of samples enclosed by the region's outer outline. Always > 0.
    pub area: u32,
}

impl Blob {
    /// The paddle anchor: the left edge of the box and its vertical midpoint.
    pub fn anchor(&self) -> (u32, u32) {
        (self.bounding_box.x, self.bounding_box.mid_y())
    }
}

pub mod blob_detector {
    use super::*;

    const FOREGROUND_NEIGHBOURS: [(i64, i64); 8] = [
        (-1, -1),
        (0, -1),
        (1, -1),
        (-1, 0),
        (1, 0),
        (-1, 1),
        (0, 1),
        (1, 1),
    ];
    const BACKGROUND_NEIGHBOURS: [(i64, i64); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

    /// Finds all external regions in `mask`, ordered by area, largest first.
    /// An all-background mask yields an empty list.
    pub fn extract_blobs(mask: &Mask) -> Vec<Blob> {
        let width = mask.width() as i64;
        let height = mask.height() as i64;
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let filled = fill_holes(mask);
        let index = |x: i64, y: i64| (y * width + x) as usize;

        let mut visited = vec![false; filled.len()];
        let mut blobs: Vec<Blob> = Vec::new();

        for y in 0..height {
            for x in 0..width {
                let seed = index(x, y);
                if !filled[seed] || visited[seed] {
                    continue;
                }

                visited[seed] = true;
                let mut stack = vec![(x, y)];
                let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
                let mut area = 0u32;

                while let Some((cx, cy)) = stack.pop() {
                    area += 1;
                    min_x = min_x.min(cx);
                    min_y = min_y.min(cy);
                    max_x = max_x.max(cx);
                    max_y = max_y.max(cy);

                    for (dx, dy) in FOREGROUND_NEIGHBOURS {
                        let (nx, ny) = (cx + dx, cy + dy);
                        if nx < 0 || ny < 0 || nx >= width || ny >= height {
                            continue;
                        }
                        let neighbour = index(nx, ny);
                        if filled[neighbour] && !visited[neighbour] {
                            visited[neighbour] = true;
                            stack.push((nx, ny));
                        }
                    }
                }

                blobs.push(Blob {
                    bounding_box: BoundingBox::new(
                        min_x as u32,
                        min_y as u32,
                        (max_x - min_x + 1) as u32,
                        (max_y - min_y + 1) as u32,
                    ),
                    area,
                });
            }
        }

        // `sort_by` is stable: equal areas stay in discovery order.
        blobs.sort_by(|a, b| b.area.cmp(&a.area));
        blobs
    }

    /// Returns the mask with every enclosed background sample set to foreground.
    fn fill_holes(mask: &Mask) -> Vec<bool> {
        let width = mask.width() as i64;
        let height = mask.height() as i64;
        let index = |x: i64, y: i64| (y * width + x) as usize;

        let mut outside = vec![false; mask.bits().len()];
        let mut stack: Vec<(i64, i64)> = Vec::new();

        let border = (0..width)
            .flat_map(|x| [(x, 0), (x, height - 1)])
            .chain((0..height).flat_map(|y| [(0, y), (width - 1, y)]));
        for (x, y) in border {
            let i = index(x, y);
            if !mask.get(x, y) && !outside[i] {
                outside[i] = true;
                stack.push((x, y));
            }
        }

        while let Some((cx, cy)) = stack.pop() {
            for (dx, dy) in BACKGROUND_NEIGHBOURS {
                let (nx, ny) = (cx + dx, cy + dy);
                if nx < 0 || ny < 0 || nx >= width || ny >= height {
                    continue;
                }
                let i = index(nx, ny);
                if !outside[i] && !mask.get(nx, ny) {
                    outside[i] = true;
                    stack.push((nx, ny));
                }
            }
        }

        outside.into_iter().map(|reached| !reached).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::blob_detector::extract_blobs;
    use super::*;

    /// Builds a mask from ASCII art, `#` is foreground.
    fn mask(rows: &[&str]) -> Mask {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let bits = rows.iter().flat_map(|row| row.chars().map(|c| c == '#')).collect();
        Mask::from_bits(width, height, bits)
    }

    #[test]
    fn empty_mask_has_no_blobs() {
        assert!(extract_blobs(&Mask::empty(10, 10)).is_empty());
    }

    #[test]
    fn single_square() {
        let blobs = extract_blobs(&mask(&[
            "......",
            ".###..",
            ".###..",
            "......",
        ]));
        assert_eq!(
            blobs,
            vec![Blob {
                bounding_box: BoundingBox::new(1, 1, 3, 2),
                area: 6
            }]
        );
        assert_eq!(blobs[0].anchor(), (1, 2));
    }

    #[test]
    fn blobs_are_ranked_by_area() {
        let blobs = extract_blobs(&mask(&[
            "#.......",
            "....###.",
            "....###.",
            "##......",
        ]));
        let areas: Vec<u32> = blobs.iter().map(|b| b.area).collect();
        assert_eq!(areas, vec![6, 2, 1]);
    }

    #[test]
    fn equal_areas_keep_raster_order() {
        let blobs = extract_blobs(&mask(&[
            "......##",
            "##......",
        ]));
        assert_eq!(blobs[0].bounding_box.x, 6);
        assert_eq!(blobs[1].bounding_box.x, 0);
    }

    #[test]
    fn diagonal_neighbours_join() {
        let blobs = extract_blobs(&mask(&[
            "#..",
            ".#.",
            "..#",
        ]));
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].bounding_box, BoundingBox::new(0, 0, 3, 3));
    }

    #[test]
    fn holes_count_towards_area_and_nested_regions_are_absorbed() {
        let blobs = extract_blobs(&mask(&[
            ".......",
            ".#####.",
            ".#...#.",
            ".#.#.#.",
            ".#...#.",
            ".#####.",
            ".......",
        ]));
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 25);
        assert_eq!(blobs[0].bounding_box, BoundingBox::new(1, 1, 5, 5));
    }

    #[test]
    fn notch_open_to_the_border_is_not_a_hole() {
        let blobs = extract_blobs(&mask(&[
            "###",
            "#.#",
            "#.#",
        ]));
        assert_eq!(blobs[0].area, 7);
    }

    #[test]
    fn regions_touching_the_border() {
        let blobs = extract_blobs(&mask(&["##", "##"]));
        assert_eq!(blobs[0].area, 4);
        assert_eq!(blobs[0].bounding_box, BoundingBox::new(0, 0, 2, 2));
    }

    #[test]
    fn results_are_sorted_descending() {
        let blobs = extract_blobs(&mask(&[
            "#.##.###.#",
            "..........",
            "####.#....",
        ]));
        assert!(blobs.windows(2).all(|pair| pair[0].area >= pair[1].area));
        assert!(blobs.iter().all(|b| b.area > 0));
    }
}
