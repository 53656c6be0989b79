use crate::chunk::{blocks, WorldPos};
use crate::heightmap::height_at;
use crate::structures::{StructureBatch, StructureKind};

/// Village anchor column near spawn.
pub const VILLAGE_ANCHOR_X: i32 = -20;
pub const VILLAGE_ANCHOR_Z: i32 = 10;

/// Small pole-walled house with a stone floor and an overhanging roof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct House {
    /// Floor corner with the door wall along +x
    pub origin: WorldPos,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

impl House {
    pub const fn new(origin: WorldPos, width: i32, height: i32, depth: i32) -> Self {
        Self {
            origin,
            width,
            height,
            depth,
        }
    }

    pub fn build(&self) -> StructureBatch {
        let o = self.origin;
        let (w, h, d) = (self.width, self.height, self.depth);
        let mut batch = StructureBatch::new(StructureKind::House, o);

        for px in 0..w {
            for pz in 0..d {
                batch.place(o.offset(px, 0, pz), blocks::STONE);
            }
        }

        for py in 1..h {
            for px in 0..w {
                batch.place(o.offset(px, py, 0), blocks::POLE);
                batch.place(o.offset(px, py, d - 1), blocks::POLE);
            }
            for pz in 1..d - 1 {
                batch.place(o.offset(0, py, pz), blocks::POLE);
                batch.place(o.offset(w - 1, py, pz), blocks::POLE);
            }
        }

        // Door: two air blocks cut into the front wall
        batch.place(o.offset(w / 2, 1, 0), blocks::AIR);
        batch.place(o.offset(w / 2, 2, 0), blocks::AIR);

        batch.place(o.offset(1, 2, 0), blocks::WINDOW);
        batch.place(o.offset(w - 2, 2, 0), blocks::WINDOW);
        batch.place(o.offset(1, 2, d - 1), blocks::WINDOW);
        batch.place(o.offset(w - 2, 2, d - 1), blocks::WINDOW);

        for px in -1..=w {
            for pz in -1..=d {
                batch.place(o.offset(px, h, pz), blocks::SHINY_DIRT);
            }
        }

        batch
    }
}

/// 3x3 stone well with a water center, four posts and a flat roof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Well {
    pub center: WorldPos,
}

impl Well {
    pub fn build(&self) -> StructureBatch {
        let c = self.center;
        let mut batch = StructureBatch::new(StructureKind::Well, c);

        for px in -1..=1 {
            for pz in -1..=1 {
                if px == 0 && pz == 0 {
                    continue;
                }
                batch.place(c.offset(px, 0, pz), blocks::STONE);
                batch.place(c.offset(px, 1, pz), blocks::STONE);
            }
        }

        batch.place(c, blocks::WATER);

        for (px, pz) in [(-1, -1), (1, -1), (-1, 1), (1, 1)] {
            batch.place(c.offset(px, 2, pz), blocks::POLE);
        }

        for px in -1..=1 {
            for pz in -1..=1 {
                batch.place(c.offset(px, 3, pz), blocks::SHINY_DIRT);
            }
        }

        batch
    }
}

/// Straight stone path between two columns, laid at the start point's height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Path {
    pub from: WorldPos,
    pub to: WorldPos,
}

/// Round half toward positive infinity, so paths step symmetrically across zero.
fn round_half_up(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

impl Path {
    pub fn build(&self) -> StructureBatch {
        let mut batch = StructureBatch::new(StructureKind::Path, self.from);
        let dx = self.to.x - self.from.x;
        let dz = self.to.z - self.from.z;
        let steps = dx.abs().max(dz.abs());

        for i in 0..=steps {
            let t = if steps == 0 {
                0.0
            } else {
                i as f64 / steps as f64
            };
            let x = round_half_up(self.from.x as f64 + dx as f64 * t);
            let z = round_half_up(self.from.z as f64 + dz as f64 * t);
            batch.place(WorldPos::new(x, self.from.y, z), blocks::STONE);
        }

        batch
    }
}

/// Fixed village layout: three houses, a central well, and connecting paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Village {
    pub anchor: WorldPos,
    pub houses: [House; 3],
    pub well: Well,
    pub paths: [Path; 3],
}

impl Village {
    /// Lay out a village around `anchor`.
    pub fn at(anchor: WorldPos) -> Self {
        let a = anchor;
        let well_center = a.offset(5, 0, 5);
        Self {
            anchor,
            houses: [
                House::new(a, 5, 4, 6),
                House::new(a.offset(10, 0, -5), 6, 4, 5),
                House::new(a.offset(-8, 0, 8), 4, 4, 4),
            ],
            well: Well {
                center: well_center,
            },
            paths: [
                Path {
                    from: a.offset(3, 0, 3),
                    to: well_center,
                },
                Path {
                    from: well_center,
                    to: a.offset(10, 0, -5),
                },
                Path {
                    from: well_center,
                    to: a.offset(-8, 0, 8),
                },
            ],
        }
    }

    /// The spawn village, sitting on the terrain at its anchor column.
    pub fn spawn() -> Self {
        let y = height_at(VILLAGE_ANCHOR_X as f64, VILLAGE_ANCHOR_Z as f64).floor() as i32;
        Self::at(WorldPos::new(VILLAGE_ANCHOR_X, y, VILLAGE_ANCHOR_Z))
    }

    /// Edit batches in build order: houses, well, paths.
    pub fn build(&self) -> Vec<StructureBatch> {
        self.houses
            .iter()
            .map(House::build)
            .chain(std::iter::once(self.well.build()))
            .chain(self.paths.iter().map(Path::build))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::BlockId;

    fn final_block(batch: &StructureBatch, pos: WorldPos) -> Option<BlockId> {
        batch
            .edits()
            .iter()
            .rev()
            .find(|e| e.pos == pos)
            .map(|e| e.block)
    }

    #[test]
    fn house_has_door_windows_and_roof() {
        let house = House::new(WorldPos::new(0, 10, 0), 5, 4, 6);
        let batch = house.build();

        assert_eq!(final_block(&batch, WorldPos::new(2, 11, 0)), Some(blocks::AIR));
        assert_eq!(final_block(&batch, WorldPos::new(2, 12, 0)), Some(blocks::AIR));
        assert_eq!(final_block(&batch, WorldPos::new(1, 12, 0)), Some(blocks::WINDOW));
        assert_eq!(final_block(&batch, WorldPos::new(3, 12, 5)), Some(blocks::WINDOW));
        assert_eq!(final_block(&batch, WorldPos::new(0, 11, 3)), Some(blocks::POLE));
        assert_eq!(final_block(&batch, WorldPos::new(2, 10, 3)), Some(blocks::STONE));
        // Roof overhangs by one on every side
        assert_eq!(final_block(&batch, WorldPos::new(-1, 14, -1)), Some(blocks::SHINY_DIRT));
        assert_eq!(final_block(&batch, WorldPos::new(5, 14, 6)), Some(blocks::SHINY_DIRT));
        // Interior stays untouched
        assert_eq!(final_block(&batch, WorldPos::new(2, 11, 3)), None);
    }

    #[test]
    fn well_layout() {
        let well = Well {
            center: WorldPos::new(0, 0, 0),
        };
        let batch = well.build();
        assert_eq!(final_block(&batch, WorldPos::new(0, 0, 0)), Some(blocks::WATER));
        assert_eq!(final_block(&batch, WorldPos::new(1, 1, 0)), Some(blocks::STONE));
        assert_eq!(final_block(&batch, WorldPos::new(0, 1, 0)), None);
        assert_eq!(final_block(&batch, WorldPos::new(-1, 2, 1)), Some(blocks::POLE));
        assert_eq!(final_block(&batch, WorldPos::new(0, 3, 0)), Some(blocks::SHINY_DIRT));
        assert_eq!(batch.edits().len(), 16 + 1 + 4 + 9);
    }

    #[test]
    fn path_steps_along_longest_axis() {
        let path = Path {
            from: WorldPos::new(0, 7, 0),
            to: WorldPos::new(4, 7, -2),
        };
        let batch = path.build();
        let cells: Vec<(i32, i32)> = batch.edits().iter().map(|e| (e.pos.x, e.pos.z)).collect();
        // z = -0.5 and -1.5 round up toward +inf
        assert_eq!(cells, vec![(0, 0), (1, 0), (2, -1), (3, -1), (4, -2)]);
        assert!(batch.edits().iter().all(|e| e.pos.y == 7 && e.block == blocks::STONE));
    }

    #[test]
    fn zero_length_path_is_one_block() {
        let p = WorldPos::new(3, 1, 3);
        let batch = Path { from: p, to: p }.build();
        assert_eq!(batch.edits().len(), 1);
    }

    #[test]
    fn spawn_village_layout() {
        let village = Village::spawn();
        assert_eq!(village.anchor.x, VILLAGE_ANCHOR_X);
        assert_eq!(village.anchor.z, VILLAGE_ANCHOR_Z);
        assert_eq!(village.well.center, village.anchor.offset(5, 0, 5));
        let batches = village.build();
        assert_eq!(batches.len(), 7);
        assert_eq!(batches[3].kind(), StructureKind::Well);
        assert!(batches[4..].iter().all(|b| b.kind() == StructureKind::Path));
    }
}
