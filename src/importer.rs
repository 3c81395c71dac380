// Legacy binary world import (.mdo world + .kec limits, little-endian u16 words)

use crate::config::{LEGACY_INFINITE, LEGACY_LIMITS_MIN_WORDS, LEGACY_WORLD_MIN_WORDS};
use crate::error::WorldError;
use crate::types::{ActionKind, DumpKind, INFINITE, Orientation};
use crate::world::World;

// "KAREL OMI." as little-endian words
const MAGIC: [u16; 5] = [0x414B, 0x4552, 0x204C, 0x4D4F, 0x2E49];

// Word offsets below are inferred from the field order of the world document
// and the legacy editor's import flow; no reference decoder was available to
// check them against. Only the magic signature is taken verbatim.

// .mdo header offsets
const MDO_WIDTH: usize = 6;
const MDO_HEIGHT: usize = 7;
const MDO_BAG: usize = 8;
const MDO_X: usize = 9;
const MDO_Y: usize = 10;
const MDO_ORIENTATION: usize = 11;
const MDO_WALL_COUNT: usize = 12;
const MDO_PILE_COUNT: usize = 13;
const MDO_RECORDS: usize = 15;

// .kec is a sequence of (flag, value, unused) triples. The format has no slot
// for the bag, all-buzzers or per-action dumps: an imported world leaves them
// off and a world document has to enable them.
const KEC_INSTRUCTIONS: usize = 1;
const KEC_ACTION_CAPS: [(ActionKind, usize); 4] = [
    (ActionKind::Forward, 3),
    (ActionKind::Left, 6),
    (ActionKind::PickBuzzer, 9),
    (ActionKind::LeaveBuzzer, 12),
];
// Bag and world buzzer caps; the engine has no such budgets
const KEC_UNSUPPORTED_CAPS: [(&str, usize); 2] = [("bag buzzer", 15), ("world buzzer", 18)];
const KEC_DUMP_POSITION: usize = 21;
const KEC_DUMP_ORIENTATION: usize = 24;
const KEC_DUMP_CELLS: usize = 27;
const KEC_CELLS: usize = 30;

/// Splits a raw file into little-endian 16-bit words.
pub fn words_from_le_bytes(bytes: &[u8]) -> Result<Vec<u16>, WorldError> {
    if bytes.len() % 2 != 0 {
        return Err(WorldError::OddLength(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

fn amount(word: u16) -> i32 {
    if word == LEGACY_INFINITE {
        INFINITE
    } else {
        word as i32
    }
}

fn orientation(word: u16) -> Result<Orientation, WorldError> {
    match word {
        1 => Ok(Orientation::North),
        2 => Ok(Orientation::East),
        3 => Ok(Orientation::South),
        4 => Ok(Orientation::West),
        _ => Err(WorldError::InvalidValue {
            field: "orientation",
            value: word as u32,
        }),
    }
}

/// Decodes a legacy world/limits pair into a new world.
pub fn decode(mdo: &[u16], kec: &[u16]) -> Result<World, WorldError> {
    if mdo.len() < LEGACY_WORLD_MIN_WORDS {
        return Err(WorldError::TooShort {
            what: "world buffer",
            expected: LEGACY_WORLD_MIN_WORDS,
            actual: mdo.len(),
        });
    }
    if kec.len() < LEGACY_LIMITS_MIN_WORDS {
        return Err(WorldError::TooShort {
            what: "limits buffer",
            expected: LEGACY_LIMITS_MIN_WORDS,
            actual: kec.len(),
        });
    }
    if mdo[..MAGIC.len()] != MAGIC {
        return Err(WorldError::BadMagic);
    }

    let (width, height) = (mdo[MDO_WIDTH] as usize, mdo[MDO_HEIGHT] as usize);
    if !World::accepts_dimensions(width, height) {
        return Err(WorldError::InvalidDimensions { width, height });
    }

    let walls = mdo[MDO_WALL_COUNT] as usize;
    let piles = mdo[MDO_PILE_COUNT] as usize;
    let needed = MDO_RECORDS + 3 * (walls + piles);
    if mdo.len() < needed {
        return Err(WorldError::Truncated {
            what: "world buffer",
            expected: needed,
            actual: mdo.len(),
        });
    }

    let mut world = World::new(width, height);

    let (x, y) = (mdo[MDO_X] as i32, mdo[MDO_Y] as i32);
    if !world.in_bounds(y, x) {
        return Err(WorldError::InvalidCoordinate {
            x: x as i64,
            y: y as i64,
        });
    }
    world.move_to(y, x);
    world.rotate(orientation(mdo[MDO_ORIENTATION])?);
    world.set_bag(amount(mdo[MDO_BAG]));

    let records = &mdo[MDO_RECORDS..needed];
    let (wall_records, pile_records) = records.split_at(3 * walls);
    for record in wall_records.chunks_exact(3) {
        let (x, y, mask) = (record[0] as i32, record[1] as i32, record[2] as u8);
        for side in Orientation::ALL {
            if mask & side.bit() != 0 {
                world.add_wall(y, x, side);
            }
        }
    }
    for record in pile_records.chunks_exact(3) {
        world.set_buzzers(record[1] as i32, record[0] as i32, amount(record[2]));
    }

    // A zero budget in old files means "not set"
    if kec[KEC_INSTRUCTIONS] != 0 {
        world.limits.max_instructions = kec[KEC_INSTRUCTIONS] as u64;
    }
    for (action, offset) in KEC_ACTION_CAPS {
        if kec[offset] != 0 {
            world
                .limits
                .set_action_cap(action, Some(kec[offset + 1] as u64));
        }
    }
    for (name, offset) in KEC_UNSUPPORTED_CAPS {
        if kec[offset] != 0 {
            log::warn!(
                target: "world",
                "Ignoring legacy {} limit {}: not supported",
                name,
                kec[offset + 1]
            );
        }
    }
    world.set_dump(DumpKind::Position, kec[KEC_DUMP_POSITION] != 0);
    world.set_dump(DumpKind::Orientation, kec[KEC_DUMP_ORIENTATION] != 0);

    if kec[KEC_DUMP_CELLS] != 0 {
        let cells = kec[KEC_DUMP_CELLS + 1] as usize;
        let needed = KEC_CELLS + 3 * cells;
        if kec.len() < needed {
            return Err(WorldError::Truncated {
                what: "limits buffer",
                expected: needed,
                actual: kec.len(),
            });
        }
        for record in kec[KEC_CELLS..needed].chunks_exact(3) {
            world.set_dump_cell(record[1] as i32, record[0] as i32, true);
        }
        world.set_dump(DumpKind::World, true);
    }

    Ok(world)
}

/// Replaces `world` with the decoded legacy pair.
/// On error the world is left unmodified.
pub fn import_legacy(world: &mut World, mdo: &[u16], kec: &[u16]) -> Result<(), WorldError> {
    *world = decode(mdo, kec)?;
    crate::debug_world!(
        "Imported legacy world {}x{}",
        world.width(),
        world.height()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mdo(walls: &[[u16; 3]], piles: &[[u16; 3]]) -> Vec<u16> {
        let mut words = MAGIC.to_vec();
        words.extend_from_slice(&[0, 5, 4, 3, 2, 1, 2]); // unused, w, h, bag, x, y, EAST
        words.extend_from_slice(&[walls.len() as u16, piles.len() as u16, 0]);
        for record in walls.iter().chain(piles) {
            words.extend_from_slice(record);
        }
        words.resize(words.len().max(LEGACY_WORLD_MIN_WORDS), 0);
        words
    }

    fn kec() -> Vec<u16> {
        vec![0; LEGACY_LIMITS_MIN_WORDS]
    }

    #[test]
    fn test_decode_world() {
        let world = decode(&mdo(&[[2, 2, 0b0100]], &[[3, 1, 4], [1, 4, 0xFFFF]]), &kec()).unwrap();
        assert_eq!((world.width(), world.height()), (5, 4));
        assert_eq!(world.bag(), 3);
        assert_eq!((world.pose().row, world.pose().col), (1, 2));
        assert_eq!(world.pose().orientation, Orientation::East);
        assert_ne!(world.walls(2, 2) & Orientation::East.bit(), 0);
        assert_ne!(world.walls(2, 3) & Orientation::West.bit(), 0);
        assert_eq!(world.buzzers(1, 3), 4);
        assert_eq!(world.buzzers(4, 1), INFINITE);
    }

    #[test]
    fn test_decode_limits_and_dumps() {
        let mut limits = kec();
        limits[KEC_INSTRUCTIONS] = 200;
        limits[3] = 1;
        limits[4] = 7;
        limits[12] = 1;
        limits[13] = 0;
        limits[KEC_DUMP_POSITION] = 1;
        limits[KEC_DUMP_CELLS] = 1;
        limits[KEC_DUMP_CELLS + 1] = 2;
        limits.extend_from_slice(&[1, 1, 0, 2, 3, 0]);

        let world = decode(&mdo(&[], &[]), &limits).unwrap();
        assert_eq!(world.limits.max_instructions, 200);
        assert_eq!(world.limits.max_forward, Some(7));
        assert_eq!(world.limits.max_left, None);
        assert_eq!(world.limits.max_leave_buzzer, Some(0));
        assert!(world.has_dump(DumpKind::Position));
        assert!(!world.has_dump(DumpKind::Orientation));
        assert!(world.has_dump(DumpKind::World));
        assert!(world.is_dump_cell(1, 1));
        assert!(world.is_dump_cell(3, 2));
    }

    #[test]
    fn test_dumps_without_legacy_slot_stay_off() {
        // Every word outside the dump-cell records set: only the dumps the
        // format carries come out enabled
        let mut limits = vec![1; LEGACY_LIMITS_MIN_WORDS];
        limits[KEC_DUMP_CELLS] = 0;
        let world = decode(&mdo(&[], &[]), &limits).unwrap();

        assert!(world.has_dump(DumpKind::Position));
        assert!(world.has_dump(DumpKind::Orientation));
        for kind in [
            DumpKind::World,
            DumpKind::AllBuzzers,
            DumpKind::Bag,
            DumpKind::Forward,
            DumpKind::Left,
            DumpKind::PickBuzzer,
            DumpKind::LeaveBuzzer,
        ] {
            assert!(!world.has_dump(kind), "{:?} should stay off", kind);
        }
        assert_eq!(world.limits.max_instructions, 1);
        assert_eq!(world.limits.max_pick_buzzer, Some(1));
    }

    #[test]
    fn test_short_buffer_leaves_world_untouched() {
        let mut world = World::new(3, 3);
        world.set_buzzers(2, 2, 9);
        let short = vec![0u16; 19];
        let err = import_legacy(&mut world, &short, &kec()).unwrap_err();
        assert!(matches!(err, WorldError::TooShort { expected: 20, actual: 19, .. }));
        assert_eq!(world.width(), 3);
        assert_eq!(world.buzzers(2, 2), 9);
    }

    #[test]
    fn test_bad_magic_and_truncation() {
        let mut words = mdo(&[], &[]);
        words[0] = 0;
        assert!(matches!(decode(&words, &kec()), Err(WorldError::BadMagic)));

        let mut words = mdo(&[], &[]);
        words[MDO_PILE_COUNT] = 10;
        assert!(matches!(decode(&words, &kec()), Err(WorldError::Truncated { .. })));

        let mut limits = kec();
        limits[KEC_DUMP_CELLS] = 1;
        limits[KEC_DUMP_CELLS + 1] = 1;
        assert!(matches!(
            decode(&mdo(&[], &[]), &limits),
            Err(WorldError::Truncated { what: "limits buffer", .. })
        ));
    }

    #[test]
    fn test_invalid_orientation() {
        let mut words = mdo(&[], &[]);
        words[MDO_ORIENTATION] = 9;
        assert!(matches!(
            decode(&words, &kec()),
            Err(WorldError::InvalidValue { field: "orientation", value: 9 })
        ));
    }

    #[test]
    fn test_words_from_le_bytes() {
        assert_eq!(words_from_le_bytes(&[0x4B, 0x41, 0x01, 0x00]).unwrap(), vec![0x414B, 1]);
        assert!(matches!(words_from_le_bytes(&[1, 2, 3]), Err(WorldError::OddLength(3))));
    }
}
