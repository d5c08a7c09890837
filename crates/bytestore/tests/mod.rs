use std::{cell::Cell, io, rc::Rc};

use bytestore::{
    AlignedByteStore, ArrayByteStore, ByteStore, ChunkManager, ChunkedByteStore, Error,
    FileByteStore, InsertPlan, Result, SlotStore,
};
use tempfile::TempDir;

fn slot(value: u64) -> [u8; 8] {
    value.to_le_bytes()
}

fn read_u64s<S: SlotStore>(store: &S) -> Result<Vec<u64>> {
    let mut buf = [0u8; 8];
    (0..store.len())
        .map(|i| {
            store.read_slot(i, &mut buf)?;
            Ok(u64::from_le_bytes(buf))
        })
        .collect()
}

fn occupancies<S: ByteStore>(store: &ChunkedByteStore<S>) -> Vec<usize> {
    store
        .manager()
        .descriptors()
        .iter()
        .map(|d| d.occupied())
        .collect()
}

fn chunked(chunk_bytes: usize) -> Result<ChunkedByteStore<ArrayByteStore>> {
    ChunkedByteStore::new(ArrayByteStore::new(), 8, chunk_bytes)
}

#[test]
fn test_array_write_zero_extends() -> Result<()> {
    let mut store = ArrayByteStore::new();
    store.write(4, b"ab")?;

    assert_eq!(store.len(), 6);
    assert_eq!(store.read(0, 6)?, vec![0, 0, 0, 0, b'a', b'b']);

    store.write(1, b"xyz")?;
    assert_eq!(store.as_bytes(), &[0, b'x', b'y', b'z', b'a', b'b']);

    Ok(())
}

#[test]
fn test_array_read_out_of_bounds() -> Result<()> {
    let mut store = ArrayByteStore::new();
    store.write(0, b"hello")?;

    assert!(matches!(
        store.read(3, 3),
        Err(Error::OutOfBounds {
            offset: 3,
            len: 3,
            store_len: 5
        })
    ));
    assert_eq!(store.read(5, 0)?, Vec::<u8>::new());

    Ok(())
}

#[test]
fn test_array_truncate_and_copy() -> Result<()> {
    let mut store = ArrayByteStore::from_vec(b"abcdef".to_vec());

    store.copy_within(0, 2, 4)?;
    assert_eq!(store.as_bytes(), b"ababcd");

    store.copy_within(4, 6, 2)?;
    assert_eq!(store.as_bytes(), b"ababcdcd");

    store.truncate(3)?;
    assert_eq!(store.as_bytes(), b"aba");

    // Growing through truncate does nothing
    store.truncate(10)?;
    assert_eq!(store.len(), 3);

    // Close is a no-op for memory
    store.close()?;
    assert!(!store.is_closed());
    assert_eq!(store.read(0, 3)?, b"aba".to_vec());

    Ok(())
}

#[test]
fn test_file_write_close_reopen() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("bytes");

    let mut store = FileByteStore::create_at(&path)?;
    assert!(store.is_empty());
    store.write(0, b"Hello, ")?;
    store.write(7, b"World!")?;
    assert_eq!(store.len(), 13);
    store.close()?;

    // The file holds exactly the written bytes
    assert_eq!(std::fs::read(&path)?, b"Hello, World!".to_vec());

    let store = FileByteStore::open(&path)?;
    assert_eq!(store.len(), 13);
    assert_eq!(store.read(7, 5)?, b"World".to_vec());

    Ok(())
}

#[test]
fn test_file_grows_past_page_size() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("bytes");

    let mut store = FileByteStore::create_at(&path)?;
    let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    store.write(0, &data)?;
    store.write(20_000, &[7])?;

    assert_eq!(store.len(), 20_001);
    assert_eq!(store.read(0, data.len())?, data);
    assert_eq!(store.read(10_000, 4)?, vec![0; 4]);

    store.flush()?;
    assert_eq!(std::fs::metadata(&path)?.len(), 20_001);

    Ok(())
}

#[test]
fn test_file_truncate_then_write_zeroes_gap() -> Result<()> {
    let temp = TempDir::new()?;
    let mut store = FileByteStore::create_at(&temp.path().join("bytes"))?;

    store.write(0, &[1; 8])?;
    store.truncate(2)?;
    assert_eq!(store.len(), 2);

    store.write(6, &[9])?;
    assert_eq!(store.read(0, 7)?, vec![1, 1, 0, 0, 0, 0, 9]);

    Ok(())
}

#[test]
fn test_file_close_is_idempotent() -> Result<()> {
    let temp = TempDir::new()?;
    let mut store = FileByteStore::create_at(&temp.path().join("bytes"))?;
    store.write(0, b"data")?;

    store.close()?;
    assert!(store.is_closed());
    store.close()?;

    assert!(matches!(store.read(0, 1), Err(Error::Closed)));
    assert!(matches!(store.write(0, b"x"), Err(Error::Closed)));
    assert!(matches!(store.flush(), Err(Error::Closed)));

    Ok(())
}

#[test]
fn test_file_open_missing_fails() {
    let temp = TempDir::new().unwrap();
    let result = FileByteStore::open(&temp.path().join("missing"));
    assert!(matches!(result, Err(Error::IO(_))));
}

#[test]
fn test_aligned_rejects_bad_configuration() {
    assert!(matches!(
        AlignedByteStore::new(ArrayByteStore::new(), 0),
        Err(Error::InvalidElementSize)
    ));
    assert!(matches!(
        AlignedByteStore::new(ArrayByteStore::from_vec(vec![0; 5]), 4),
        Err(Error::CorruptedLength {
            store_len: 5,
            element_size: 4
        })
    ));
}

#[test]
fn test_aligned_rejects_misaligned_access() -> Result<()> {
    let mut store = AlignedByteStore::new(ArrayByteStore::new(), 4)?;
    store.insert_slot(0, &[1, 2, 3, 4])?;

    let mut buf = [0u8; 3];
    assert!(matches!(
        store.read_slot(0, &mut buf),
        Err(Error::Misaligned {
            len: 3,
            element_size: 4
        })
    ));
    assert!(matches!(
        store.write_slot(0, &[1, 2, 3, 4, 5]),
        Err(Error::Misaligned { .. })
    ));
    assert!(matches!(
        store.insert_slot(1, &[]),
        Err(Error::Misaligned { .. })
    ));
    assert!(matches!(
        store.write_slots(1, &[0; 6]),
        Err(Error::Misaligned { .. })
    ));

    // Nothing was written by the rejected calls
    assert_eq!(store.len(), 1);
    assert_eq!(store.inner().as_bytes(), &[1, 2, 3, 4]);

    Ok(())
}

#[test]
fn test_aligned_bulk_slots() -> Result<()> {
    let mut store = AlignedByteStore::new(ArrayByteStore::new(), 2)?;
    store.write_slots(0, &[1, 1, 2, 2, 3, 3])?;
    assert_eq!(store.len(), 3);

    let mut buf = [0u8; 4];
    store.read_slots(1, &mut buf)?;
    assert_eq!(buf, [2, 2, 3, 3]);

    assert!(matches!(
        store.read_slots(2, &mut buf),
        Err(Error::IndexOutOfBounds { index: 3, len: 3 })
    ));
    assert!(matches!(
        store.write_slots(4, &[0, 0]),
        Err(Error::IndexOutOfBounds { index: 4, len: 3 })
    ));

    Ok(())
}

#[test]
fn test_aligned_insert_remove_shift_tail() -> Result<()> {
    let mut store = AlignedByteStore::new(ArrayByteStore::new(), 8)?;
    for v in [10, 20, 30] {
        store.insert_slot(store.len(), &slot(v))?;
    }

    store.insert_slot(1, &slot(15))?;
    assert_eq!(read_u64s(&store)?, vec![10, 15, 20, 30]);

    store.insert_slot(0, &slot(5))?;
    assert_eq!(read_u64s(&store)?, vec![5, 10, 15, 20, 30]);

    store.remove_slot(2)?;
    assert_eq!(read_u64s(&store)?, vec![5, 10, 20, 30]);

    store.remove_slot(3)?;
    assert_eq!(read_u64s(&store)?, vec![5, 10, 20]);
    assert_eq!(store.inner().len(), 24);

    assert!(matches!(
        store.remove_slot(3),
        Err(Error::IndexOutOfBounds { index: 3, len: 3 })
    ));
    assert!(matches!(
        store.insert_slot(4, &slot(0)),
        Err(Error::IndexOutOfBounds { index: 4, len: 3 })
    ));

    Ok(())
}

#[test]
fn test_aligned_over_file_reopens() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("slots");

    {
        let mut store = AlignedByteStore::new(FileByteStore::create_at(&path)?, 8)?;
        for v in 0..100 {
            store.insert_slot(store.len(), &slot(v))?;
        }
        store.remove_slot(0)?;
        store.close()?;
    }

    assert_eq!(std::fs::metadata(&path)?.len(), 99 * 8);

    let store = AlignedByteStore::new(FileByteStore::open(&path)?, 8)?;
    assert_eq!(read_u64s(&store)?, (1..100).collect::<Vec<_>>());

    Ok(())
}

#[test]
fn test_manager_rejects_bad_capacity() {
    assert!(matches!(
        ChunkManager::new(0, 16),
        Err(Error::InvalidElementSize)
    ));
    assert!(matches!(
        ChunkManager::new(8, 7),
        Err(Error::InvalidChunkCapacity {
            chunk_bytes: 7,
            element_size: 8
        })
    ));

    let manager = ChunkManager::new(8, 20).unwrap();
    assert_eq!(manager.capacity(), 2);
    assert_eq!(manager.chunk_bytes(), 16);
}

#[test]
fn test_manager_plans_without_mutating() -> Result<()> {
    let mut manager = ChunkManager::new(8, 16)?;

    let plan = manager.plan_insert(0)?;
    assert_eq!(
        plan,
        InsertPlan::Open {
            chunk: 0,
            new_start: 0
        }
    );
    assert_eq!(manager.chunk_count(), 0);

    manager.commit_insert(plan);
    manager.commit_insert(manager.plan_insert(1)?);
    assert_eq!(manager.len(), 2);
    assert_eq!(manager.chunk_count(), 1);

    assert_eq!(
        manager.plan_insert(1)?,
        InsertPlan::Split {
            chunk: 0,
            start: 0,
            offset: 1,
            new_start: 16
        }
    );
    assert!(matches!(
        manager.plan_insert(3),
        Err(Error::IndexOutOfBounds { index: 3, len: 2 })
    ));
    assert!(matches!(
        manager.plan_remove(2),
        Err(Error::IndexOutOfBounds { index: 2, len: 2 })
    ));

    Ok(())
}

#[test]
fn test_manager_locates_across_chunks() -> Result<()> {
    let mut manager = ChunkManager::new(4, 12)?;
    for i in 0..7 {
        manager.commit_insert(manager.plan_insert(i)?);
    }
    assert_eq!(manager.chunk_count(), 3);

    let location = manager.locate(4)?;
    assert_eq!((location.chunk, location.offset), (1, 1));
    let location = manager.locate(6)?;
    assert_eq!((location.chunk, location.offset), (2, 0));
    assert_eq!(manager.byte_offset(5)?, 12 + 2 * 4);

    Ok(())
}

#[test]
fn test_pure_append_chunk_count() -> Result<()> {
    for cap in 1..=4 {
        for n in 0..=13usize {
            let mut store = chunked(cap * 8)?;
            for v in 0..n {
                store.insert_slot(store.len(), &slot(v as u64))?;
            }
            assert_eq!(store.chunk_count(), n.div_ceil(cap), "cap={cap} n={n}");
        }
    }
    Ok(())
}

#[test]
fn test_single_slot_chunks_release_on_removal() -> Result<()> {
    let mut store = chunked(8)?;
    for v in 0..3 {
        store.insert_slot(store.len(), &slot(v))?;
    }
    assert_eq!(store.chunk_count(), 3);

    store.remove_slot(2)?;
    assert_eq!(store.chunk_count(), 2);
    store.remove_slot(1)?;
    assert_eq!(store.chunk_count(), 1);
    store.remove_slot(0)?;
    assert_eq!(store.chunk_count(), 0);

    assert!(store.is_empty());
    assert_eq!(store.backing().len(), 0);
    assert_eq!(store.manager().allocated_len(), 0);

    Ok(())
}

#[test]
fn test_removal_only_destroys_emptied_chunks() -> Result<()> {
    let mut store = chunked(16)?;
    for v in 0..6 {
        store.insert_slot(store.len(), &slot(v))?;
    }
    assert_eq!(occupancies(&store), vec![2, 2, 2]);

    // Multi-slot chunk: count unchanged
    store.remove_slot(3)?;
    assert_eq!(occupancies(&store), vec![2, 1, 2]);

    // Under-full neighbours are not merged
    store.remove_slot(3)?;
    assert_eq!(occupancies(&store), vec![2, 1, 1]);

    // Sole slot of the middle chunk
    store.remove_slot(2)?;
    assert_eq!(occupancies(&store), vec![2, 1]);
    assert_eq!(read_u64s(&store)?, vec![0, 1, 5]);

    Ok(())
}

#[test]
fn test_insert_into_full_chunk_splits_after_new_slot() -> Result<()> {
    let mut store = chunked(24)?;
    for v in 0..6 {
        store.insert_slot(store.len(), &slot(v))?;
    }
    assert_eq!(store.chunk_count(), 2);

    store.insert_slot(1, &slot(100))?;
    assert_eq!(occupancies(&store), vec![2, 2, 3]);
    assert_eq!(read_u64s(&store)?, vec![0, 100, 1, 2, 3, 4, 5]);

    // Room in the split-off chunk: no new chunk
    store.insert_slot(2, &slot(101))?;
    assert_eq!(occupancies(&store), vec![2, 3, 3]);
    assert_eq!(read_u64s(&store)?, vec![0, 100, 101, 1, 2, 3, 4, 5]);

    Ok(())
}

#[test]
fn test_ascending_inserts_pack_chunks() -> Result<()> {
    let mut store = chunked(24)?;
    for v in 0..6 {
        store.insert_slot(store.len(), &slot(v))?;
    }
    assert_eq!(store.chunk_count(), 2);

    for (i, v) in (100..107).enumerate() {
        store.insert_slot(2 + i, &slot(v))?;
    }

    assert_eq!(store.len(), 13);
    assert_eq!(store.chunk_count(), 5);
    assert_eq!(occupancies(&store), vec![3, 3, 3, 1, 3]);
    assert_eq!(
        read_u64s(&store)?,
        vec![0, 1, 100, 101, 102, 103, 104, 105, 106, 2, 3, 4, 5]
    );

    Ok(())
}

#[test]
fn test_released_ranges_are_reused() -> Result<()> {
    let mut store = chunked(16)?;
    for v in 0..6 {
        store.insert_slot(store.len(), &slot(v))?;
    }

    // Empty the first chunk, freeing bytes 0..16
    store.remove_slot(0)?;
    store.remove_slot(0)?;
    assert_eq!(store.chunk_count(), 2);
    assert_eq!(store.manager().allocated_len(), 48);

    // A split takes the freed range
    store.insert_slot(0, &slot(9))?;
    store.insert_slot(0, &slot(8))?;
    assert_eq!(store.manager().descriptors()[1].start(), 0);
    assert_eq!(store.manager().allocated_len(), 48);
    assert_eq!(read_u64s(&store)?, vec![8, 9, 2, 3, 4, 5]);

    Ok(())
}

#[test]
fn test_chunked_matches_reference_model() -> Result<()> {
    let mut store = chunked(40)?;
    let mut model: Vec<u64> = vec![];
    let mut seed = 0x2545_f491_4f6c_dd1d_u64;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed
    };

    for step in 0..2_000u64 {
        let roll = next();
        if model.is_empty() || roll % 3 != 0 {
            let index = (next() as usize) % (model.len() + 1);
            store.insert_slot(index, &slot(step))?;
            model.insert(index, step);
        } else {
            let index = (next() as usize) % model.len();
            store.remove_slot(index)?;
            model.remove(index);
        }

        assert_eq!(store.len(), model.len());
        assert!(
            store
                .manager()
                .descriptors()
                .iter()
                .all(|d| (1..=store.capacity()).contains(&d.occupied()))
        );
    }

    assert_eq!(read_u64s(&store)?, model);

    Ok(())
}

#[test]
fn test_chunked_over_file() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("chunks");

    let mut store = ChunkedByteStore::new(FileByteStore::create_at(&path)?, 8, 32)?;
    for v in 0..10 {
        store.insert_slot(0, &slot(v))?;
    }
    store.write_slot(9, &slot(42))?;
    assert_eq!(read_u64s(&store)?, vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 42]);

    store.close()?;
    assert!(matches!(store.write_slot(0, &slot(1)), Err(Error::Closed)));

    Ok(())
}

#[test]
#[cfg(target_pointer_width = "64")]
fn test_file_usable_after_failed_growth() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("bytes");
    let mut store = FileByteStore::create_at(&path)?;
    store.write(0, &slot(1))?;

    // The file can't be sized past i64::MAX, so growing there fails.
    assert!(matches!(store.write(1 << 62, &slot(2)), Err(Error::IO(_))));

    assert!(!store.is_closed());
    assert_eq!(store.len(), 8);
    assert_eq!(store.read(0, 8)?, slot(1));

    store.write(8, &slot(3))?;
    store.close()?;

    let store = FileByteStore::open(&path)?;
    assert_eq!(store.read(0, 16)?, [slot(1), slot(3)].concat());

    Ok(())
}

/// In-memory store whose next write, copy or truncation fails once
/// `fail_in` counts down to zero. The failure fires once, then the counter
/// disarms itself.
#[derive(Debug)]
struct FlakyStore {
    inner: ArrayByteStore,
    fail_in: Rc<Cell<Option<usize>>>,
}

impl FlakyStore {
    fn tick(&self) -> Result<()> {
        match self.fail_in.get() {
            Some(0) => {
                self.fail_in.set(None);
                Err(Error::IO(io::Error::other("injected failure")))
            }
            Some(n) => {
                self.fail_in.set(Some(n - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ByteStore for FlakyStore {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn read_into(&self, offset: usize, buf: &mut [u8]) -> Result<()> {
        self.inner.read_into(offset, buf)
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<()> {
        self.tick()?;
        self.inner.write(offset, data)
    }

    fn truncate(&mut self, len: usize) -> Result<()> {
        self.tick()?;
        self.inner.truncate(len)
    }

    fn copy_within(&mut self, src: usize, dst: usize, len: usize) -> Result<()> {
        self.tick()?;
        self.inner.copy_within(src, dst, len)
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

fn flaky(chunk_bytes: usize) -> Result<(ChunkedByteStore<FlakyStore>, Rc<Cell<Option<usize>>>)> {
    let fail_in = Rc::new(Cell::new(None));
    let backing = FlakyStore {
        inner: ArrayByteStore::new(),
        fail_in: fail_in.clone(),
    };
    Ok((ChunkedByteStore::new(backing, 8, chunk_bytes)?, fail_in))
}

#[test]
fn test_failed_split_leaves_chunks_intact() -> Result<()> {
    let (mut store, fail_in) = flaky(16)?;
    store.insert_slot(0, &slot(0))?;
    store.insert_slot(1, &slot(1))?;
    assert_eq!(occupancies(&store), vec![2]);

    // Fails moving the displaced slot, then writing the new one.
    for writes_before_failure in [0, 1] {
        fail_in.set(Some(writes_before_failure));
        assert!(matches!(store.insert_slot(1, &slot(9)), Err(Error::IO(_))));

        assert_eq!(read_u64s(&store)?, vec![0, 1]);
        assert_eq!(occupancies(&store), vec![2]);
        assert_eq!(store.chunk_count(), 1);
    }

    store.insert_slot(1, &slot(9))?;
    assert_eq!(read_u64s(&store)?, vec![0, 9, 1]);
    assert_eq!(occupancies(&store), vec![2, 1]);

    Ok(())
}

#[test]
fn test_failed_shift_restores_slots() -> Result<()> {
    let (mut store, fail_in) = flaky(32)?;
    for v in 0..3 {
        store.insert_slot(v as usize, &slot(v))?;
    }

    // The slots shift, then the new slot's write fails.
    fail_in.set(Some(1));
    assert!(matches!(store.insert_slot(0, &slot(9)), Err(Error::IO(_))));
    assert_eq!(read_u64s(&store)?, vec![0, 1, 2]);
    assert_eq!(occupancies(&store), vec![3]);

    store.insert_slot(0, &slot(9))?;
    assert_eq!(read_u64s(&store)?, vec![9, 0, 1, 2]);

    Ok(())
}

#[test]
fn test_failed_chunk_destroy_keeps_slot() -> Result<()> {
    let (mut store, fail_in) = flaky(8)?;
    for v in 0..3 {
        store.insert_slot(v as usize, &slot(v))?;
    }
    assert_eq!(store.chunk_count(), 3);

    // Fails on the slot copy, then on trimming the released range.
    for ops_before_failure in [0, 1] {
        fail_in.set(Some(ops_before_failure));
        assert!(matches!(store.remove_slot(2), Err(Error::IO(_))));

        assert_eq!(read_u64s(&store)?, vec![0, 1, 2]);
        assert_eq!(store.chunk_count(), 3);
        assert_eq!(store.manager().allocated_len(), 24);
    }

    store.remove_slot(2)?;
    assert_eq!(read_u64s(&store)?, vec![0, 1]);
    assert_eq!(store.chunk_count(), 2);
    assert_eq!(store.backing().len(), 16);

    Ok(())
}
