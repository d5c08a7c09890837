use std::time::Instant;

use serde::{Deserialize, Serialize};
use slotlist::{ObjectSerializer, PrimitiveSerializer, Result, StoreOptions};

const COUNT: u64 = 100_000;
const MIDDLE_INSERTS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    key: u64,
    label: String,
}

fn main() -> Result<()> {
    let temp = tempfile::TempDir::new()?;

    for options in [
        StoreOptions::new(),
        StoreOptions::new().with_chunk_bytes(64 * 1024),
        StoreOptions::new()
            .with_chunk_bytes(64 * 1024)
            .with_buffer_size(256),
    ] {
        let path = temp.path().join("values");
        let mut list = options.create_file(&path, PrimitiveSerializer::<u64>::natural())?;

        let start = Instant::now();
        list.add_all(0..COUNT)?;
        for i in 0..MIDDLE_INSERTS {
            list.insert((COUNT / 2) as usize, i)?;
        }
        list.flush()?;

        println!(
            "{options:?}: {} elements, {:?} chunks, {:?}",
            list.len(),
            list.chunk_count(),
            start.elapsed()
        );
        list.close()?;
    }

    let path = temp.path().join("entries");
    let serializer = ObjectSerializer::<Entry>::new(64)?;
    {
        let mut list = StoreOptions::new().create_file(&path, serializer)?;
        list.add_all((0..10).map(|key| Entry {
            key,
            label: format!("entry #{key}"),
        }))?;
        list.close()?;
    }

    let list = StoreOptions::new().open_file(&path, serializer)?;
    for entry in &list {
        println!("{:?}", entry?);
    }

    Ok(())
}
