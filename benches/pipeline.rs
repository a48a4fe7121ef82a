use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stash_pack::{Key, Pipeline, Value};
use std::collections::BTreeMap;

/// A save blob shaped like real player data: a few scalars, some repetitive
/// string content, and a chunk of structured progress state.
fn player_blob() -> Value {
    let mut save = BTreeMap::new();
    save.insert(Key::from("name"), Value::from("benchmark_player"));
    save.insert(Key::from("level"), Value::from(41i64));
    save.insert(Key::from("xp"), Value::from(1_284_551i64));
    let inventory: Vec<Value> = (0..64)
        .map(|i| {
            let mut item = BTreeMap::new();
            item.insert(Key::from("id"), Value::from(format!("item_{:02}", i % 8)));
            item.insert(Key::from("count"), Value::from((i % 17) as i64));
            Value::Map(item)
        })
        .collect();
    save.insert(Key::from("inventory"), Value::Array(inventory));
    let mut quests = stash_pack::BitArray::new(577, false);
    for i in (0..577).step_by(9) {
        quests.set(i, true).unwrap();
    }
    save.insert(Key::from("quests"), Value::Bits(quests));
    Value::Map(save)
}

fn bench_pipeline(c: &mut Criterion) {
    let value = player_blob();
    let mut pipeline = Pipeline::new();
    let stored = pipeline.compress(&value).unwrap();

    c.bench_function("compress_player_blob", |b| {
        b.iter(|| pipeline.compress(black_box(&value)).unwrap())
    });
    c.bench_function("decompress_player_blob", |b| {
        b.iter(|| pipeline.decompress(black_box(&stored.bytes)).unwrap())
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
