use common::StreamId;
use criterion::{Criterion, criterion_group, criterion_main};
use ledger::{AppendOptions, InMemoryLedger, LedgerEntry, LedgerExt, Revision, store::Ledger};

fn make_entry(stream_id: StreamId, revision: i64) -> LedgerEntry {
    LedgerEntry::builder()
        .stream_id(stream_id)
        .stream_type("Shipment")
        .entry_type("ShipmentCreated")
        .revision(Revision::new(revision))
        .payload_raw(serde_json::json!({
            "type": "ShipmentCreated",
            "data": {
                "tracking_number": "SHP123456780001",
                "order_id": "00000000-0000-0000-0000-000000000001"
            }
        }))
        .build()
}

fn bench_append_single_entry(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger/append_single_entry", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = InMemoryLedger::new();
                let stream_id = StreamId::new();
                let entry = make_entry(stream_id, 1);
                ledger
                    .append(vec![entry], AppendOptions::new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_append_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger/append_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = InMemoryLedger::new();
                let stream_id = StreamId::new();
                let entries: Vec<LedgerEntry> =
                    (1..=10).map(|r| make_entry(stream_id, r)).collect();
                ledger.append(entries, AppendOptions::new()).await.unwrap();
            });
        });
    });
}

fn bench_append_with_revision_check(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger/append_with_revision_check", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = InMemoryLedger::new();
                let stream_id = StreamId::new();
                let entry = make_entry(stream_id, 1);
                ledger
                    .append(vec![entry], AppendOptions::expect_new())
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_entries_for_stream(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryLedger::new();
    let stream_id = StreamId::new();

    // Pre-populate with 100 entries
    rt.block_on(async {
        let entries: Vec<LedgerEntry> = (1..=100).map(|r| make_entry(stream_id, r)).collect();
        ledger.append(entries, AppendOptions::new()).await.unwrap();
    });

    c.bench_function("ledger/entries_for_stream_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.entries_for_stream(stream_id).await.unwrap();
            });
        });
    });
}

fn bench_entries_from_revision(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryLedger::new();
    let stream_id = StreamId::new();

    // Pre-populate with 100 entries
    rt.block_on(async {
        let entries: Vec<LedgerEntry> = (1..=100).map(|r| make_entry(stream_id, r)).collect();
        ledger.append(entries, AppendOptions::new()).await.unwrap();
    });

    c.bench_function("ledger/entries_from_revision_50", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger
                    .entries_for_stream_from(stream_id, Revision::new(50))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_stream_all_entries(c: &mut Criterion) {
    use futures_util::StreamExt;

    let rt = tokio::runtime::Runtime::new().unwrap();
    let ledger = InMemoryLedger::new();

    // Pre-populate with 1000 entries across 10 streams
    rt.block_on(async {
        for _ in 0..10 {
            let stream_id = StreamId::new();
            let entries: Vec<LedgerEntry> = (1..=100).map(|r| make_entry(stream_id, r)).collect();
            ledger.append(entries, AppendOptions::new()).await.unwrap();
        }
    });

    c.bench_function("ledger/stream_1000_entries", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut stream = ledger.stream_all_entries().await.unwrap();
                let mut count = 0;
                while let Some(result) = stream.next().await {
                    result.unwrap();
                    count += 1;
                }
                assert_eq!(count, 1000);
            });
        });
    });
}

fn bench_append_entry_ext(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ledger/append_single_via_ext", |b| {
        b.iter(|| {
            rt.block_on(async {
                let ledger = InMemoryLedger::new();
                let stream_id = StreamId::new();
                let entry = make_entry(stream_id, 1);
                ledger
                    .append_entry(entry, AppendOptions::new())
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_append_single_entry,
    bench_append_batch_10,
    bench_append_with_revision_check,
    bench_entries_for_stream,
    bench_entries_from_revision,
    bench_stream_all_entries,
    bench_append_entry_ext,
);
criterion_main!(benches);
