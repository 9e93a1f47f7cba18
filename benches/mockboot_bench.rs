//! Criterion benchmarks for hot paths in the mock layer.
//!
//! Run with:
//!   cargo bench
//!
//! Covers:
//!   - Sync-event decoding (serde_json, including the malformed fallback)
//!   - Readiness snapshot reads (the per-render fast path)
//!   - Derived-list event application

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mockboot::readiness::{BootstrapStatus, ReadinessPublisher};
use mockboot::sync::{DerivedList, ListItem, SyncEvent};

// ─── Sync-event decoding ─────────────────────────────────────────────────────

static ADD_EVENT: &str = r#"{
    "action": "add",
    "item": { "id": "01HXYZ1234567890ABCDEFGHIJ", "name": "Grading Assistant" }
}"#;

static LEGACY_EVENT: &str = r#"{ "type": "agents-changed", "source": "sidebar" }"#;

fn bench_event_decode(c: &mut Criterion) {
    let add: serde_json::Value = serde_json::from_str(ADD_EVENT).unwrap();
    let legacy: serde_json::Value = serde_json::from_str(LEGACY_EVENT).unwrap();

    c.bench_function("decode_add_event", |b| {
        b.iter(|| {
            let event = SyncEvent::from_json(black_box(&add));
            black_box(event);
        });
    });

    c.bench_function("decode_legacy_event_fallback", |b| {
        b.iter(|| {
            let event = SyncEvent::from_json(black_box(&legacy));
            black_box(event);
        });
    });
}

// ─── Readiness snapshot ──────────────────────────────────────────────────────
//
// Every gated render slot reads the snapshot synchronously; this must stay a
// cheap borrow-and-copy.

fn bench_readiness(c: &mut Criterion) {
    let publisher = ReadinessPublisher::new();
    publisher.publish(BootstrapStatus::Success);
    publisher.mark_ready();

    c.bench_function("readiness_snapshot", |b| {
        b.iter(|| {
            let snap = black_box(&publisher).snapshot();
            black_box(snap);
        });
    });

    c.bench_function("stale_publish_is_cheap_noop", |b| {
        b.iter(|| {
            let changed = black_box(&publisher).publish(BootstrapStatus::Error);
            black_box(changed);
        });
    });
}

// ─── Derived-list application ────────────────────────────────────────────────

fn bench_list_apply(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();

    c.bench_function("list_insert_remove_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                let list = DerivedList::new();
                for i in 0..100 {
                    list.insert(ListItem::new(format!("agent-{i}"), format!("Agent {i}")))
                        .await;
                }
                for i in 0..100 {
                    list.remove(&format!("agent-{i}")).await;
                }
                black_box(list.len().await);
            });
        });
    });
}

// ─── Entry point ─────────────────────────────────────────────────────────────

criterion_group!(benches, bench_event_decode, bench_readiness, bench_list_apply);
criterion_main!(benches);
