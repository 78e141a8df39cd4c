use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use trellis_core::cell::{Cell, CellKey};
use trellis_core::graph::{CellGraph, ChangeOrigin, Diagram, attributes};
use trellis_core::undo::{Entry, Transaction, optimize_history};
use trellis_core::{Board, UndoConfig};

fn populated_board(cells: usize) -> (Board, Vec<CellKey>) {
    let mut board = Board::with_config(UndoConfig::unbounded());
    let keys = (0..cells)
        .map(|i| board.add_cell(Cell::element(format!("n{i}"))).unwrap())
        .collect();
    board.clear();
    (board, keys)
}

// ---------------------------------------------------------------------------
// Recording
// ---------------------------------------------------------------------------

fn bench_streaming_drag(c: &mut Criterion) {
    c.bench_function("record_drag_1000_moves", |b| {
        b.iter_batched(
            || populated_board(1),
            |(mut board, keys)| {
                board.start();
                for x in 0..1000 {
                    board
                        .set_interactive(keys[0], "position", json!({"x": x, "y": x}))
                        .unwrap();
                }
                black_box(board.stop());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_programmatic_edits(c: &mut Criterion) {
    c.bench_function("record_500_programmatic_edits", |b| {
        b.iter_batched(
            || populated_board(50),
            |(mut board, keys)| {
                for i in 0..500 {
                    board
                        .set(keys[i % keys.len()], "label", json!(i))
                        .unwrap();
                }
                black_box(board.reactor().history_len());
            },
            BatchSize::SmallInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Compaction
// ---------------------------------------------------------------------------

fn bench_optimize_large_transaction(c: &mut Criterion) {
    let mut diagram = Diagram::new();
    let keys: Vec<CellKey> = (0..100)
        .map(|i| diagram.add_cell(Cell::element(format!("n{i}"))).unwrap())
        .collect();
    for key in &keys {
        diagram
            .set(*key, attributes("position", json!(0)), ChangeOrigin::Programmatic)
            .unwrap();
    }
    diagram.drain_events();

    // 100 cells, 50 consecutive moves each, nested in groups of 10.
    let history: Vec<Transaction> = keys
        .iter()
        .flat_map(|key| {
            (0..50).map(move |step| {
                Transaction::from(Entry::Change {
                    key: *key,
                    delta: attributes("position", json!(step)),
                    renamed_from: None,
                })
            })
        })
        .collect::<Vec<_>>()
        .chunks(10)
        .map(|chunk| Transaction::Group(chunk.to_vec()))
        .collect();

    c.bench_function("optimize_5000_entries", |b| {
        b.iter_batched(
            || history.clone(),
            |history| black_box(optimize_history(&diagram, history)),
            BatchSize::LargeInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

fn bench_undo_redo_large_step(c: &mut Criterion) {
    c.bench_function("undo_redo_200_cell_step", |b| {
        b.iter_batched(
            || {
                let (mut board, keys) = populated_board(200);
                board.start();
                for key in &keys {
                    board.set(*key, "label", json!("changed")).unwrap();
                }
                board.stop();
                board
            },
            |mut board| {
                black_box(board.undo().unwrap());
                black_box(board.redo().unwrap());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_streaming_drag,
    bench_programmatic_edits,
    bench_optimize_large_transaction,
    bench_undo_redo_large_step,
);
criterion_main!(benches);
