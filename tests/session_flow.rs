//! End-to-end session flow: strokes on the board feed the progression
//! router, the invisible wallet comes online, and the piece completes.

use std::time::{Duration, Instant};

use inkpink::board::CanvasBoard;
use inkpink::grid::{Cell, PixelColor};
use inkpink::history::HISTORY_CAPACITY;
use inkpink::progression::{
    CompletionMethod, EventKind, MOCK_WALLET_ADDRESS, ProgressionRouter, XP_PER_PIXEL,
};
use inkpink::render::{CELL_PX, SURFACE_PX};

fn scratch_router() -> ProgressionRouter {
    let path = std::env::temp_dir().join(format!(
        "inkpink-session-flow-{}.bin",
        uuid::Uuid::new_v4()
    ));
    ProgressionRouter::with_snapshot_path(path)
}

fn pink() -> PixelColor {
    PixelColor::parse("#ed00b2").unwrap()
}

/// Paint one cell as its own stroke, spacing strokes out in time so the
/// move throttle never interferes.
fn tap(board: &mut CanvasBoard, x: u32, y: u32, at: Instant) {
    board.begin_stroke(Cell::new(x, y), &pink(), false, at);
    board.end_stroke();
}

#[test]
fn painting_accrues_xp_and_activates_the_wallet() {
    let mut board = CanvasBoard::new();
    let mut router = scratch_router();
    let rx = router.subscribe();
    let t0 = Instant::now();

    // Ten pixels is exactly the activation threshold.
    for i in 0..10 {
        tap(&mut board, i, 0, t0 + Duration::from_millis(100 * i as u64));
    }
    for event in board.take_events() {
        router.log_event(
            EventKind::DrawPixel {
                cell: event.cell,
                color: event.color,
            },
            t0,
        );
    }

    assert_eq!(router.wallet_state().xp, 10 * XP_PER_PIXEL);
    assert!(!router.wallet_state().is_active);

    // The simulated provider takes half a second; after that the wallet is
    // live with the activation drop credited.
    router.poll(t0 + Duration::from_secs(2));
    let wallet = router.wallet_state();
    assert!(wallet.is_active);
    assert_eq!(wallet.address.as_deref(), Some(MOCK_WALLET_ADDRESS));
    assert_eq!(wallet.balance, 10);

    // Subscribers saw the initial state and every change since.
    let states: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert_eq!(states.first().map(|s| s.xp), Some(0));
    assert!(states.last().is_some_and(|s| s.is_active));
}

#[test]
fn completing_a_piece_grants_the_bonus_on_top() {
    let mut router = scratch_router();
    let t0 = Instant::now();
    router.log_event(
        EventKind::DrawPixel {
            cell: Cell::new(0, 0).unwrap(),
            color: Some(pink()),
        },
        t0,
    );
    router.log_event(
        EventKind::DrawComplete {
            method: CompletionMethod::Mint,
        },
        t0,
    );
    assert_eq!(router.wallet_state().balance, 100);
    assert_eq!(router.wallet_state().xp, XP_PER_PIXEL);
}

#[test]
fn erasing_emits_colorless_events_that_still_earn_xp() {
    let mut board = CanvasBoard::new();
    let mut router = scratch_router();
    let t0 = Instant::now();

    tap(&mut board, 5, 5, t0);
    board.begin_stroke(Cell::new(5, 5), &pink(), true, t0 + Duration::from_secs(1));
    board.end_stroke();

    let events = board.take_events();
    assert_eq!(events.len(), 2);
    assert!(events[1].color.is_none());

    for event in events {
        router.log_event(
            EventKind::DrawPixel {
                cell: event.cell,
                color: event.color,
            },
            t0,
        );
    }
    assert_eq!(router.wallet_state().xp, 2 * XP_PER_PIXEL);
}

#[test]
fn timeline_stays_bounded_over_a_long_session() {
    let mut board = CanvasBoard::new();
    let t0 = Instant::now();

    // More strokes than the timeline holds.
    for i in 0..(HISTORY_CAPACITY + 10) {
        let (x, y) = ((i % 32) as u32, (i / 32) as u32);
        tap(&mut board, x, y, t0 + Duration::from_millis(100 * i as u64));
    }

    let mut undos = 0;
    while board.undo() {
        undos += 1;
    }
    // The seeded baseline fell off the front, so undo bottoms out on a
    // non-empty board after capacity-1 steps.
    assert_eq!(undos, HISTORY_CAPACITY - 1);
    assert!(!board.store().is_empty());

    let mut redos = 0;
    while board.redo() {
        redos += 1;
    }
    assert_eq!(redos, undos);
    assert_eq!(board.store().len(), HISTORY_CAPACITY + 10);
}

#[test]
fn exported_raster_matches_the_board() {
    let mut board = CanvasBoard::new();
    tap(&mut board, 3, 4, Instant::now());

    let raster = board.export_raster();
    assert_eq!(raster.dimensions(), (SURFACE_PX, SURFACE_PX));
    let px = raster.get_pixel(3 * CELL_PX + CELL_PX / 2, 4 * CELL_PX + CELL_PX / 2);
    assert_eq!(px.0, [0xed, 0x00, 0xb2, 255]);
}
