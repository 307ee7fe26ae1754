use eframe::egui;
use egui::{Color32, Rect, Sense, Stroke, Vec2};
use image::RgbaImage;
use std::time::Instant;

use crate::grid::{self, Cell, PixelColor};
use crate::history::HistoryTimeline;
use crate::pixels::PixelStore;
use crate::render::{BoardRenderer, SURFACE_PX};
use crate::theme;
use crate::throttle::MoveThrottle;

// ============================================================================
// PIXEL EVENT — the side channel to the progression collaborator
// ============================================================================

/// One accepted paint (`Some(color)`) or erase (`None`), queued for the
/// progression collaborator. This queue is the board's only coupling to the
/// rest of the application.
#[derive(Clone, Debug)]
pub struct PixelEvent {
    pub cell: Cell,
    pub color: Option<PixelColor>,
}

// ============================================================================
// CANVAS BOARD — input, stroke batching, history, rendering
// ============================================================================

/// The drawing surface. Exclusively owns the pixel store and the history
/// timeline; the shell only reads the derived undo/redo flags and calls the
/// exposed `undo`/`redo` actions.
///
/// A stroke runs from pointer-down to release and commits as a single
/// history entry on release — and only if it actually changed the board.
pub struct CanvasBoard {
    store: PixelStore,
    timeline: HistoryTimeline,
    throttle: MoveThrottle,
    renderer: BoardRenderer,

    is_drawing: bool,
    /// Set whenever the store (or a static layer) changed; cleared on compose.
    needs_compose: bool,

    events: Vec<PixelEvent>,
    last_flags: (bool, bool),
    flags_seen: bool,
}

impl Default for CanvasBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasBoard {
    pub fn new() -> Self {
        Self {
            store: PixelStore::new(),
            timeline: HistoryTimeline::default(),
            throttle: MoveThrottle::default(),
            renderer: BoardRenderer::new(),
            is_drawing: false,
            needs_compose: true,
            events: Vec::new(),
            last_flags: (false, false),
            flags_seen: false,
        }
    }

    pub fn store(&self) -> &PixelStore {
        &self.store
    }

    pub fn is_drawing(&self) -> bool {
        self.is_drawing
    }

    // ---- stroke lifecycle ----------------------------------------------

    /// Pointer-down. Always dispatches immediately — a tap paints even if
    /// the pointer never moves — and opens the throttle window for the
    /// moves that follow.
    pub fn begin_stroke(&mut self, cell: Option<Cell>, color: &PixelColor, eraser: bool, now: Instant) {
        self.is_drawing = true;
        self.throttle.reset();
        let _ = self.throttle.try_dispatch(now);
        if let Some(cell) = cell {
            self.apply_tool(cell, color, eraser);
        }
    }

    /// Pointer-move during a stroke. Out-of-bounds positions arrive as
    /// `None` and mutate nothing; in-bounds moves are rate-limited.
    pub fn stroke_move(&mut self, cell: Option<Cell>, color: &PixelColor, eraser: bool, now: Instant) {
        if !self.is_drawing {
            return;
        }
        let Some(cell) = cell else { return };
        if self.throttle.try_dispatch(now) {
            self.apply_tool(cell, color, eraser);
        }
    }

    /// Pointer-release. Commits the whole stroke as one history entry when
    /// the board content changed since the last committed snapshot.
    pub fn end_stroke(&mut self) {
        if !self.is_drawing {
            return;
        }
        self.is_drawing = false;
        self.throttle.reset();
        self.timeline.commit(&self.store);
    }

    fn apply_tool(&mut self, cell: Cell, color: &PixelColor, eraser: bool) {
        let (next, emitted) = if eraser {
            (self.store.with_erased(cell), None)
        } else {
            (self.store.with_painted(cell, color.clone()), Some(color.clone()))
        };
        // `None` = idempotent no-op: no mutation, no event, no re-render.
        if let Some(next) = next {
            self.store = next;
            self.needs_compose = true;
            self.events.push(PixelEvent {
                cell,
                color: emitted,
            });
        }
    }

    // ---- interaction bridge ----------------------------------------------

    pub fn undo(&mut self) -> bool {
        match self.timeline.undo() {
            Some(snapshot) => {
                self.store = snapshot;
                self.needs_compose = true;
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.timeline.redo() {
            Some(snapshot) => {
                self.store = snapshot;
                self.needs_compose = true;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.timeline.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.timeline.can_redo()
    }

    /// Change-detecting view of the undo/redo availability flags: returns
    /// `Some((can_undo, can_redo))` only when they differ from the last
    /// reported pair (the immediate-mode analog of a history-change callback).
    pub fn poll_history_change(&mut self) -> Option<(bool, bool)> {
        let flags = (self.can_undo(), self.can_redo());
        if self.flags_seen && flags == self.last_flags {
            return None;
        }
        self.last_flags = flags;
        self.flags_seen = true;
        Some(flags)
    }

    /// Drain the queued pixel events for the progression collaborator.
    pub fn take_events(&mut self) -> Vec<PixelEvent> {
        std::mem::take(&mut self.events)
    }

    /// Compose the current board for PNG export.
    pub fn export_raster(&self) -> RgbaImage {
        self.renderer.compose(&self.store)
    }

    // ---- egui integration ----------------------------------------------

    /// Draw the board and handle pointer input for this frame.
    pub fn show(&mut self, ui: &mut egui::Ui, brush_color: &PixelColor, is_eraser: bool) {
        // Square board, capped at native raster size.
        let avail = ui.available_size();
        let side = avail.x.min(avail.y).min(SURFACE_PX as f32).max(64.0);
        let (rect, response) =
            ui.allocate_exact_size(Vec2::splat(side), Sense::click_and_drag().union(Sense::hover()));

        self.handle_input(ui, rect, &response, brush_color, is_eraser);

        // Late async template arrival forces one re-compose.
        if self.renderer.poll_template() {
            self.needs_compose = true;
        }
        if self.renderer.template_pending() {
            ui.ctx().request_repaint_after(std::time::Duration::from_millis(100));
        }

        if self.needs_compose {
            let raster = self.renderer.compose(&self.store);
            self.renderer.update_texture(ui.ctx(), &raster);
            self.needs_compose = false;
        }

        let painter = ui.painter_at(rect.expand(4.0));
        if let Some(texture) = self.renderer.texture() {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
        painter.rect_stroke(rect.expand(2.0), 0.0, Stroke::new(4.0, theme::BRAND_DARK));

        if response.hovered() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Crosshair);
        }
    }

    fn handle_input(
        &mut self,
        ui: &egui::Ui,
        rect: Rect,
        response: &egui::Response,
        brush_color: &PixelColor,
        is_eraser: bool,
    ) {
        let now = Instant::now();
        let pointer_pos = ui.input(|i| i.pointer.interact_pos());
        let primary_down = ui.input(|i| i.pointer.primary_down());
        let primary_pressed = ui.input(|i| i.pointer.primary_pressed());

        if primary_pressed && response.hovered() {
            let cell = pointer_pos.and_then(|pos| grid::cell_at(pos, rect));
            self.begin_stroke(cell, brush_color, is_eraser, now);
        } else if self.is_drawing && primary_down {
            // Feed every sub-frame move through the throttle; egui folds the
            // primary touch point into these pointer events.
            let moves: Vec<egui::Pos2> = ui.input(|i| {
                i.events
                    .iter()
                    .filter_map(|e| match e {
                        egui::Event::PointerMoved(pos) => Some(*pos),
                        _ => None,
                    })
                    .collect()
            });
            for pos in moves {
                self.stroke_move(grid::cell_at(pos, rect), brush_color, is_eraser, now);
            }
        }

        if self.is_drawing && !primary_down {
            self.end_stroke();
        }
    }
}
