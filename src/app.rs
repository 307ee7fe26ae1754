use eframe::egui;
use egui::{Align2, Color32, RichText, Stroke, Vec2};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::board::CanvasBoard;
use crate::grid::PixelColor;
use crate::progression::{CompletionMethod, EventKind, ProgressionRouter, WalletState};
use crate::scheduler::TaskScheduler;
use crate::{io, log_info, t, theme};

/// Toasts dismiss themselves after this long.
const NOTIFICATION_LIFETIME: Duration = Duration::from_secs(5);
/// Simulated on-chain mint latency.
const MINT_DURATION: Duration = Duration::from_secs(2);

// ============================================================================
// APP STAGE
// ============================================================================

/// Top-level screen the shell is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppStage {
    Onboarding,
    Canvas,
    Minting,
    Completed,
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum NotificationKind {
    Info,
    Success,
    Error,
}

impl NotificationKind {
    fn fill(&self) -> Color32 {
        match self {
            NotificationKind::Info => theme::BRAND_DARK,
            NotificationKind::Success => theme::BRAND_PINK,
            NotificationKind::Error => Color32::from_rgb(0xe7, 0x4c, 0x3c),
        }
    }
}

struct Notification {
    id: u64,
    kind: NotificationKind,
    text: String,
}

// ============================================================================
// APP SHELL
// ============================================================================

/// Delayed UI work, polled once per frame.
enum AppTask {
    DismissNotification(u64),
    FinishMint,
}

pub struct InkPinkApp {
    stage: AppStage,
    board: CanvasBoard,

    // Progression collaborator and its subscription.
    router: ProgressionRouter,
    wallet_rx: mpsc::Receiver<WalletState>,
    wallet: WalletState,
    wallet_was_active: bool,

    // Tool state.
    current_color: PixelColor,
    is_eraser: bool,
    can_undo: bool,
    can_redo: bool,

    // At most one toast on screen, like the original layout.
    notification: Option<Notification>,
    next_notification_id: u64,
    /// Handle of the pending auto-dismiss task for the current toast.
    dismiss_task: Option<u64>,

    scheduler: TaskScheduler<AppTask>,
}

impl InkPinkApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        theme::apply(&cc.egui_ctx);
        Self::with_router(ProgressionRouter::new())
    }

    fn with_router(mut router: ProgressionRouter) -> Self {
        let wallet_rx = router.subscribe();
        let wallet = router.wallet_state().clone();
        let wallet_was_active = wallet.is_active;

        Self {
            stage: AppStage::Onboarding,
            board: CanvasBoard::new(),
            router,
            wallet_rx,
            wallet,
            wallet_was_active,
            current_color: theme::default_brush(),
            is_eraser: false,
            can_undo: false,
            can_redo: false,
            notification: None,
            next_notification_id: 0,
            dismiss_task: None,
            scheduler: TaskScheduler::new(),
        }
    }

    /// Show a toast, replacing the current one. The replaced toast's
    /// auto-dismiss task is cancelled so it can never fire late.
    fn push_notification(&mut self, kind: NotificationKind, text: String, now: Instant) {
        if let Some(task) = self.dismiss_task.take() {
            self.scheduler.cancel(task);
        }
        self.next_notification_id += 1;
        let id = self.next_notification_id;
        self.notification = Some(Notification { id, kind, text });
        self.dismiss_task = Some(self.scheduler.schedule(
            now,
            NOTIFICATION_LIFETIME,
            AppTask::DismissNotification(id),
        ));
    }

    fn close_notification(&mut self) {
        if let Some(task) = self.dismiss_task.take() {
            self.scheduler.cancel(task);
        }
        self.notification = None;
    }

    // ---- timers and subscriptions ----------------------------------------

    fn process_tasks(&mut self, now: Instant) {
        self.router.poll(now);
        for task in self.scheduler.poll(now) {
            match task {
                AppTask::DismissNotification(id) => {
                    if self.notification.as_ref().is_some_and(|n| n.id == id) {
                        self.notification = None;
                        self.dismiss_task = None;
                    }
                }
                AppTask::FinishMint => self.finish_mint(now),
            }
        }
    }

    fn drain_wallet_updates(&mut self, now: Instant) {
        while let Ok(state) = self.wallet_rx.try_recv() {
            if state.is_active && !self.wallet_was_active {
                log_info!("Wallet activated: {:?}", state.address);
                self.push_notification(
                    NotificationKind::Success,
                    t!("notifications.wallet_activated"),
                    now,
                );
            }
            self.wallet_was_active = state.is_active;
            self.wallet = state;
        }
    }

    /// Wake the UI when the next timer fires, instead of repainting blindly.
    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let due = [
            self.router.next_due_in(now),
            self.scheduler.next_due_in(now),
        ]
        .into_iter()
        .flatten()
        .min();
        if let Some(wait) = due {
            ctx.request_repaint_after(wait);
        }
    }

    // ---- completion actions ----------------------------------------------

    fn handle_download(&mut self, now: Instant) {
        if self.board.store().is_empty() {
            self.push_notification(
                NotificationKind::Error,
                t!("notifications.download_error_empty"),
                now,
            );
            return;
        }
        // Dialog cancelled: not an error, nothing to report.
        let Some(path) = io::prompt_export_path() else {
            return;
        };

        let raster = self.board.export_raster();
        match io::save_png(&path, &raster) {
            Ok(()) => {
                log_info!("Exported board to {:?}", path);
                self.push_notification(
                    NotificationKind::Success,
                    t!("notifications.download_started"),
                    now,
                );
                self.router.log_event(
                    EventKind::DrawComplete {
                        method: CompletionMethod::Download,
                    },
                    now,
                );
            }
            Err(e) => {
                crate::log_err!("Export failed: {}", e);
                self.push_notification(
                    NotificationKind::Error,
                    t!("notifications.download_error"),
                    now,
                );
            }
        }
    }

    fn handle_mint(&mut self, now: Instant) {
        if !self.wallet.is_active {
            self.push_notification(
                NotificationKind::Error,
                t!("notifications.minting_error_no_wallet"),
                now,
            );
            return;
        }
        self.stage = AppStage::Minting;
        self.push_notification(NotificationKind::Info, t!("notifications.minting"), now);
        self.scheduler.schedule(now, MINT_DURATION, AppTask::FinishMint);
    }

    fn finish_mint(&mut self, now: Instant) {
        self.stage = AppStage::Completed;
        self.push_notification(
            NotificationKind::Success,
            t!("notifications.minting_success"),
            now,
        );
        self.router.log_event(
            EventKind::DrawComplete {
                method: CompletionMethod::Mint,
            },
            now,
        );
    }

    // ---- views -------------------------------------------------------------

    fn show_onboarding(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.25);
                ui.label(
                    RichText::new(t!("app.title"))
                        .size(64.0)
                        .strong()
                        .color(theme::BRAND_DARK),
                );
                ui.label(
                    RichText::new(t!("app.version"))
                        .size(14.0)
                        .color(theme::BRAND_PINK),
                );
                ui.add_space(24.0);
                ui.add(
                    egui::Label::new(RichText::new(t!("app.subtitle")).size(14.0))
                        .wrap(true),
                );
                ui.add_space(32.0);

                let start = egui::Button::new(
                    RichText::new(t!("onboarding.start_session"))
                        .size(18.0)
                        .strong()
                        .color(theme::BRAND_WHITE),
                )
                .fill(theme::BRAND_DARK)
                .min_size(Vec2::new(220.0, 48.0));
                if ui.add(start).clicked() {
                    self.stage = AppStage::Canvas;
                }

                ui.add_space(48.0);
                ui.label(
                    RichText::new(t!("app.powered_by"))
                        .size(10.0)
                        .color(theme::BRAND_DARK.gamma_multiply(0.5)),
                );
            });
        });
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(t!("app.title"))
                        .size(20.0)
                        .strong()
                        .color(theme::BRAND_DARK),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    // Wallet widget: balance once active, OFFLINE before.
                    if self.wallet.is_active {
                        ui.label(
                            RichText::new(format!("{} PINK", self.wallet.balance))
                                .strong()
                                .color(theme::BRAND_PINK),
                        );
                    } else {
                        ui.label(
                            RichText::new(t!("header.offline"))
                                .color(theme::BRAND_DARK.gamma_multiply(0.4)),
                        );
                    }

                    ui.add_space(12.0);

                    // XP meter toward the next level.
                    let progress = (self.wallet.xp as f32 / 100.0).min(1.0);
                    ui.add(
                        egui::ProgressBar::new(progress)
                            .desired_width(120.0)
                            .fill(theme::BRAND_PINK),
                    );
                    ui.label(RichText::new(t!("header.level")).size(11.0));
                });
            });
            ui.add_space(6.0);
        });
    }

    fn show_toolbar(&mut self, ctx: &egui::Context, now: Instant) {
        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.add_space(8.0);

            // Palette row.
            ui.horizontal(|ui| {
                for entry in theme::PALETTE {
                    let color = entry.color();
                    let selected = !self.is_eraser && color == self.current_color;
                    let size = Vec2::splat(if selected { 28.0 } else { 24.0 });
                    let (rect, response) = ui.allocate_exact_size(size, egui::Sense::click());
                    let stroke = if selected {
                        Stroke::new(3.0, theme::BRAND_DARK)
                    } else {
                        Stroke::new(1.0, theme::BRAND_DARK)
                    };
                    ui.painter().rect(rect, 0.0, entry.color32(), stroke);
                    let response = response.on_hover_text(t!(entry.name_key));
                    if response.clicked() {
                        self.current_color = color;
                        self.is_eraser = false;
                    }
                }
            });

            ui.add_space(6.0);

            // Tools and actions.
            ui.horizontal(|ui| {
                if ui
                    .selectable_label(!self.is_eraser, "🖌")
                    .on_hover_text(t!("canvas.brush_tool"))
                    .clicked()
                {
                    self.is_eraser = false;
                }
                if ui
                    .selectable_label(self.is_eraser, "◻")
                    .on_hover_text(t!("canvas.eraser_tool"))
                    .clicked()
                {
                    self.is_eraser = true;
                }

                ui.separator();

                if ui
                    .add_enabled(self.can_undo, egui::Button::new("↶"))
                    .on_hover_text(t!("canvas.undo"))
                    .clicked()
                {
                    self.board.undo();
                }
                if ui
                    .add_enabled(self.can_redo, egui::Button::new("↷"))
                    .on_hover_text(t!("canvas.redo"))
                    .clicked()
                {
                    self.board.redo();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let minting = self.stage == AppStage::Minting;
                    let mint_label = if minting {
                        t!("canvas.minting")
                    } else {
                        t!("canvas.mint")
                    };
                    let mint = egui::Button::new(
                        RichText::new(mint_label).strong().color(theme::BRAND_WHITE),
                    )
                    .fill(theme::BRAND_PINK);
                    if ui
                        .add_enabled(self.wallet.is_active && !minting, mint)
                        .clicked()
                    {
                        self.handle_mint(now);
                    }

                    if ui.button(t!("canvas.download")).clicked() {
                        self.handle_download(now);
                    }
                });
            });

            ui.add_space(8.0);
        });
    }

    fn show_board(&mut self, ctx: &egui::Context, now: Instant) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space((ui.available_height() - ui.available_width()).max(0.0) / 2.0);
                self.board.show(ui, &self.current_color, self.is_eraser);
            });
        });

        // Bridge the board's accepted pixel events into the progression
        // router, one draw.pixel per mutation.
        for event in self.board.take_events() {
            self.router.log_event(
                EventKind::DrawPixel {
                    cell: event.cell,
                    color: event.color,
                },
                now,
            );
        }
        if let Some((can_undo, can_redo)) = self.board.poll_history_change() {
            self.can_undo = can_undo;
            self.can_redo = can_redo;
        }
    }

    fn show_notification(&mut self, ctx: &egui::Context) {
        let Some(n) = &self.notification else { return };
        let fill = n.kind.fill();
        let text = n.text.clone();

        let mut dismissed = false;
        egui::Area::new(egui::Id::new("notification"))
            .anchor(Align2::CENTER_TOP, Vec2::new(0.0, 12.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::none()
                    .fill(fill)
                    .stroke(Stroke::new(2.0, theme::BRAND_DARK))
                    .inner_margin(egui::Margin::symmetric(14.0, 10.0))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.set_max_width(360.0);
                            ui.label(RichText::new(text).color(theme::BRAND_WHITE).size(13.0));
                            if ui
                                .button(RichText::new("✕").color(theme::BRAND_WHITE))
                                .clicked()
                            {
                                dismissed = true;
                            }
                        });
                    });
            });
        if dismissed {
            self.close_notification();
        }
    }

    fn show_completion_modal(&mut self, ctx: &egui::Context) {
        egui::Window::new(t!("completion.title"))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
            .show(ctx, |ui| {
                ui.add_space(8.0);
                ui.label(t!("completion.message", amount = 100));
                ui.add_space(16.0);
                ui.vertical_centered(|ui| {
                    let back = egui::Button::new(
                        RichText::new(t!("completion.back_to_studio"))
                            .strong()
                            .color(theme::BRAND_WHITE),
                    )
                    .fill(theme::BRAND_DARK);
                    if ui.add(back).clicked() {
                        self.stage = AppStage::Canvas;
                    }
                });
                ui.add_space(8.0);
            });
    }
}

impl eframe::App for InkPinkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.process_tasks(now);
        self.drain_wallet_updates(now);

        match self.stage {
            AppStage::Onboarding => self.show_onboarding(ctx),
            AppStage::Canvas | AppStage::Minting | AppStage::Completed => {
                self.show_header(ctx);
                self.show_toolbar(ctx, now);
                self.show_board(ctx, now);
                if self.stage == AppStage::Completed {
                    self.show_completion_modal(ctx);
                }
            }
        }

        self.show_notification(ctx);
        self.schedule_repaint(ctx, now);
    }
}
