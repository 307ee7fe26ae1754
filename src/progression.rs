use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::grid::{Cell, GRID_SIZE, PixelColor};
use crate::scheduler::TaskScheduler;
use crate::{log_err, log_info, log_warn};

/// XP granted per accepted paint/erase event.
pub const XP_PER_PIXEL: u32 = 5;
/// XP at which the invisible wallet is created (~10 pixels in).
pub const XP_WALLET_THRESHOLD: u32 = 50;
/// Address handed out by the simulated embedded-wallet provider.
pub const MOCK_WALLET_ADDRESS: &str = "0x71C...9A23";

/// Simulated embedded-wallet creation latency.
const WALLET_CREATION_DELAY: Duration = Duration::from_millis(500);
/// Tokens dropped when the wallet activates.
const ACTIVATION_DROP: u32 = 10;
/// Token bonus for completing a piece (download or mint).
const COMPLETION_BONUS: u32 = 100;

const SESSION_FILE: &str = "session.bin";

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionMethod {
    Download,
    Mint,
}

impl CompletionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionMethod::Download => "download",
            CompletionMethod::Mint => "mint",
        }
    }
}

/// Session events routed through the mock backend.
#[derive(Clone, Debug)]
pub enum EventKind {
    /// A pixel was painted (`Some(color)`) or erased (`None`).
    DrawPixel { cell: Cell, color: Option<PixelColor> },
    /// The piece was finished via download or mint.
    DrawComplete { method: CompletionMethod },
    /// The wallet came online (emitted by the router itself).
    WalletInit { address: String },
    /// Reserved for the claim flow.
    ClaimReady,
}

impl EventKind {
    fn name(&self) -> &'static str {
        match self {
            EventKind::DrawPixel { .. } => "draw.pixel",
            EventKind::DrawComplete { .. } => "draw.complete",
            EventKind::WalletInit { .. } => "wallet.init",
            EventKind::ClaimReady => "claim.ready",
        }
    }
}

/// One indexed session event.
pub struct LoggedEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub timestamp_ms: u64,
}

// ============================================================================
// WALLET STATE
// ============================================================================

/// Mock wallet/XP progression state, published to subscribers and persisted
/// as the local session snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletState {
    pub is_active: bool,
    pub address: Option<String>,
    /// Balance in $PINK.
    pub balance: u32,
    pub xp: u32,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            is_active: false,
            address: None,
            balance: 0,
            xp: 0,
        }
    }
}

impl WalletState {
    /// Structural validity of a (possibly deserialized) state: an active
    /// wallet must carry a plausible address, an inactive one must not.
    pub fn is_valid(&self) -> bool {
        match (&self.is_active, &self.address) {
            (true, Some(addr)) => looks_like_address(addr),
            (true, None) => false,
            (false, _) => true,
        }
    }
}

fn looks_like_address(addr: &str) -> bool {
    addr.len() > 2 && addr.starts_with("0x")
}

// ============================================================================
// PROGRESSION ROUTER — mock MCP backend
// ============================================================================

enum RouterTask {
    ActivateWallet,
}

/// Simulated backend: indexes session events, accrues XP, and orchestrates
/// invisible wallet creation.
///
/// Injectable collaborator, not a global — the app owns one instance and
/// tests construct their own against a scratch snapshot path. Subscribers
/// receive the current state immediately and every change afterwards over a
/// plain mpsc channel; closed receivers are pruned on the next notify.
pub struct ProgressionRouter {
    session_events: Vec<LoggedEvent>,
    wallet: WalletState,
    listeners: Vec<mpsc::Sender<WalletState>>,
    scheduler: TaskScheduler<RouterTask>,
    /// True while wallet creation is scheduled but not yet fired.
    activation_pending: bool,
    snapshot_path: PathBuf,
}

impl ProgressionRouter {
    /// Router with the standard snapshot location in the app data dir.
    pub fn new() -> Self {
        Self::with_snapshot_path(crate::logger::app_data_dir().join(SESSION_FILE))
    }

    /// Router against an explicit snapshot path (tests use a scratch file).
    pub fn with_snapshot_path(snapshot_path: PathBuf) -> Self {
        let wallet = load_snapshot(&snapshot_path).unwrap_or_default();
        Self {
            session_events: Vec::new(),
            wallet,
            listeners: Vec::new(),
            scheduler: TaskScheduler::new(),
            activation_pending: false,
            snapshot_path,
        }
    }

    /// Subscribe to wallet-state changes. The current state is delivered
    /// immediately, then every change as it happens.
    pub fn subscribe(&mut self) -> mpsc::Receiver<WalletState> {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(self.wallet.clone());
        self.listeners.push(tx);
        rx
    }

    pub fn wallet_state(&self) -> &WalletState {
        &self.wallet
    }

    pub fn event_count(&self) -> usize {
        self.session_events.len()
    }

    /// Register an event at `now`. Invalid payloads are logged and dropped —
    /// they never mutate state or reach the event index.
    pub fn log_event(&mut self, kind: EventKind, now: Instant) {
        if !self.validate(&kind) {
            log_warn!("Dropping invalid {} event: {:?}", kind.name(), kind);
            return;
        }

        log_info!("Event: {} {:?}", kind.name(), kind);
        let routed = kind.clone();
        self.session_events.push(LoggedEvent {
            id: Uuid::new_v4(),
            kind,
            timestamp_ms: unix_millis(),
        });

        match routed {
            EventKind::DrawPixel { .. } => self.process_pixel_draw(now),
            EventKind::DrawComplete { .. } => {
                self.wallet.balance += COMPLETION_BONUS;
                self.notify();
            }
            // Emitted by the activation task, which already updated state.
            EventKind::WalletInit { .. } | EventKind::ClaimReady => {}
        }
    }

    /// Fire due delayed tasks. Call once per frame.
    pub fn poll(&mut self, now: Instant) {
        for task in self.scheduler.poll(now) {
            match task {
                RouterTask::ActivateWallet => self.activate_wallet(now),
            }
        }
    }

    /// Time until the next pending task, for repaint scheduling.
    pub fn next_due_in(&self, now: Instant) -> Option<Duration> {
        self.scheduler.next_due_in(now)
    }

    /// Wipe the session snapshot and state.
    pub fn reset(&mut self) {
        if let Err(e) = fs::remove_file(&self.snapshot_path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            log_err!("Failed to remove session snapshot: {}", e);
        }
        self.wallet = WalletState::default();
        self.activation_pending = false;
        self.scheduler.clear();
        self.notify();
    }

    fn validate(&self, kind: &EventKind) -> bool {
        match kind {
            // `Cell` and `PixelColor` are validated at construction; this
            // re-check guards the router's own boundary.
            EventKind::DrawPixel { cell, .. } => cell.x < GRID_SIZE && cell.y < GRID_SIZE,
            EventKind::WalletInit { address } => looks_like_address(address),
            EventKind::DrawComplete { .. } | EventKind::ClaimReady => true,
        }
    }

    fn process_pixel_draw(&mut self, now: Instant) {
        self.wallet.xp += XP_PER_PIXEL;

        // Invisible wallet creation: once past the threshold, simulate the
        // embedded-wallet provider's latency before flipping active.
        if !self.wallet.is_active
            && !self.activation_pending
            && self.wallet.xp >= XP_WALLET_THRESHOLD
        {
            self.activation_pending = true;
            self.scheduler
                .schedule(now, WALLET_CREATION_DELAY, RouterTask::ActivateWallet);
            log_info!("Wallet creation scheduled at {} XP", self.wallet.xp);
        }
        self.notify();
    }

    fn activate_wallet(&mut self, now: Instant) {
        self.activation_pending = false;
        self.wallet.is_active = true;
        self.wallet.address = Some(MOCK_WALLET_ADDRESS.to_string());
        self.wallet.balance += ACTIVATION_DROP;
        self.log_event(
            EventKind::WalletInit {
                address: MOCK_WALLET_ADDRESS.to_string(),
            },
            now,
        );
        self.notify();
    }

    /// Persist the snapshot and fan the new state out to live subscribers.
    fn notify(&mut self) {
        save_snapshot(&self.snapshot_path, &self.wallet);
        let state = self.wallet.clone();
        self.listeners.retain(|tx| tx.send(state.clone()).is_ok());
    }
}

// ============================================================================
// SESSION SNAPSHOT — the localStorage analog
// ============================================================================

fn load_snapshot(path: &PathBuf) -> Option<WalletState> {
    let bytes = fs::read(path).ok()?;
    match bincode::deserialize::<WalletState>(&bytes) {
        Ok(state) if state.is_valid() => {
            log_info!("Restored session snapshot: {} XP", state.xp);
            Some(state)
        }
        Ok(_) => {
            log_warn!("Session snapshot is inconsistent, starting fresh");
            let _ = fs::remove_file(path);
            None
        }
        Err(e) => {
            log_warn!("Session snapshot unreadable ({}), starting fresh", e);
            let _ = fs::remove_file(path);
            None
        }
    }
}

/// Failures here are logged and ignored — the session keeps working without
/// persistence.
fn save_snapshot(path: &PathBuf, state: &WalletState) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match bincode::serialize(state) {
        Ok(bytes) => {
            if let Err(e) = fs::write(path, bytes) {
                log_err!("Failed to write session snapshot: {}", e);
            }
        }
        Err(e) => log_err!("Failed to serialize session snapshot: {}", e),
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("inkpink-test-{}.bin", Uuid::new_v4()))
    }

    fn router() -> ProgressionRouter {
        ProgressionRouter::with_snapshot_path(scratch_path())
    }

    fn pixel_event(x: u32, y: u32) -> EventKind {
        EventKind::DrawPixel {
            cell: Cell::new(x, y).unwrap(),
            color: Some(PixelColor::parse("#ed00b2").unwrap()),
        }
    }

    #[test]
    fn accrues_xp_per_pixel() {
        let mut r = router();
        let t0 = Instant::now();
        r.log_event(pixel_event(0, 0), t0);
        r.log_event(pixel_event(1, 0), t0);
        assert_eq!(r.wallet_state().xp, 2 * XP_PER_PIXEL);
        assert_eq!(r.event_count(), 2);
    }

    #[test]
    fn wallet_activates_after_threshold_and_delay() {
        let mut r = router();
        let t0 = Instant::now();
        for i in 0..10 {
            r.log_event(pixel_event(i, 0), t0);
        }
        assert_eq!(r.wallet_state().xp, XP_WALLET_THRESHOLD);
        // Threshold reached but the simulated creation delay has not elapsed.
        assert!(!r.wallet_state().is_active);

        r.poll(t0 + WALLET_CREATION_DELAY - Duration::from_millis(1));
        assert!(!r.wallet_state().is_active);

        r.poll(t0 + WALLET_CREATION_DELAY);
        let w = r.wallet_state();
        assert!(w.is_active);
        assert_eq!(w.address.as_deref(), Some(MOCK_WALLET_ADDRESS));
        assert_eq!(w.balance, ACTIVATION_DROP);
        // The router logged its own wallet.init event.
        assert_eq!(r.event_count(), 11);
    }

    #[test]
    fn activation_is_scheduled_only_once() {
        let mut r = router();
        let t0 = Instant::now();
        for i in 0..20 {
            r.log_event(pixel_event(i % 32, i / 32), t0);
        }
        r.poll(t0 + Duration::from_secs(1));
        assert_eq!(r.wallet_state().balance, ACTIVATION_DROP);
    }

    #[test]
    fn completion_grants_the_bonus() {
        let mut r = router();
        r.log_event(
            EventKind::DrawComplete {
                method: CompletionMethod::Download,
            },
            Instant::now(),
        );
        assert_eq!(r.wallet_state().balance, COMPLETION_BONUS);
    }

    #[test]
    fn subscriber_gets_current_state_then_updates() {
        let mut r = router();
        let rx = r.subscribe();
        assert_eq!(rx.try_recv().unwrap(), WalletState::default());

        r.log_event(pixel_event(3, 3), Instant::now());
        let updated = rx.try_recv().unwrap();
        assert_eq!(updated.xp, XP_PER_PIXEL);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let mut r = router();
        drop(r.subscribe());
        let rx = r.subscribe();
        let _ = rx.try_recv();
        r.log_event(pixel_event(0, 0), Instant::now());
        assert_eq!(r.listeners.len(), 1);
    }

    #[test]
    fn invalid_wallet_init_is_dropped() {
        let mut r = router();
        r.log_event(
            EventKind::WalletInit {
                address: "not-an-address".to_string(),
            },
            Instant::now(),
        );
        assert_eq!(r.event_count(), 0);
    }

    #[test]
    fn snapshot_round_trips_between_routers() {
        let path = scratch_path();
        {
            let mut r = ProgressionRouter::with_snapshot_path(path.clone());
            r.log_event(pixel_event(0, 0), Instant::now());
        }
        let restored = ProgressionRouter::with_snapshot_path(path.clone());
        assert_eq!(restored.wallet_state().xp, XP_PER_PIXEL);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn corrupt_snapshot_resets_to_default() {
        let path = scratch_path();
        fs::write(&path, b"garbage").unwrap();
        let r = ProgressionRouter::with_snapshot_path(path.clone());
        assert_eq!(*r.wallet_state(), WalletState::default());
        // The corrupt file was discarded.
        assert!(!path.exists());
    }

    #[test]
    fn reset_wipes_state_and_snapshot() {
        let path = scratch_path();
        let mut r = ProgressionRouter::with_snapshot_path(path.clone());
        r.log_event(pixel_event(0, 0), Instant::now());
        assert!(path.exists());
        r.reset();
        assert_eq!(*r.wallet_state(), WalletState::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn wallet_state_validity() {
        assert!(WalletState::default().is_valid());
        let active_ok = WalletState {
            is_active: true,
            address: Some(MOCK_WALLET_ADDRESS.to_string()),
            balance: 10,
            xp: 50,
        };
        assert!(active_ok.is_valid());
        let active_no_addr = WalletState {
            is_active: true,
            address: None,
            ..WalletState::default()
        };
        assert!(!active_no_addr.is_valid());
    }
}
