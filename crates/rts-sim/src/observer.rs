//! World observer trait for progress reporting and data collection.

use rts_actor::ActorStore;
use rts_core::Tick;
use rts_mobile::{MobileStore, MovementEvent};

/// Callbacks invoked by [`World::run`][crate::World::run] at key points in
/// the tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example: crush counter
///
/// ```rust,ignore
/// struct CrushCounter(usize);
///
/// impl SimObserver for CrushCounter {
///     fn on_tick_end(&mut self, _tick: Tick, events: &[MovementEvent]) {
///         self.0 += events
///             .iter()
///             .filter(|e| matches!(e, MovementEvent::Crushed { .. }))
///             .count();
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before orders are applied.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick with every movement event it raised,
    /// in dispatch order.
    fn on_tick_end(&mut self, _tick: Tick, _events: &[MovementEvent]) {}

    /// Called every `config.snapshot_interval_ticks` ticks.
    ///
    /// Provides read-only access to the mobile and actor state so that
    /// recorders can take a snapshot without the world knowing about any
    /// output format.
    fn on_snapshot(
        &mut self,
        _tick:    Tick,
        _mobiles: &MobileStore,
        _actors:  &ActorStore,
    ) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
