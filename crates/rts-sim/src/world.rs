//! The `World` struct and its tick loop.

use log::{debug, warn};

use rts_core::{SimClock, SimConfig, Tick};
use rts_locomotion::{DijkstraPathFinder, PathFinder};
use rts_mobile::{MobileEngine, MobileResult, MovementEvent};

use crate::{Order, SimObserver, SimResult};

// ── World ─────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `World<P>` owns the movement core and drives the tick loop:
///
/// 1. **Orders**: every order submitted since the last tick is applied, in
///    submission order.
/// 2. **Movement**: [`MobileEngine::tick`] advances every mobile in
///    ascending `ActorId` order, resolves nudges and refreshes the position
///    index.
/// 3. **Check** (optional): the occupancy index is verified against every
///    actor's projection.
///
/// Create via [`WorldBuilder`][crate::WorldBuilder].
pub struct World<P: PathFinder = DijkstraPathFinder> {
    /// Global configuration (total ticks, seed, tick duration, …).
    pub config: SimConfig,

    /// Simulation clock: the current tick and its game time.
    pub clock: SimClock,

    /// The movement core.
    pub engine: MobileEngine<P>,

    /// Verify occupancy after every tick.
    pub verify_each_tick: bool,

    /// Orders waiting for the start of the next tick.
    orders: Vec<Order>,
}

impl<P: PathFinder> World<P> {
    pub(crate) fn new(config: SimConfig, engine: MobileEngine<P>, verify_each_tick: bool) -> Self {
        Self {
            clock: config.make_clock(),
            config,
            engine,
            verify_each_tick,
            orders: Vec::new(),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Queue `order` for the start of the next tick.
    pub fn submit(&mut self, order: Order) {
        self.orders.push(order);
    }

    pub fn submit_all<I: IntoIterator<Item = Order>>(&mut self, orders: I) {
        self.orders.extend(orders);
    }

    pub fn pending_orders(&self) -> &[Order] {
        &self.orders
    }

    /// Run the simulation from the current tick to `config.end_tick()`.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer)?;
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer)?;
        }
        Ok(())
    }

    fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);
        let events = self.process_tick(now)?;
        observer.on_tick_end(now, &events);
        if self.config.snapshot_interval_ticks > 0
            && now.0 % self.config.snapshot_interval_ticks == 0
        {
            observer.on_snapshot(now, self.engine.mobiles(), self.engine.actors());
        }
        self.clock.advance();
        Ok(())
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn process_tick(&mut self, now: Tick) -> SimResult<Vec<MovementEvent>> {
        // Orders may teleport and crush; keep their events with this tick.
        let orders = std::mem::take(&mut self.orders);
        for order in orders {
            match self.apply_order(order) {
                Ok(true) => {}
                Ok(false) => debug!("{}: order dropped: {order:?}", order.actor()),
                Err(e) => debug!("{}: order dropped: {order:?}: {e}", order.actor()),
            }
        }

        self.engine.tick(now)?;

        if self.verify_each_tick {
            if let Err(e) = self.engine.verify() {
                warn!("occupancy check failed at {now}: {e}");
                return Err(e.into());
            }
        }
        Ok(self.engine.take_events())
    }

    /// `Ok(false)` when the engine refuses the order, `Err` when it names an
    /// unknown actor, an actor without a mobile, or a cell off the map.
    fn apply_order(&mut self, order: Order) -> MobileResult<bool> {
        match order {
            Order::Move { actor, target, near_enough, queued } => {
                self.engine.move_to(actor, target, near_enough, queued)
            }
            Order::Teleport { actor, cell, sub } => {
                if !self.engine.actors().is_alive(actor) {
                    return Ok(false);
                }
                self.engine.set_position(actor, cell, sub)?;
                Ok(true)
            }
            Order::Stop { actor } => {
                self.engine.cancel(actor)?;
                Ok(true)
            }
            Order::Scatter { actor } => self.engine.scatter(actor),
        }
    }
}
