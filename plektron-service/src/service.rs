//! Deck service loops
//!
//! Two cooperating loops, spawned as tasks by the application binary:
//! [`edge_pump`] reads hardware edges into [`EDGE_CHANNEL`], and
//! [`deck_service`] owns the deck and serializes everything: edge
//! dispatch, timer synthesis, and batched flushes. Splitting the
//! reader from the writer keeps edge intake responsive while an
//! upload is in flight.

use embassy_futures::select::{select3, Either3};
use embassy_time::{Duration, Instant, Ticker, Timer};
use log::{debug, warn};

use plektron_core::{Compositor, Deck, EdgeSource, Transport};

use crate::channels::{EDGE_CHANNEL, FLUSH_REQUEST};

/// Poll cadence for timer-driven event synthesis, in milliseconds.
/// Bounds the latency of auto-repeat and long-press firings.
pub const TICK_INTERVAL_MS: u64 = 10;

/// Back-off after an edge source error before retrying.
const EDGE_RETRY_MS: u64 = 100;

/// Request a flush from outside the deck loop.
pub fn request_flush() {
    FLUSH_REQUEST.signal(());
}

/// Read hardware edges into [`EDGE_CHANNEL`] forever.
///
/// Errors are logged and retried after a short back-off; a flaky
/// device link degrades to missed edges, never to a wedged loop.
pub async fn edge_pump<E: EdgeSource>(source: &mut E) -> ! {
    debug!("edge pump started");
    loop {
        match source.next_edge().await {
            Ok(edge) => EDGE_CHANNEL.send(edge).await,
            Err(err) => {
                warn!("edge source error: {:?}, retrying", err);
                Timer::after_millis(EDGE_RETRY_MS).await;
            }
        }
    }
}

/// Run the deck: dispatch edges, synthesize timer events, and flush
/// coalesced redraws, all from one loop.
///
/// Queued edges are drained before each flush so redraws triggered
/// within one burst of activity collapse into a single device update.
pub async fn deck_service<S, C, T>(
    deck: &mut Deck<S>,
    compositor: &mut C,
    transport: &mut T,
) -> !
where
    C: Compositor<Spec = S>,
    T: Transport,
{
    debug!("deck service started, {} buttons", deck.button_count());

    if let Err(err) = transport.clear_all().await {
        warn!("initial panel clear failed: {:?}", err);
    }

    let start = Instant::now();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));

    loop {
        match select3(EDGE_CHANNEL.receive(), ticker.next(), FLUSH_REQUEST.wait()).await {
            Either3::First(edge) => {
                let now_ms = start.elapsed().as_millis();
                deck.handle_edge(edge.index, edge.pressed, now_ms);
                while let Ok(edge) = EDGE_CHANNEL.try_receive() {
                    deck.handle_edge(edge.index, edge.pressed, now_ms);
                }
            }
            Either3::Second(()) => {
                deck.poll(start.elapsed().as_millis());
            }
            Either3::Third(()) => {}
        }

        if deck.has_pending() {
            let stats = deck.flush(compositor, transport).await;
            if stats.failed > 0 || stats.skipped > 0 {
                warn!("flush: {:?}", stats);
            } else {
                debug!(
                    "flush: {} rendered, {} cleared",
                    stats.rendered, stats.cleared
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use embassy_futures::select::{select, Either};
    use plektron_core::mock::ScriptedEdges;
    use plektron_core::EdgeEvent;

    #[test]
    fn request_flush_signals_the_deck_loop() {
        request_flush();
        assert!(FLUSH_REQUEST.signaled());
        FLUSH_REQUEST.reset();
    }

    #[test]
    fn edge_pump_preserves_arrival_order() {
        let down = EdgeEvent {
            index: 2,
            pressed: true,
        };
        let up = EdgeEvent {
            index: 2,
            pressed: false,
        };
        let mut source = ScriptedEdges::new(std::vec![down, up]);

        let received = block_on(async {
            match select(edge_pump(&mut source), async {
                let first = EDGE_CHANNEL.receive().await;
                let second = EDGE_CHANNEL.receive().await;
                (first, second)
            })
            .await
            {
                Either::First(never) => match never {},
                Either::Second(pair) => pair,
            }
        });
        assert_eq!(received, (down, up));
    }
}
