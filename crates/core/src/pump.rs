//! Bidirectional, content-blind forwarding between the two legs of a session.

use crate::leg::{Leg, LegEnd, LegReader, Side};

/// Frame counts per direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub to_upstream: u64,
    pub to_inbound: u64,
}

/// Which leg ended the pump, and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PumpEnd {
    pub side: Side,
    pub end: LegEnd,
}

/// Forwards frames both ways until either reader ends.
///
/// Each direction is its own loop and both are polled concurrently, so a frame
/// on one leg never waits for traffic on the other. When one direction finishes
/// the other is dropped mid-flight; nothing is buffered.
pub async fn run(
    inbound: (&mut Leg, &mut LegReader),
    upstream: (&mut Leg, &mut LegReader),
    stats: &mut RelayStats,
) -> PumpEnd {
    let (inbound_leg, inbound_reader) = inbound;
    let (upstream_leg, upstream_reader) = upstream;
    let RelayStats {
        to_upstream,
        to_inbound,
    } = stats;

    tokio::select! {
        end = forward(inbound_reader, upstream_leg, to_upstream) => PumpEnd { side: Side::Inbound, end },
        end = forward(upstream_reader, inbound_leg, to_inbound) => PumpEnd { side: Side::Upstream, end },
    }
}

async fn forward(source: &mut LegReader, destination: &mut Leg, forwarded: &mut u64) -> LegEnd {
    loop {
        match source.next_frame().await {
            Ok(frame) => {
                if destination.forward(frame).await {
                    *forwarded += 1;
                }
            }
            Err(end) => return end,
        }
    }
}
