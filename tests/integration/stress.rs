//! Integration test: stress.
//!
//! Concurrent writers churn disjoint member sets while readers query the
//! monitor relation. Verifies readers never miss a live member and the rings
//! never diverge.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Barrier, Mutex, RwLock};

use ringwatch_integration_tests::{TopologyHarness, node, nodes};
use ringwatch_topology::{MonitoringTopology, TopologyConfig, deliver_all};
use ringwatch_types::{LinkUpdate, MembershipChange, NodeId};

const WRITERS: u32 = 4;
const READERS: usize = 4;
const ROUNDS: u32 = 200;

/// Writers add and remove their own members; readers pick members the
/// writers have published as live and query them in parallel. A query for a
/// live member must never fail.
#[test]
fn test_readers_never_miss_live_members() {
    let base = nodes(0..8);
    let h = TopologyHarness::new(3, &base);
    let topology = h.topology();

    // Members that have been added and not yet removed, with the writer that
    // owns them. Base members are never removed. Writers publish after
    // `add_member` returns and unpublish before calling `remove_member`.
    let live: Mutex<HashMap<NodeId, Option<usize>>> =
        Mutex::new(base.iter().map(|n| (n.clone(), None)).collect());
    // A writer holds its gate exclusively while removing; readers hold it
    // shared while querying one of its members.
    let gates: Vec<RwLock<()>> = (0..WRITERS).map(|_| RwLock::new(())).collect();
    let done = AtomicBool::new(false);
    let queries = AtomicU64::new(0);
    let barrier = Barrier::new(WRITERS as usize + READERS);

    std::thread::scope(|s| {
        let mut writers = Vec::new();
        for w in 0..WRITERS {
            let (live, gates, barrier) = (&live, &gates, &barrier);
            writers.push(s.spawn(move || {
                barrier.wait();
                for round in 0..ROUNDS {
                    let n = node(10_000 * (w + 1) + round);
                    topology.add_member(n.clone()).unwrap();
                    live.lock().unwrap().insert(n.clone(), Some(w as usize));

                    // Keep every other member so the ring keeps growing.
                    if round % 2 == 1 {
                        let _gate = gates[w as usize].write().unwrap();
                        live.lock().unwrap().remove(&n);
                        topology.remove_member(&n).unwrap();
                    }
                }
            }));
        }

        for r in 0..READERS {
            let (live, gates, done, queries, barrier) = (&live, &gates, &done, &queries, &barrier);
            s.spawn(move || {
                barrier.wait();
                let mut i = r;
                while !done.load(Ordering::Acquire) {
                    i = i.wrapping_add(7);
                    let picked = {
                        let guard = live.lock().unwrap();
                        guard
                            .iter()
                            .nth(i % guard.len())
                            .map(|(n, owner)| (n.clone(), *owner))
                    };
                    let Some((target, owner)) = picked else {
                        continue;
                    };

                    let _gate = owner.map(|w| gates[w].read().unwrap());
                    if !live.lock().unwrap().contains_key(&target) {
                        continue;
                    }
                    let monitors = topology
                        .monitors_of(&target)
                        .unwrap_or_else(|e| panic!("live member {target} not found: {e}"));
                    let monitorees = topology
                        .monitorees_of(&target)
                        .unwrap_or_else(|e| panic!("live member {target} not found: {e}"));

                    assert!(monitors.len() <= 3);
                    assert!(monitorees.len() <= 3);
                    assert!(!monitors.contains(&target));
                    queries.fetch_add(1, Ordering::Relaxed);
                }
            });
        }

        for w in writers {
            w.join().unwrap();
        }
        done.store(true, Ordering::Release);
    });

    assert!(queries.load(Ordering::Relaxed) > 0, "readers never ran");
    let expected = base.len() + (WRITERS * ROUNDS / 2) as usize;
    assert_eq!(topology.member_count(), expected);
    h.assert_invariants();
}

/// Many threads deliver the same UP events, then the same DOWN events.
/// Exactly one delivery per member is applied; every other one is counted.
#[test]
fn test_concurrent_duplicate_deliveries_are_counted() {
    const THREADS: u64 = 6;
    const MEMBERS: u32 = 50;

    let config = TopologyConfig {
        ring_count: 4,
        event_capacity: 1024,
    };
    let topology = MonitoringTopology::from_config(&config).unwrap();
    let mut rx = topology.subscribe();

    let ups: Vec<LinkUpdate> = nodes(0..MEMBERS).into_iter().map(LinkUpdate::up).collect();
    let downs: Vec<LinkUpdate> = nodes(0..MEMBERS).into_iter().map(LinkUpdate::down).collect();

    for batch in [&ups, &downs] {
        let barrier = Barrier::new(THREADS as usize);
        std::thread::scope(|s| {
            for _ in 0..THREADS {
                let (topology, barrier) = (&topology, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    deliver_all(topology, batch.iter());
                });
            }
        });
    }

    assert_eq!(topology.member_count(), 0);
    let stats = topology.counters().snapshot();
    assert_eq!(stats.duplicate_adds, (THREADS - 1) * u64::from(MEMBERS));
    assert_eq!(stats.missing_removes, (THREADS - 1) * u64::from(MEMBERS));

    let mut joined = 0;
    let mut left = 0;
    while let Ok(change) = rx.try_recv() {
        match change {
            MembershipChange::Joined(_) => joined += 1,
            MembershipChange::Left(_) => left += 1,
        }
    }
    assert_eq!(joined, MEMBERS);
    assert_eq!(left, MEMBERS);
}

/// Every member's join is announced before its departure, even when many
/// writers interleave.
#[tokio::test]
async fn test_changes_are_broadcast_in_apply_order() {
    let config = TopologyConfig {
        ring_count: 3,
        event_capacity: 4096,
    };
    let topology = MonitoringTopology::from_config(&config).unwrap();
    let mut rx = topology.subscribe();

    std::thread::scope(|s| {
        for w in 0..WRITERS {
            let topology = &topology;
            s.spawn(move || {
                for round in 0..100 {
                    let n = node(1000 * w + round);
                    topology.deliver(&LinkUpdate::up(n.clone()));
                    topology.deliver(&LinkUpdate::down(n));
                }
            });
        }
    });

    let mut joined = HashSet::new();
    for _ in 0..2 * WRITERS * 100 {
        match rx.recv().await.expect("change should be buffered") {
            MembershipChange::Joined(n) => assert!(joined.insert(n)),
            MembershipChange::Left(n) => assert!(joined.remove(&n), "{n} left before joining"),
        }
    }
    assert!(rx.try_recv().is_err(), "more changes than deliveries");
    assert!(joined.is_empty());
}
