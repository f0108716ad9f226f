//! Sparsifier: samples a subset of active edges to participate in this
//! phase's implicit line graph, then discovers each participant's sparse
//! degree by joining through vertex owners — the line graph itself is
//! never materialized.

use gu_fabric::Exchange;
use gu_ident::{edge_owner, owner, tag, bernoulli_draw};

use crate::error::GuError;
use crate::messages::{DegreeContribMsg, IncidenceMsg};
use crate::worker::Worker;

/// Runs sparsification for one phase: draws participation, registers
/// incidences with vertex owners, and computes each participant's sparse
/// degree.
///
/// # Errors
/// Returns [`GuError::Fabric`] if the exchange fabric fails.
pub fn run<F: Exchange>(worker: &mut Worker<F>, phase: u64, sampling_p: f64) -> Result<(), GuError> {
    let world_size = worker.world_size();

    for (_, slot) in worker.store.iter_mut() {
        if !slot.active {
            continue;
        }
        slot.participates = bernoulli_draw(&[slot.eid, phase], tag::SAMPLE, sampling_p);
    }

    let mut incidence_out = vec![Vec::new(); world_size];
    for (_, slot) in worker.store.iter().filter(|(_, s)| s.active && s.participates) {
        incidence_out[owner(slot.u, world_size)].push(IncidenceMsg {
            vertex: slot.u,
            eid: slot.eid,
            other: slot.v,
        });
        incidence_out[owner(slot.v, world_size)].push(IncidenceMsg {
            vertex: slot.v,
            eid: slot.eid,
            other: slot.u,
        });
    }
    let incidence_in = worker.fabric.exchange(incidence_out)?;

    worker.incidence.clear();
    for bucket in incidence_in {
        for msg in bucket {
            worker
                .incidence
                .entry(msg.vertex)
                .or_default()
                .push((msg.eid, msg.other));
        }
    }
    for edges in worker.incidence.values_mut() {
        edges.sort_unstable_by_key(|(eid, _)| *eid);
        edges.dedup_by_key(|(eid, _)| *eid);
    }

    let mut contrib_out = vec![Vec::new(); world_size];
    for (&vertex, edges) in &worker.incidence {
        let contrib = edges.len().saturating_sub(1) as u64;
        let retired = worker.retired.contains(&vertex);
        for &(eid, _) in edges {
            contrib_out[edge_owner(eid, world_size)].push(DegreeContribMsg { eid, contrib, retired });
        }
    }
    let contrib_in = worker.fabric.exchange(contrib_out)?;

    for bucket in contrib_in {
        for msg in bucket {
            if let Some(index) = worker.store.index_of(msg.eid) {
                if let Some(slot) = worker.store.get_mut(index) {
                    if msg.retired {
                        slot.active = false;
                        slot.participates = false;
                    } else {
                        slot.deg_in_sparse += msg.contrib as i64;
                    }
                }
            }
        }
    }

    Ok(())
}
