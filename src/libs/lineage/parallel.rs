//! Reconciling independent components on the current rayon pool.
//!
//! Workers never write to the shared arena. Each one pushes synthesized
//! ancestors to its own [`OverlayArena`] and starts its fake-clone counter
//! at a reserved offset, the sum of the sizes of the components before it.
//! A component can synthesize fewer ancestors than it has clones, so the
//! ranges never overlap. Results are merged in input order.

use super::arena::{CloneArena, CloneStore, OverlayArena};
use super::clone::CloneId;
use super::edge::EdgeConstructor;
use super::error::LineageError;
use super::grouper::CloneComponent;
use super::reconcile::{ComponentProcessor, LineageForest, ReconcileContext};
use super::reconstruct::{CloneByReadConstructor, ParentReadReconstructor};
use log::info;
use rayon::prelude::*;

pub fn reconcile_components<E, P, C>(
    arena: &mut CloneArena,
    components: Vec<CloneComponent>,
    processor: &ComponentProcessor<'_, E, P, C>,
    ctx: &mut ReconcileContext,
) -> Result<Vec<LineageForest>, LineageError>
where
    E: EdgeConstructor + Sync + ?Sized,
    P: ParentReadReconstructor + Sync + ?Sized,
    C: CloneByReadConstructor + Sync + ?Sized,
{
    let base_len = arena.len();
    let starts: Vec<usize> = components
        .iter()
        .scan(ctx.fake_clone_index, |next, c| {
            let start = *next;
            *next += c.len();
            Some(start)
        })
        .collect();
    let reserved_end = ctx.fake_clone_index + components.iter().map(|c| c.len()).sum::<usize>();

    let base: &CloneArena = arena;
    let results: Vec<Result<_, LineageError>> = components
        .into_par_iter()
        .zip(starts.into_par_iter())
        .map(|(component, start)| -> Result<_, LineageError> {
            let mut overlay = OverlayArena::new(base);
            let mut local = ReconcileContext::with_fake_index(start);
            let forest = processor.construct_forest(&mut overlay, component, &mut local)?;
            Ok((forest, overlay.into_local(), local))
        })
        .collect();

    let mut forests = Vec::with_capacity(results.len());
    for result in results {
        let (forest, synthesized, local) = result?;
        let shift = arena.append(synthesized) - base_len;
        forests.push(shift_forest(forest, base_len, shift));
        ctx.merge(&local);
    }
    ctx.fake_clone_index = ctx.fake_clone_index.max(reserved_end);

    info!(
        "{} components, {} ancestors reconstructed, {} rejected",
        forests.len(),
        ctx.reconstructed,
        ctx.rejected
    );
    Ok(forests)
}

/// Move ids at or past `base_len` up by `shift`.
fn shift_forest(forest: LineageForest, base_len: usize, shift: usize) -> LineageForest {
    if shift == 0 {
        return forest;
    }
    let f = |id: CloneId| if id >= base_len { id + shift } else { id };
    LineageForest {
        tree: forest.tree.remap_ids(f),
        component: forest.component.remap(f),
        groups: forest.groups,
        rejected_roots: forest.rejected_roots.into_iter().map(f).collect(),
    }
}
