use std::fmt::Write as _;

use crate::permutation::{BarrierSrc, Permutation};
use crate::registry::Registry;
use crate::task::Task;
use crate::transient::TransientLayout;

/// Renders the compiled plan as text for inspection (spec.md §4.7). A pure
/// function of the compiled graph, grounded on `impl_task_graph.hpp`'s
/// `print_task_to`/`print_permutation_aliasing_to`.
pub fn print_permutation(perm: &Permutation, registry: &Registry, tasks: &[Task]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "permutation mask=0b{:b}", perm.mask);

    for (scope_idx, scope) in perm.submit_scopes.iter().enumerate() {
        if scope.start_batch == scope.end_batch && scope_idx == perm.submit_scopes.len() - 1 {
            continue;
        }
        let _ = writeln!(out, "  submit-scope {scope_idx} [{}, {})", scope.start_batch, scope.end_batch);
        for batch_idx in scope.start_batch..scope.end_batch {
            let Some(batch) = perm.batches.get(batch_idx) else { continue };
            let _ = writeln!(out, "    batch {batch_idx}");
            for &wait in &batch.wait_split_barriers {
                let split = &perm.split_barriers[wait];
                let _ = writeln!(out, "      wait split-barrier #{wait} (signalled at batch {})", split.signal_batch);
            }
            for &barrier_idx in &batch.pipeline_barriers {
                print_barrier(&mut out, perm, registry, barrier_idx);
            }
            for &task_id in &batch.tasks {
                let _ = writeln!(out, "      task `{}`", tasks[task_id].name);
            }
            for &signal in &batch.signal_split_barriers {
                let split = &perm.split_barriers[signal];
                let _ = writeln!(out, "      signal split-barrier #{signal} (waited on at batch {})", split.wait_batch);
            }
        }
        if scope.present {
            let _ = writeln!(out, "    present");
        }
    }

    out
}

fn print_barrier(out: &mut String, perm: &Permutation, registry: &Registry, idx: usize) {
    let barrier = &perm.barriers[idx];
    let src = match barrier.src {
        BarrierSrc::Known { access_mask, .. } => format!("{access_mask:?}"),
        BarrierSrc::CrossFrameBuffer(_) | BarrierSrc::CrossFrameImage(..) => "cross-frame".to_string(),
    };

    if let Some(view) = barrier.buffer {
        let _ = writeln!(out, "      barrier #{idx} buffer `{}`: {} -> {:?}", registry.buffer_name(view), src, barrier.dst_access);
    } else if let Some((view, slice)) = barrier.image {
        let _ = writeln!(
            out,
            "      barrier #{idx} image `{}` mips[{}..{}]: {} -> {:?} layout_after={:?}",
            registry.image_name(view),
            slice.base_mip_level,
            slice.base_mip_level + slice.mip_level_count,
            src,
            barrier.dst_access,
            barrier.layout_after
        );
    }
}

/// Renders the transient-resource lifetime/offset aliasing table.
pub fn print_transient_layout(layout: &TransientLayout, registry: &Registry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "transient memory block: {} bytes", layout.memory_block_size);
    for (view, offset, size, lifetime) in &layout.buffers {
        let _ = writeln!(
            out,
            "  buffer `{}` offset={offset} size={size} lifetime=[{}, {}]",
            registry.buffer_name(*view),
            lifetime.0,
            lifetime.1
        );
    }
    for (view, offset, size, lifetime) in &layout.images {
        let _ = writeln!(
            out,
            "  image `{}` offset={offset} size={size} lifetime=[{}, {}]",
            registry.image_name(*view),
            lifetime.0,
            lifetime.1
        );
    }
    out
}
