use std::path::Path;

use tracing::{info, warn};

use crate::backend::ImageBackend;
use crate::consts::RAW_SUFFIX;
use crate::error::{Result, ScanpipeError};
use crate::hyperstack::{Dims, ImageId};
use crate::layout::LayoutKind;

/// The one stack left registered after assembly.
#[derive(Clone, Debug)]
pub struct AssembledStack {
    pub id: ImageId,
    pub basename: String,
    pub dims: Dims,
}

/// Open a scan's acquisition and reduce what the backend surfaced to a
/// single stack titled `<basename>_raw`.
pub fn assemble_stack(
    backend: &mut dyn ImageBackend,
    root: &Path,
    scan: &Path,
    layout: LayoutKind,
) -> Result<AssembledStack> {
    let strategy = layout.strategy();
    let basename = strategy.resolve_basename(scan);
    let initiator = strategy.resolve_initiator(root, scan, &basename)?;
    info!(initiator = %initiator.display(), "Opening acquisition");

    let opened = backend.open_stack(&initiator)?;
    let mut survivors = prune_partial_stacks(backend, opened)?.into_iter();
    let id = survivors.next().ok_or_else(|| ScanpipeError::Assembly {
        reason: format!("no stack left for {} after discarding partial timepoints", basename),
    })?;
    for extra in survivors {
        warn!(title = %backend.title(extra)?, "Closing additional stack");
        backend.close(extra);
    }

    backend.set_title(id, &format!("{}{}", basename, RAW_SUFFIX))?;
    let dims = backend.stack(id)?.dims();
    info!(dims = %dims, "Assembled hyperstack");
    Ok(AssembledStack { id, basename, dims })
}

/// When the backend surfaced more than one stack, close every one-frame
/// stack: those are interrupted timepoints, not data.
fn prune_partial_stacks(
    backend: &mut dyn ImageBackend,
    opened: Vec<ImageId>,
) -> Result<Vec<ImageId>> {
    if opened.len() <= 1 {
        return Ok(opened);
    }
    let mut keep = Vec::with_capacity(opened.len());
    for id in opened {
        let stack = backend.stack(id)?;
        if stack.frames() == 1 {
            warn!(title = %stack.title, "Discarding single-timepoint partial stack");
            backend.close(id);
        } else {
            keep.push(id);
        }
    }
    Ok(keep)
}
