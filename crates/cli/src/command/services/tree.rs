use crate::command::domain::{BuildOutput, BuildPayload, NavigateOutput, NavigatePayload};
use anyhow::{Context, Result};
use drilldown_protocol::NavOp;
use drilldown_tree::{PathNavigator, TreeBuilder};
use log::debug;
use std::sync::Arc;

pub(crate) fn build(builder: &TreeBuilder, payload: BuildPayload) -> Result<BuildOutput> {
    let tree = builder
        .build(&payload.source)
        .context("Tree build failed")?;
    let root = tree.into_root();
    Ok(BuildOutput {
        title: root.title.clone(),
        nodes: root.size(),
        depth: root.depth(),
        tree: root,
    })
}

/// Build the tree, then replay the path and ops the way the UI would.
///
/// Rejected descends become warnings; the path stays where it was.
pub(crate) fn navigate(builder: &TreeBuilder, payload: NavigatePayload) -> Result<NavigateOutput> {
    let tree = builder
        .build(&payload.source)
        .context("Tree build failed")?;
    let mut navigator = PathNavigator::new(Arc::new(tree));
    let mut warnings = Vec::new();

    let initial = payload
        .path
        .as_slice()
        .iter()
        .map(|&index| NavOp::Descend { index });
    for op in initial.chain(payload.ops) {
        match op {
            NavOp::Descend { index } => {
                if let Err(err) = navigator.descend(index) {
                    warnings.push(err.to_string());
                }
            }
            NavOp::Truncate { len } => navigator.truncate(len),
        }
    }
    debug!(
        "Navigated to [{}] with {} warning(s)",
        navigator.path(),
        warnings.len()
    );

    Ok(NavigateOutput {
        path: navigator.path().clone(),
        breadcrumbs: navigator.breadcrumbs(),
        series: navigator.series(),
        warnings,
        records: payload
            .records
            .map(|page| navigator.records(page.page, page.page_size)),
    })
}
