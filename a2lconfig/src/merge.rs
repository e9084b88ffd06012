use crate::graph::{Entry, FieldMap, RootGraph, is_meta_key};

/// Merges the non-A2L content of `supplemental` into `orig`.
///
/// Only entries and compu methods whose source is not A2L are copied. Existing A2L entries in
/// `orig` are never replaced, while entries of other sources are overwritten by the supplemental
/// data. Compu methods are overwritten regardless of their source.
/// Memory regions, axis points and the summary of `supplemental` are not merged.
pub(crate) fn merge_graphs(orig: &mut RootGraph, supplemental: &RootGraph) {
    // merge COMPU_METHOD
    let mut compu_count = 0;
    for (name, method) in &supplemental.compu_methods {
        if !method.is_a2l() {
            orig.compu_methods.insert(name.clone(), method.clone());
            compu_count += 1;
        }
    }

    // merge all other entries
    let entry_count = merge_entries(&mut orig.entries, &supplemental.entries);

    log::debug!("merged {compu_count} compu methods and {entry_count} entries");
}

// copy every non-A2L entry of `merge` into `orig`; returns the number of copied entries
fn merge_entries(orig: &mut FieldMap<Entry>, merge: &FieldMap<Entry>) -> usize {
    let mut count = 0;
    for (name, merge_entry) in merge {
        if is_meta_key(name) || merge_entry.is_a2l() {
            continue;
        }
        if let Some(existing) = orig.get(name)
            && existing.is_a2l()
        {
            log::warn!("merge: keeping the A2L definition of {name}, the supplemental entry is ignored");
            continue;
        }
        orig.insert(name.clone(), merge_entry.clone());
        count += 1;
    }
    count
}
