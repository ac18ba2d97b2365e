//! Folding server line lists into the mirror.

use super::actions::{Capped, MergeMode};
use crate::model::{CartItem, LineHistory, LineId, RemoteLine};
use std::collections::{HashMap, HashSet};

/// Merges `lines` (server order) into `items` (display order).
///
/// Overlay flags travel with the line id. Survivors keep their relative
/// order; in [`MergeMode::Full`] unseen ids follow at the end in server order.
/// Duplicate ids in the reply collapse onto the first occurrence, and lines
/// with a zero quantity count as removed.
///
/// The reply describes the cart as of revision `basis`. A line missing from
/// it is kept when it arrived after `basis`, and a line that left after
/// `basis` is not brought back. A returning line gets the overlay it left
/// with. Quantities above a known non-zero stock are clamped and reported.
pub fn reconcile(
    items: &[CartItem],
    lines: Vec<RemoteLine>,
    mode: MergeMode,
    basis: u64,
    history: &mut LineHistory,
) -> (Vec<CartItem>, Vec<Capped>) {
    let revision = history.advance();
    let mut incoming: Vec<Option<RemoteLine>> = lines
        .into_iter()
        .filter(|line| line.quantity > 0)
        .map(Some)
        .collect();
    let mut index: HashMap<LineId, usize> = HashMap::with_capacity(incoming.len());
    for (position, line) in incoming.iter().enumerate() {
        if let Some(line) = line {
            index.entry(line.id.clone()).or_insert(position);
        }
    }

    let mut merged = Vec::with_capacity(incoming.len().max(items.len()));
    let mut capped = Vec::new();
    let mut seen = HashSet::with_capacity(incoming.len());
    for item in items {
        let fresh = index
            .get(item.id())
            .and_then(|&position| incoming.get_mut(position))
            .and_then(Option::take);
        match fresh {
            Some(mut line) => {
                clamp(&mut line, &mut capped);
                seen.insert(line.id.clone());
                merged.push(CartItem {
                    line,
                    overlay: item.overlay.clone(),
                });
            }
            None if history.arrived_after(item.id(), basis) => {
                seen.insert(item.id().clone());
                merged.push(item.clone());
            }
            None => history.depart(item.id(), item.overlay.clone(), revision),
        }
    }

    if mode == MergeMode::Full {
        for mut line in incoming.into_iter().flatten() {
            if !seen.insert(line.id.clone()) || history.departed_after(&line.id, basis) {
                continue;
            }
            clamp(&mut line, &mut capped);
            let overlay = history.arrive(&line.id, revision).unwrap_or_default();
            merged.push(CartItem { line, overlay });
        }
    }
    (merged, capped)
}

/// Stock 0 is left alone: the line cannot go below one.
fn clamp(line: &mut RemoteLine, capped: &mut Vec<Capped>) {
    if let Some(stock) = line.stock {
        if stock > 0 && line.quantity > stock {
            line.quantity = stock;
            capped.push(Capped {
                line: line.id.clone(),
                ceiling: stock,
            });
        }
    }
}
