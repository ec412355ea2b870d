//! Reduction planning
//!
//! Pure functions that turn negative line deltas into per-order edits.
//! Nothing here touches the store.

use crate::utils::money;
use shared::models::{
    BatchEntry, ItemSnapshot, KitchenOrder, KitchenOrderBody, KitchenOrderStatus, LineItem,
};
use std::collections::BTreeMap;

/// Quantities to take out of kitchen orders: order doc id → item id → qty
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Reductions {
    by_order: BTreeMap<String, BTreeMap<String, u32>>,
}

impl Reductions {
    pub fn add(&mut self, order_doc_id: &str, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        *self
            .by_order
            .entry(order_doc_id.to_string())
            .or_default()
            .entry(item_id.to_string())
            .or_default() += quantity;
    }

    pub fn is_empty(&self) -> bool {
        self.by_order.is_empty()
    }

    pub fn order_ids(&self) -> Vec<String> {
        self.by_order.keys().cloned().collect()
    }

    fn cuts_for(&self, order_doc_id: &str) -> Option<&BTreeMap<String, u32>> {
        self.by_order.get(order_doc_id)
    }
}

/// Take `quantity` out of a line's order refs, newest first
///
/// A ref whose quantity fits in what is left is dropped whole; otherwise it
/// is shrunk and the walk stops. Returns the part that no ref could absorb.
pub(crate) fn absorb_reduction(
    line: &mut LineItem,
    quantity: u32,
    reductions: &mut Reductions,
) -> u32 {
    let mut remaining = quantity;
    while remaining > 0 {
        let Some(last) = line.order_refs.last_mut() else {
            break;
        };
        if last.quantity <= remaining {
            remaining -= last.quantity;
            reductions.add(&last.order_doc_id, &line.id, last.quantity);
            line.order_refs.pop();
        } else {
            last.quantity -= remaining;
            reductions.add(&last.order_doc_id, &line.id, remaining);
            remaining = 0;
        }
    }
    remaining
}

/// Drop every order ref of a line (item removal)
pub(crate) fn release_all(line: &mut LineItem, reductions: &mut Reductions) {
    for r in line.order_refs.drain(..) {
        reductions.add(&r.order_doc_id, &line.id, r.quantity);
    }
}

/// Body with the given per-item quantities taken out
///
/// Entries that reach zero disappear. A `Single` body reduced to zero keeps
/// its shape with quantity 0, which [`KitchenOrderBody::is_empty`] reports.
pub(crate) fn reduce_body(
    body: &KitchenOrderBody,
    cuts: &BTreeMap<String, u32>,
) -> KitchenOrderBody {
    let cut = |item_id: &str| cuts.get(item_id).copied().unwrap_or(0);
    match body {
        KitchenOrderBody::Single { item, quantity } => KitchenOrderBody::Single {
            item: item.clone(),
            quantity: quantity.saturating_sub(cut(&item.item_id)),
        },
        KitchenOrderBody::Batch { items } => {
            let mut left: BTreeMap<&str, u32> = BTreeMap::new();
            for (id, qty) in cuts {
                left.insert(id.as_str(), *qty);
            }
            let mut survivors = Vec::with_capacity(items.len());
            for entry in items {
                let take = left
                    .get_mut(entry.item.item_id.as_str())
                    .map(|q| {
                        let t = (*q).min(entry.quantity);
                        *q -= t;
                        t
                    })
                    .unwrap_or(0);
                let quantity = entry.quantity - take;
                if quantity > 0 {
                    survivors.push(BatchEntry {
                        item: entry.item.clone(),
                        quantity,
                    });
                }
            }
            KitchenOrderBody::Batch { items: survivors }
        }
    }
}

/// One store write against an existing order
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OrderWrite {
    Cancel {
        prior: KitchenOrder,
    },
    /// Kitchen ticket closed by settlement
    Complete {
        prior: KitchenOrder,
    },
    Rewrite {
        prior: KitchenOrder,
        body: KitchenOrderBody,
        subtotal: f64,
    },
}

impl OrderWrite {
    pub fn prior(&self) -> &KitchenOrder {
        match self {
            Self::Cancel { prior } | Self::Complete { prior } | Self::Rewrite { prior, .. } => {
                prior
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Cancel { prior } => format!("cancel order {}", prior.doc_id),
            Self::Complete { prior } => format!("complete order {}", prior.doc_id),
            Self::Rewrite { prior, .. } => format!("rewrite order {}", prior.doc_id),
        }
    }
}

/// One write per touched order
///
/// Only pending orders are edited: a ticket the kitchen already completed
/// (or one cancelled earlier) keeps its document, the bill just stops
/// referencing it.
pub(crate) fn plan_order_writes(
    orders: Vec<KitchenOrder>,
    reductions: &Reductions,
) -> Vec<OrderWrite> {
    orders
        .into_iter()
        .filter(|o| o.status == KitchenOrderStatus::Pending)
        .filter_map(|order| {
            let cuts = reductions.cuts_for(&order.doc_id)?;
            let body = reduce_body(&order.body, cuts);
            if body == order.body {
                return None;
            }
            if body.is_empty() {
                Some(OrderWrite::Cancel { prior: order })
            } else {
                let subtotal = money::to_f64(money::order_subtotal(&body));
                Some(OrderWrite::Rewrite {
                    prior: order,
                    body,
                    subtotal,
                })
            }
        })
        .collect()
}

/// Menu snapshot carried by a kitchen order
pub(crate) fn snapshot(line: &LineItem) -> ItemSnapshot {
    ItemSnapshot {
        item_id: line.id.clone(),
        item_name: line.name.clone(),
        item_price: line.price,
    }
}
