//! Item removal confirmation
//!
//! ```text
//! Idle ──request──▶ PendingConfirm(item) ──confirm──▶ Removed(item)
//!                         │
//!                         └──cancel──▶ Idle
//! ```
//!
//! Decrementing a line at quantity 1 never removes it. The flow parks the
//! item in `PendingConfirm` with the cart untouched; only `confirm` runs the
//! engine's removal path.

use super::cart::{Cart, DecrementOutcome};
use super::reconcile::BillingEngine;
use crate::error::{BillingError, BillingResult, ValidationError};
use shared::models::LineItem;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RemovalState {
    #[default]
    Idle,
    PendingConfirm {
        item_id: String,
        item_name: String,
    },
    Removed {
        item_id: String,
    },
}

#[derive(Debug, Default)]
pub struct RemovalFlow {
    state: RemovalState,
}

impl RemovalFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RemovalState {
        &self.state
    }

    pub fn pending_item(&self) -> Option<&str> {
        match &self.state {
            RemovalState::PendingConfirm { item_id, .. } => Some(item_id),
            _ => None,
        }
    }

    /// Decrement, asking for confirmation instead of going to zero
    pub fn request_decrement(
        &mut self,
        cart: &mut Cart,
        item_id: &str,
    ) -> BillingResult<DecrementOutcome> {
        let outcome = cart.decrement(item_id)?;
        if outcome == DecrementOutcome::RequiresConfirmation {
            self.park(cart, item_id)?;
        }
        Ok(outcome)
    }

    /// Explicit remove button
    pub fn request_removal(&mut self, cart: &Cart, item_id: &str) -> BillingResult<()> {
        self.park(cart, item_id)
    }

    /// Back to idle, cart unchanged
    pub fn cancel(&mut self) {
        self.state = RemovalState::Idle;
    }

    pub async fn confirm(
        &mut self,
        engine: &BillingEngine,
        cart: &mut Cart,
    ) -> BillingResult<LineItem> {
        let RemovalState::PendingConfirm { item_id, .. } = &self.state else {
            return Err(ValidationError::NoPendingRemoval.into());
        };
        let item_id = item_id.clone();
        // On failure stay in PendingConfirm so the cashier can retry
        let removed = engine.remove_item(cart, &item_id).await?;
        self.state = RemovalState::Removed { item_id };
        Ok(removed)
    }

    fn park(&mut self, cart: &Cart, item_id: &str) -> BillingResult<()> {
        let line = cart
            .line(item_id)
            .ok_or_else(|| BillingError::ItemNotFound(item_id.to_string()))?;
        self.state = RemovalState::PendingConfirm {
            item_id: line.id.clone(),
            item_name: line.name.clone(),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::models::{FulfillmentType, MenuItem};
    use std::sync::Arc;

    fn cart_with(id: &str) -> Cart {
        let mut cart = Cart::new(FulfillmentType::TakeAway);
        cart.add_item(&MenuItem {
            doc_id: id.to_string(),
            name: "Masala Dosa".to_string(),
            price: 90.0,
            item_type: None,
            category: None,
        });
        cart
    }

    #[test]
    fn test_decrement_at_one_parks_item() {
        let mut cart = cart_with("dosa");
        let mut flow = RemovalFlow::new();

        let outcome = flow.request_decrement(&mut cart, "dosa").unwrap();
        assert_eq!(outcome, DecrementOutcome::RequiresConfirmation);
        assert_eq!(
            flow.state(),
            &RemovalState::PendingConfirm {
                item_id: "dosa".to_string(),
                item_name: "Masala Dosa".to_string(),
            }
        );
        assert_eq!(cart.line("dosa").unwrap().quantity, 1);

        flow.cancel();
        assert_eq!(flow.state(), &RemovalState::Idle);
        assert_eq!(cart.items().len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_removes() {
        let engine = BillingEngine::new(Arc::new(MemoryStore::new()), chrono_tz::Asia::Kolkata);
        let mut cart = cart_with("dosa");
        let mut flow = RemovalFlow::new();

        let err = flow.confirm(&engine, &mut cart).await.unwrap_err();
        assert!(matches!(
            err,
            BillingError::Validation(ValidationError::NoPendingRemoval)
        ));

        flow.request_removal(&cart, "dosa").unwrap();
        assert_eq!(flow.pending_item(), Some("dosa"));
        let removed = flow.confirm(&engine, &mut cart).await.unwrap();
        assert_eq!(removed.id, "dosa");
        assert!(cart.items().is_empty());
        assert_eq!(
            flow.state(),
            &RemovalState::Removed {
                item_id: "dosa".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_item() {
        let cart = cart_with("dosa");
        let mut flow = RemovalFlow::new();
        assert!(flow.request_removal(&cart, "idli").is_err());
        assert_eq!(flow.state(), &RemovalState::Idle);
    }
}
