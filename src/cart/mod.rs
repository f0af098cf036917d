//! Client-held shopping cart aggregate.
//!
//! The cart is an explicit state container driven by a pure reducer:
//! [`apply`] takes the current state and one [`CartEvent`] and returns the
//! next state, recomputing `total_items` and `subtotal` from the item list
//! on every application so the derived fields can never drift. Persistence
//! is a thin adapter behind [`store::CartStorage`]; the reducer itself has
//! no storage or UI dependency.
//!
//! The server never trusts this state: settlement recomputes all totals
//! from the submitted line items.

pub mod store;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One line in the cart, unique by `variant_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartState {
    pub items: Vec<CartLine>,
    pub total_items: u32,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone)]
pub enum CartEvent {
    /// Add a line; an existing line with the same `variant_id` has its
    /// quantity incremented instead of being duplicated.
    ItemAdded(CartLine),
    ItemRemoved { variant_id: Uuid },
    /// Set a line's quantity; zero or negative removes the line.
    QuantityChanged { variant_id: Uuid, quantity: i32 },
    Cleared,
}

/// Pure reducer: current state + event -> next state.
pub fn apply(mut state: CartState, event: CartEvent) -> CartState {
    match event {
        CartEvent::ItemAdded(line) => {
            let incoming = line.quantity.max(1);
            match state
                .items
                .iter_mut()
                .find(|l| l.variant_id == line.variant_id)
            {
                Some(existing) => existing.quantity += incoming,
                None => state.items.push(CartLine {
                    quantity: incoming,
                    ..line
                }),
            }
        }
        CartEvent::ItemRemoved { variant_id } => {
            state.items.retain(|l| l.variant_id != variant_id);
        }
        CartEvent::QuantityChanged {
            variant_id,
            quantity,
        } => {
            if quantity <= 0 {
                state.items.retain(|l| l.variant_id != variant_id);
            } else if let Some(line) =
                state.items.iter_mut().find(|l| l.variant_id == variant_id)
            {
                line.quantity = quantity as u32;
            }
        }
        CartEvent::Cleared => state.items.clear(),
    }
    recompute(state)
}

/// Derived totals are always rebuilt from the item list, never adjusted
/// incrementally.
fn recompute(mut state: CartState) -> CartState {
    state.total_items = state.items.iter().map(|l| l.quantity).sum();
    state.subtotal = state
        .items
        .iter()
        .map(|l| l.unit_price * Decimal::from(l.quantity))
        .sum();
    state
}
