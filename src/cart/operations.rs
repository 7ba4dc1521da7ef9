//! Cart Operations
//!
//! Reconciliation of a cart collection with a requested change. Every
//! operation is pure: it reads the current collection and returns the next
//! one, leaving the input untouched.

use std::num::NonZeroU32;

use crate::{
    cart::{CartCollection, CartLineItem},
    products::{Product, ProductId},
};

/// A requested change to the cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartOperation {
    /// Add one unit of a product, merging with an existing line. A product
    /// failing [`Product::validate`] never starts a new line.
    AddItem(Product),

    /// Replace the quantity of an existing line. Non-positive quantities remove it.
    SetQuantity(ProductId, i64),

    /// Remove the line for a product.
    RemoveItem(ProductId),

    /// Remove every line.
    Clear,
}

impl CartOperation {
    /// Compute the collection that results from applying this operation.
    #[must_use]
    pub fn apply(&self, cart: &CartCollection) -> CartCollection {
        match self {
            Self::AddItem(product) => add_item(cart, product),
            Self::SetQuantity(id, quantity) => set_quantity(cart, *id, *quantity),
            Self::RemoveItem(id) => remove_item(cart, *id),
            Self::Clear => CartCollection::new(),
        }
    }

    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddItem(_) => "add_item",
            Self::SetQuantity(..) => "set_quantity",
            Self::RemoveItem(_) => "remove_item",
            Self::Clear => "clear",
        }
    }
}

fn add_item(cart: &CartCollection, product: &Product) -> CartCollection {
    let mut next = cart.clone();

    match next.position(product.id) {
        Some(idx) => {
            if let Some(item) = next.items.get_mut(idx) {
                item.quantity = item.quantity.saturating_add(1);
            }
        }
        None if product.validate().is_ok() => {
            next.items.push(CartLineItem::new(product.clone()));
        }
        None => {}
    }

    next
}

fn set_quantity(cart: &CartCollection, id: ProductId, quantity: i64) -> CartCollection {
    let Some(quantity) = positive_quantity(quantity) else {
        return remove_item(cart, id);
    };

    let mut next = cart.clone();

    if let Some(item) = next.items.iter_mut().find(|item| item.id() == id) {
        item.quantity = quantity;
    }

    next
}

fn remove_item(cart: &CartCollection, id: ProductId) -> CartCollection {
    CartCollection {
        items: cart
            .items
            .iter()
            .filter(|item| item.id() != id)
            .cloned()
            .collect(),
    }
}

/// Non-positive values have no quantity; values beyond `u32::MAX` saturate.
fn positive_quantity(quantity: i64) -> Option<NonZeroU32> {
    if quantity <= 0 {
        return None;
    }

    NonZeroU32::new(u32::try_from(quantity).unwrap_or(u32::MAX))
}
