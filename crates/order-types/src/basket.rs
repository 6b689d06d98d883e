//! Session basket: the working state of an order before it is finalized.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One basket entry: a food name as spoken and its accumulated quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItem {
	pub name: String,
	pub quantity: u32,
}

/// Ordered mapping from food name to quantity.
///
/// Entries keep the position of their first add so confirmations read in the
/// order the customer asked for things. Quantities are always positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
	items: Vec<BasketItem>,
}

impl Basket {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `quantity` of `name`, accumulating onto an existing entry.
	/// A zero quantity is a no-op.
	pub fn add(&mut self, name: &str, quantity: u32) {
		if quantity == 0 {
			return;
		}
		match self.items.iter_mut().find(|item| item.name == name) {
			Some(item) => item.quantity = item.quantity.saturating_add(quantity),
			None => self.items.push(BasketItem {
				name: name.to_string(),
				quantity,
			}),
		}
	}

	/// Deletes the entry for `name` entirely. Returns whether it was present.
	pub fn remove(&mut self, name: &str) -> bool {
		let before = self.items.len();
		self.items.retain(|item| item.name != name);
		self.items.len() != before
	}

	pub fn quantity_of(&self, name: &str) -> Option<u32> {
		self.items
			.iter()
			.find(|item| item.name == name)
			.map(|item| item.quantity)
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn iter(&self) -> impl Iterator<Item = &BasketItem> {
		self.items.iter()
	}

	/// Moves every entry out, leaving this basket empty.
	pub fn take(&mut self) -> Basket {
		std::mem::take(self)
	}
}

impl<'a> IntoIterator for &'a Basket {
	type Item = &'a BasketItem;
	type IntoIter = std::slice::Iter<'a, BasketItem>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

/// Renders as `2 x Burger, 1 x Fries`.
impl fmt::Display for Basket {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (i, item) in self.items.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			write!(f, "{} x {}", item.quantity, item.name)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_add_accumulates() {
		let mut basket = Basket::new();
		basket.add("Burger", 2);
		basket.add("Fries", 1);
		basket.add("Burger", 1);

		assert_eq!(basket.quantity_of("Burger"), Some(3));
		assert_eq!(basket.len(), 2);
		assert_eq!(basket.to_string(), "3 x Burger, 1 x Fries");
	}

	#[test]
	fn test_remove_deletes_whole_entry() {
		let mut basket = Basket::new();
		basket.add("Pizza", 4);

		assert!(basket.remove("Pizza"));
		assert!(!basket.remove("Pizza"));
		assert!(basket.is_empty());
	}

	#[test]
	fn test_take_leaves_empty() {
		let mut basket = Basket::new();
		basket.add("Lassi", 1);

		let taken = basket.take();
		assert_eq!(taken.quantity_of("Lassi"), Some(1));
		assert!(basket.is_empty());
	}
}
