//! Per-player resource ledger with capacity clamping

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

/// The four tradeable resources
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Food = 0,
    Wood = 1,
    Iron = 2,
    Stone = 3,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Food, Resource::Wood, Resource::Iron, Resource::Stone];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Food => "food",
            Resource::Wood => "wood",
            Resource::Iron => "iron",
            Resource::Stone => "stone",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A bundle of all four resources (costs, storage, production)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resources {
    pub food: i32,
    pub wood: i32,
    pub iron: i32,
    pub stone: i32,
}

impl Resources {
    pub const ZERO: Resources = Resources::new(0, 0, 0, 0);

    pub const fn new(food: i32, wood: i32, iron: i32, stone: i32) -> Self {
        Self { food, wood, iron, stone }
    }

    /// Same amount of every resource
    pub const fn splat(amount: i32) -> Self {
        Self::new(amount, amount, amount, amount)
    }

    pub fn get(&self, resource: Resource) -> i32 {
        match resource {
            Resource::Food => self.food,
            Resource::Wood => self.wood,
            Resource::Iron => self.iron,
            Resource::Stone => self.stone,
        }
    }

    pub fn scaled(&self, factor: i32) -> Self {
        Self::new(self.food * factor, self.wood * factor, self.iron * factor, self.stone * factor)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// (resource, amount) pairs in food, wood, iron, stone order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, i32)> + '_ {
        Resource::ALL.into_iter().map(move |r| (r, self.get(r)))
    }
}

impl Add for Resources {
    type Output = Resources;

    fn add(self, rhs: Resources) -> Resources {
        Resources::new(
            self.food + rhs.food,
            self.wood + rhs.wood,
            self.iron + rhs.iron,
            self.stone + rhs.stone,
        )
    }
}

impl Sub for Resources {
    type Output = Resources;

    fn sub(self, rhs: Resources) -> Resources {
        Resources::new(
            self.food - rhs.food,
            self.wood - rhs.wood,
            self.iron - rhs.iron,
            self.stone - rhs.stone,
        )
    }
}

/// Current amounts and capacities. `0 <= amount <= capacity` holds after every call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    amounts: [i32; 4],
    capacities: [i32; 4],
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn amount(&self, resource: Resource) -> i32 {
        self.amounts[resource as usize]
    }

    pub fn capacity(&self, resource: Resource) -> i32 {
        self.capacities[resource as usize]
    }

    pub fn amounts(&self) -> Resources {
        let [food, wood, iron, stone] = self.amounts;
        Resources::new(food, wood, iron, stone)
    }

    pub fn capacities(&self) -> Resources {
        let [food, wood, iron, stone] = self.capacities;
        Resources::new(food, wood, iron, stone)
    }

    /// Add `amount`, clamped to capacity. Negative amounts are taken instead.
    pub fn give(&mut self, amount: i32, resource: Resource) -> bool {
        if amount == 0 {
            return true;
        }
        if amount < 0 {
            return self.take(amount.saturating_abs(), resource);
        }
        let i = resource as usize;
        self.amounts[i] = self.amounts[i].saturating_add(amount).min(self.capacities[i]);
        true
    }

    /// Remove `amount` if the balance covers it; otherwise nothing changes.
    /// Negative amounts are given instead.
    pub fn take(&mut self, amount: i32, resource: Resource) -> bool {
        if amount == 0 {
            return true;
        }
        if amount < 0 {
            return self.give(amount.saturating_abs(), resource);
        }
        let i = resource as usize;
        if self.amounts[i] >= amount {
            self.amounts[i] -= amount;
            true
        } else {
            false
        }
    }

    /// Adjust capacity (never below zero), dropping any balance above it
    pub fn add_capacity(&mut self, amount: i32, resource: Resource) {
        if amount == 0 {
            return;
        }
        let i = resource as usize;
        self.capacities[i] = self.capacities[i].saturating_add(amount).max(0);
        if self.amounts[i] > self.capacities[i] {
            let excess = self.amounts[i] - self.capacities[i];
            self.take(excess, resource);
        }
    }

    /// Adjust all four capacities at once
    pub fn add_capacities(&mut self, delta: Resources) {
        for (resource, amount) in delta.iter() {
            self.add_capacity(amount, resource);
        }
    }

    /// True when every threshold is met
    pub fn has(&self, cost: &Resources) -> bool {
        cost.iter().all(|(r, amount)| self.amount(r) >= amount)
    }

    pub fn give_all(&mut self, resources: &Resources) {
        for (resource, amount) in resources.iter() {
            self.give(amount, resource);
        }
    }

    /// Take every resource, or nothing when any balance falls short
    pub fn take_all(&mut self, cost: &Resources) -> bool {
        if !self.has(cost) {
            return false;
        }
        for (resource, amount) in cost.iter() {
            self.take(amount, resource);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stocked() -> Inventory {
        let mut inv = Inventory::new();
        inv.add_capacities(Resources::new(100, 100, 50, 50));
        inv.give_all(&Resources::new(40, 40, 40, 40));
        inv
    }

    #[test]
    fn test_give_clamps_to_capacity() {
        let mut inv = stocked();
        assert!(inv.give(70, Resource::Food));
        assert_eq!(inv.amount(Resource::Food), 100);
        assert!(inv.give(5, Resource::Iron));
        assert_eq!(inv.amount(Resource::Iron), 45);
    }

    #[test]
    fn test_give_single_application() {
        let mut inv = stocked();
        inv.give(30, Resource::Wood);
        assert_eq!(inv.amount(Resource::Wood), 70);
    }

    #[test]
    fn test_take_insufficient_leaves_state() {
        let mut inv = stocked();
        let before = inv.clone();
        assert!(!inv.take(41, Resource::Stone));
        assert_eq!(inv, before);
        assert!(inv.take(40, Resource::Stone));
        assert_eq!(inv.amount(Resource::Stone), 0);
    }

    #[test]
    fn test_negative_amounts_delegate() {
        let mut inv = stocked();
        assert!(inv.give(-10, Resource::Food));
        assert_eq!(inv.amount(Resource::Food), 30);
        assert!(inv.take(-5, Resource::Food));
        assert_eq!(inv.amount(Resource::Food), 35);
        assert!(!inv.give(-100, Resource::Food));
        assert_eq!(inv.amount(Resource::Food), 35);
    }

    #[test]
    fn test_zero_is_noop() {
        let mut inv = Inventory::new();
        assert!(inv.give(0, Resource::Food));
        assert!(inv.take(0, Resource::Food));
        assert_eq!(inv, Inventory::new());
    }

    #[test]
    fn test_capacity_shrink_reclamps() {
        let mut inv = stocked();
        inv.add_capacity(-80, Resource::Food);
        assert_eq!(inv.capacity(Resource::Food), 20);
        assert_eq!(inv.amount(Resource::Food), 20);
        inv.add_capacity(-500, Resource::Food);
        assert_eq!(inv.capacity(Resource::Food), 0);
        assert_eq!(inv.amount(Resource::Food), 0);
    }

    #[test]
    fn test_has_and_take_all() {
        let mut inv = stocked();
        assert!(inv.has(&Resources::new(40, 40, 40, 40)));
        assert!(!inv.has(&Resources::new(0, 0, 0, 41)));
        let before = inv.clone();
        assert!(!inv.take_all(&Resources::new(10, 10, 10, 41)));
        assert_eq!(inv, before);
        assert!(inv.take_all(&Resources::new(10, 20, 30, 40)));
        assert_eq!(inv.amounts(), Resources::new(30, 20, 10, 0));
    }
}
