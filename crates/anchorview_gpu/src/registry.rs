//! Dense integer slot tables.
//!
//! Every index the host and the shaders must agree on is listed in a
//! [`SlotTable`]. Tables are `const`, so density and collision checks run as
//! compile-time assertions next to each table; the same checks are exposed at
//! runtime for tooling and start-up validation.
//!
//! A table may follow another one (a *tier*): its first slot is the preceding
//! table's [`SlotTable::end`], never a literal. Growing the earlier tier then
//! shifts every later tier by the same amount.

use crate::error::{ContractError, Result};

/// A named slot number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotEntry<'a> {
    pub name: &'a str,
    pub slot: u32,
}

impl<'a> SlotEntry<'a> {
    pub const fn new(name: &'a str, slot: u32) -> Self {
        Self { name, slot }
    }
}

/// First problem found in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDefect {
    /// Two roles (or a role and a retired number) share this slot.
    Duplicate(u32),
    /// Nothing occupies this slot.
    Gap(u32),
    /// Slot lies outside `first..end`.
    OutOfRange(u32),
}

/// A contiguous range of slot numbers for one binding category.
#[derive(Debug, Clone, Copy)]
pub struct SlotTable<'a> {
    pub category: &'a str,
    /// First slot of the range (0 for a base tier).
    pub first: u32,
    pub entries: &'a [SlotEntry<'a>],
    /// Numbers of retired roles. They stay occupied forever so a stale shader
    /// can never bind to a new role by accident.
    pub retired: &'a [u32],
}

impl<'a> SlotTable<'a> {
    pub const fn new(category: &'a str, first: u32, entries: &'a [SlotEntry<'a>]) -> Self {
        Self {
            category,
            first,
            entries,
            retired: &[],
        }
    }

    pub const fn with_retired(self, retired: &'a [u32]) -> Self {
        Self { retired, ..self }
    }

    /// Number of occupied slots, live and retired.
    pub const fn len(&self) -> u32 {
        (self.entries.len() + self.retired.len()) as u32
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the last occupied slot. A following tier starts here.
    pub const fn end(&self) -> u32 {
        self.first + self.len()
    }

    /// True when `self` starts exactly where `previous` ends.
    pub const fn follows(&self, previous: &SlotTable<'_>) -> bool {
        self.first == previous.end()
    }

    const fn occupant(&self, index: usize) -> u32 {
        if index < self.entries.len() {
            self.entries[index].slot
        } else {
            self.retired[index - self.entries.len()]
        }
    }

    const fn occurrences(&self, slot: u32) -> u32 {
        let total = self.entries.len() + self.retired.len();
        let mut count = 0;
        let mut i = 0;
        while i < total {
            if self.occupant(i) == slot {
                count += 1;
            }
            i += 1;
        }
        count
    }

    /// Finds the first density or collision problem, if any.
    pub const fn defect(&self) -> Option<SlotDefect> {
        let total = self.entries.len() + self.retired.len();
        let end = self.end();

        let mut i = 0;
        while i < total {
            let slot = self.occupant(i);
            if slot < self.first || slot >= end {
                return Some(SlotDefect::OutOfRange(slot));
            }
            i += 1;
        }

        let mut slot = self.first;
        while slot < end {
            if self.occurrences(slot) > 1 {
                return Some(SlotDefect::Duplicate(slot));
            }
            slot += 1;
        }

        // With no duplicates and every slot in range this loop cannot fire,
        // but keep it so a gap is never reported as something else.
        let mut slot = self.first;
        while slot < end {
            if self.occurrences(slot) == 0 {
                return Some(SlotDefect::Gap(slot));
            }
            slot += 1;
        }

        None
    }

    pub const fn is_valid(&self) -> bool {
        self.defect().is_none()
    }

    /// Slot assigned to a live role, looked up by name.
    pub fn slot_of(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.slot)
    }

    /// Entries ordered by slot number.
    pub fn sorted_entries(&self) -> Vec<SlotEntry<'a>> {
        let mut entries = self.entries.to_vec();
        entries.sort_by_key(|entry| entry.slot);
        entries
    }

    pub fn validate(&self) -> Result<()> {
        let category = self.category.to_string();
        match self.defect() {
            None => {
                log::debug!(
                    "{}: {} slots ({} retired) in {}..{}",
                    self.category,
                    self.len(),
                    self.retired.len(),
                    self.first,
                    self.end()
                );
                Ok(())
            }
            Some(SlotDefect::Duplicate(slot)) => Err(ContractError::DuplicateSlot { category, slot }),
            Some(SlotDefect::Gap(slot)) => Err(ContractError::SlotGap { category, slot }),
            Some(SlotDefect::OutOfRange(slot)) => Err(ContractError::SlotOutOfRange {
                category,
                slot,
                first: self.first,
                end: self.end(),
            }),
        }
    }
}

/// True when `tiers` form one dense range starting at 0.
pub const fn tiers_are_contiguous(tiers: &[&SlotTable<'_>]) -> bool {
    if tiers.is_empty() {
        return true;
    }
    if tiers[0].first != 0 {
        return false;
    }
    let mut i = 0;
    while i < tiers.len() {
        if !tiers[i].is_valid() {
            return false;
        }
        if i > 0 && !tiers[i].follows(tiers[i - 1]) {
            return false;
        }
        i += 1;
    }
    true
}

/// Runtime form of [`tiers_are_contiguous`] with a descriptive error.
pub fn validate_tiers(tiers: &[&SlotTable<'_>]) -> Result<()> {
    let mut expected = 0;
    for tier in tiers {
        tier.validate()?;
        if tier.first != expected {
            return Err(ContractError::TierMisaligned {
                category: tier.category.to_string(),
                expected,
                found: tier.first,
            });
        }
        expected = tier.end();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: SlotTable<'static> = SlotTable::new(
        "sample",
        0,
        &[
            SlotEntry::new("a", 0),
            SlotEntry::new("b", 1),
            SlotEntry::new("c", 2),
        ],
    );

    fn numbered(names: &[String], first: u32) -> Vec<SlotEntry<'_>> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| SlotEntry::new(name, first + i as u32))
            .collect()
    }

    fn names(prefix: &str, count: u32) -> Vec<String> {
        (0..count).map(|i| format!("{prefix}_{i}")).collect()
    }

    #[test]
    fn test_dense_table_is_valid() {
        assert!(SAMPLE.is_valid());
        assert_eq!(SAMPLE.len(), 3);
        assert_eq!(SAMPLE.end(), 3);
        assert_eq!(SAMPLE.slot_of("b"), Some(1));
        assert_eq!(SAMPLE.slot_of("missing"), None);
        assert!(SAMPLE.validate().is_ok());
    }

    #[test]
    fn test_duplicate_slot_detected() {
        let entries = [
            SlotEntry::new("a", 0),
            SlotEntry::new("b", 1),
            SlotEntry::new("c", 1),
        ];
        let table = SlotTable::new("dup", 0, &entries);
        assert_eq!(table.defect(), Some(SlotDefect::Duplicate(1)));

        let entries = [SlotEntry::new("a", 0), SlotEntry::new("b", 0)];
        let table = SlotTable::new("dup", 0, &entries);
        assert_eq!(table.defect(), Some(SlotDefect::Duplicate(0)));
        assert!(matches!(
            table.validate(),
            Err(ContractError::DuplicateSlot { slot: 0, .. })
        ));
    }

    #[test]
    fn test_out_of_range_detected() {
        let entries = [SlotEntry::new("a", 0), SlotEntry::new("b", 2)];
        let table = SlotTable::new("sparse", 0, &entries);
        assert_eq!(table.defect(), Some(SlotDefect::OutOfRange(2)));
    }

    #[test]
    fn test_nonzero_first_slot() {
        let entries = [SlotEntry::new("x", 4), SlotEntry::new("y", 5)];
        let table = SlotTable::new("offset", 4, &entries);
        assert!(table.is_valid());
        assert_eq!(table.end(), 6);

        let entries = [SlotEntry::new("x", 3)];
        let table = SlotTable::new("offset", 4, &entries);
        assert_eq!(table.defect(), Some(SlotDefect::OutOfRange(3)));
    }

    #[test]
    fn test_retired_slots_stay_occupied() {
        let entries = [SlotEntry::new("a", 0), SlotEntry::new("c", 2)];
        let table = SlotTable::new("retired", 0, &entries).with_retired(&[1]);
        assert!(table.is_valid());
        assert_eq!(table.end(), 3);
        assert_eq!(table.slot_of("a"), Some(0));

        // Reusing a retired number is a collision.
        let entries = [SlotEntry::new("a", 0), SlotEntry::new("b", 1)];
        let table = SlotTable::new("retired", 0, &entries).with_retired(&[1]);
        assert!(!table.is_valid());
    }

    #[test]
    fn test_sorted_entries() {
        let entries = [SlotEntry::new("b", 1), SlotEntry::new("a", 0)];
        let table = SlotTable::new("unsorted", 0, &entries);
        let sorted = table.sorted_entries();
        assert_eq!(sorted[0].name, "a");
        assert_eq!(sorted[1].name, "b");
    }

    #[test]
    fn test_tier_follows_base_for_every_size() {
        for base_len in 0..=32 {
            let base_names = names("base", base_len);
            let base_entries = numbered(&base_names, 0);
            let base = SlotTable::new("base", 0, &base_entries);

            let scene_names = names("scene", 1);
            let scene_entries = numbered(&scene_names, base.end());
            let scene = SlotTable::new("scene", base.end(), &scene_entries);

            assert_eq!(scene.first, base_len);
            assert_eq!(scene.entries[0].slot, base_len);
            assert!(tiers_are_contiguous(&[&base, &scene]));
            assert!(validate_tiers(&[&base, &scene]).is_ok());

            // Appending one role to the base tier shifts the scene tier by one.
            let grown_names = names("base", base_len + 1);
            let grown_entries = numbered(&grown_names, 0);
            let grown = SlotTable::new("base", 0, &grown_entries);
            let shifted_entries = numbered(&scene_names, grown.end());
            let shifted = SlotTable::new("scene", grown.end(), &shifted_entries);

            assert_eq!(shifted.first, scene.first + 1);
            assert_eq!(shifted.entries[0].slot, scene.entries[0].slot + 1);
            assert!(tiers_are_contiguous(&[&grown, &shifted]));

            // The old scene numbering no longer fits after the grown base.
            assert!(!tiers_are_contiguous(&[&grown, &scene]));
        }
    }

    #[test]
    fn test_misaligned_tier_reported() {
        let base_entries = [SlotEntry::new("a", 0), SlotEntry::new("b", 1)];
        let base = SlotTable::new("base", 0, &base_entries);
        let scene_entries = [SlotEntry::new("late", 3)];
        let scene = SlotTable::new("scene", 3, &scene_entries);

        assert!(!tiers_are_contiguous(&[&base, &scene]));
        assert!(matches!(
            validate_tiers(&[&base, &scene]),
            Err(ContractError::TierMisaligned {
                expected: 2,
                found: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_first_tier_must_start_at_zero() {
        let entries = [SlotEntry::new("a", 1)];
        let table = SlotTable::new("base", 1, &entries);
        assert!(table.is_valid());
        assert!(!tiers_are_contiguous(&[&table]));
        assert!(validate_tiers(&[&table]).is_err());
    }
}
