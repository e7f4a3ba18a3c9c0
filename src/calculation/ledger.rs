//! Ordered deduction and allowance collections.
//!
//! [`LineItems`] is the editable sequence behind every deduction or allowance
//! list: the period-wide [`LineItemLedger`] and each employee's
//! [`EmployeeAdjustments`]. Entries keep insertion order, duplicate names are
//! allowed, and removing an entry shifts every later entry down by one.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{LineItem, LineItemKind, checked_sum, coerce_amount, non_negative};

/// An ordered, index-addressed sequence of line items.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::LineItems;
/// use rust_decimal::Decimal;
///
/// let mut items = LineItems::new();
/// let tax = items.add();
/// items.update_name(tax, "Tax").unwrap();
/// items.update_amount(tax, "20000").unwrap();
///
/// let bogus = items.add();
/// items.update_amount(bogus, "not a number").unwrap();
///
/// assert_eq!(items.len(), 2);
/// assert_eq!(items.total().unwrap(), Decimal::from(20_000));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineItems(Vec<LineItem>);

impl LineItems {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a blank `{name: "", amount: 0}` entry and returns its index.
    pub fn add(&mut self) -> usize {
        self.0.push(LineItem::blank());
        self.0.len() - 1
    }

    /// Appends a fully specified entry and returns its index.
    pub fn push(&mut self, item: LineItem) -> usize {
        self.0.push(LineItem::new(item.name, item.amount));
        self.0.len() - 1
    }

    /// Renames the entry at `index`.
    pub fn update_name(&mut self, index: usize, name: impl Into<String>) -> EngineResult<()> {
        let item = self.get_mut(index)?;
        item.name = name.into();
        Ok(())
    }

    /// Sets the amount at `index` from raw input, coercing invalid or
    /// negative input to zero.
    pub fn update_amount(&mut self, index: usize, raw: &str) -> EngineResult<()> {
        let item = self.get_mut(index)?;
        item.amount = coerce_amount(raw);
        Ok(())
    }

    /// Sets the amount at `index`, clamping negatives to zero.
    pub fn set_amount(&mut self, index: usize, amount: Decimal) -> EngineResult<()> {
        let item = self.get_mut(index)?;
        item.amount = non_negative(amount);
        Ok(())
    }

    /// Removes and returns the entry at `index`; later entries shift down.
    pub fn remove(&mut self, index: usize) -> EngineResult<LineItem> {
        self.check_index(index)?;
        Ok(self.0.remove(index))
    }

    /// Removes several entries, each addressed by its index before any removal.
    ///
    /// Indices are applied highest first so an earlier removal never shifts a
    /// later target. Duplicate indices are removed once. Fails without
    /// touching the sequence if any index is out of range.
    pub fn remove_many(&mut self, indices: &[usize]) -> EngineResult<Vec<LineItem>> {
        for &index in indices {
            self.check_index(index)?;
        }

        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        sorted.dedup();

        let mut removed: Vec<LineItem> = sorted.into_iter().map(|i| self.0.remove(i)).collect();
        removed.reverse();
        Ok(removed)
    }

    /// Returns the entry at `index`.
    pub fn get(&self, index: usize) -> Option<&LineItem> {
        self.0.get(index)
    }

    /// Unrounded sum of all amounts.
    ///
    /// Fails with `AmountOverflow` when the sum exceeds the decimal range.
    pub fn total(&self) -> EngineResult<Decimal> {
        checked_sum(self.0.iter().map(|item| item.amount), "line item total")
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.0.iter()
    }

    /// Returns the entries as a slice.
    pub fn as_slice(&self) -> &[LineItem] {
        &self.0
    }

    fn get_mut(&mut self, index: usize) -> EngineResult<&mut LineItem> {
        self.check_index(index)?;
        Ok(&mut self.0[index])
    }

    fn check_index(&self, index: usize) -> EngineResult<()> {
        if index >= self.0.len() {
            return Err(EngineError::LineItemIndexOutOfRange {
                index,
                len: self.0.len(),
            });
        }
        Ok(())
    }
}

impl From<Vec<LineItem>> for LineItems {
    fn from(items: Vec<LineItem>) -> Self {
        let mut seq = Self::new();
        for item in items {
            seq.push(item);
        }
        seq
    }
}

impl<'a> IntoIterator for &'a LineItems {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Period-wide deductions and allowances applied to every employee.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemLedger {
    /// Deductions applied to every employee.
    #[serde(default)]
    pub general_deductions: LineItems,
    /// Allowances applied to every employee.
    #[serde(default)]
    pub general_allowances: LineItems,
}

impl LineItemLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collection holding items of `kind`.
    pub fn collection(&self, kind: LineItemKind) -> &LineItems {
        match kind {
            LineItemKind::Deduction => &self.general_deductions,
            LineItemKind::Allowance => &self.general_allowances,
        }
    }

    /// Returns the collection holding items of `kind`, mutably.
    pub fn collection_mut(&mut self, kind: LineItemKind) -> &mut LineItems {
        match kind {
            LineItemKind::Deduction => &mut self.general_deductions,
            LineItemKind::Allowance => &mut self.general_allowances,
        }
    }
}

/// One employee's own deductions and allowances.
///
/// The missed-hours fine is not stored here; it is derived on every
/// recalculation and placed in front of these deductions in the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeAdjustments {
    /// Deductions for this employee only.
    #[serde(default)]
    pub deductions: LineItems,
    /// Allowances for this employee only.
    #[serde(default)]
    pub allowances: LineItems,
}

impl EmployeeAdjustments {
    /// Returns the collection holding items of `kind`.
    pub fn collection(&self, kind: LineItemKind) -> &LineItems {
        match kind {
            LineItemKind::Deduction => &self.deductions,
            LineItemKind::Allowance => &self.allowances,
        }
    }

    /// Returns the collection holding items of `kind`, mutably.
    pub fn collection_mut(&mut self, kind: LineItemKind) -> &mut LineItems {
        match kind {
            LineItemKind::Deduction => &mut self.deductions,
            LineItemKind::Allowance => &mut self.allowances,
        }
    }
}
