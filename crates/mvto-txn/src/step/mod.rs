//! Transaction steps.

use std::collections::BTreeSet;
use std::fmt;

use mvto_common::types::ItemId;

/// Whether a step reads or writes its item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Read the visible version into the working set.
    Read,
    /// Write the working-set value as a new version.
    Write,
}

impl StepKind {
    fn tag(self) -> char {
        match self {
            StepKind::Read => 'r',
            StepKind::Write => 'w',
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Read => write!(f, "Read"),
            StepKind::Write => write!(f, "Write"),
        }
    }
}

/// One operation of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    /// Read or write.
    pub kind: StepKind,
    /// Target item.
    pub item: ItemId,
}

impl Step {
    /// Creates a read step.
    pub const fn read(item: ItemId) -> Self {
        Self {
            kind: StepKind::Read,
            item,
        }
    }

    /// Creates a write step.
    pub const fn write(item: ItemId) -> Self {
        Self {
            kind: StepKind::Write,
            item,
        }
    }

    /// Returns true for read steps.
    pub fn is_read(&self) -> bool {
        self.kind == StepKind::Read
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.tag(), self.item.as_u64())
    }
}

/// A fixed sequence of steps, replayed in full on every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
    steps: Vec<Step>,
}

impl Transaction {
    /// Creates a transaction from its steps.
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Returns the steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns the number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if there are no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns the distinct items the transaction touches.
    pub fn items(&self) -> BTreeSet<ItemId> {
        self.steps.iter().map(|step| step.item).collect()
    }
}

impl FromIterator<Step> for Transaction {
    fn from_iter<I: IntoIterator<Item = Step>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", step)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_display() {
        assert_eq!(Step::read(ItemId::new(3)).to_string(), "r3");
        assert_eq!(Step::write(ItemId::new(0)).to_string(), "w0");
        assert_eq!(StepKind::Write.to_string(), "Write");
    }

    #[test]
    fn test_transaction() {
        let txn: Transaction = [
            Step::read(ItemId::new(2)),
            Step::write(ItemId::new(2)),
            Step::write(ItemId::new(0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(txn.len(), 3);
        assert!(!txn.is_empty());
        assert!(txn.steps()[0].is_read());
        assert_eq!(
            txn.items().into_iter().collect::<Vec<_>>(),
            vec![ItemId::new(0), ItemId::new(2)]
        );
        assert_eq!(txn.to_string(), "[r2 w2 w0]");
    }

    #[test]
    fn test_empty_transaction() {
        let txn = Transaction::default();
        assert!(txn.is_empty());
        assert_eq!(txn.to_string(), "[]");
    }
}
