//! Write Sequencing
//!
//! Positional writes are stamped per container at dispatch. A settled
//! response is merged only if no later-issued write to the same container
//! has been merged already, so the last-issued reorder wins no matter in
//! which order the network round trips complete.

use std::collections::HashMap;

use crate::models::{BoardId, ListId};

/// A container whose child ordering is written as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    /// The list sequence of a board
    Board(BoardId),
    /// The card sequence of a list
    List(ListId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteTicket {
    pub container: Container,
    stamp: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerVersions {
    issued: HashMap<Container, u64>,
    applied: HashMap<Container, u64>,
}

impl ContainerVersions {
    pub fn issue(&mut self, container: Container) -> WriteTicket {
        let stamp = self.issued.entry(container).or_insert(0);
        *stamp += 1;
        WriteTicket {
            container,
            stamp: *stamp,
        }
    }

    /// False once a later-issued write to the same container was merged
    pub fn is_current(&self, ticket: &WriteTicket) -> bool {
        self.applied
            .get(&ticket.container)
            .map_or(true, |applied| *applied < ticket.stamp)
    }

    pub fn commit(&mut self, ticket: &WriteTicket) {
        let applied = self.applied.entry(ticket.container).or_insert(0);
        *applied = (*applied).max(ticket.stamp);
    }

    /// Make every write issued so far for the container stale.
    ///
    /// Used when the container leaves local state. Stamps keep counting up,
    /// so a write issued before the container left can never pass for one
    /// issued after it came back.
    pub fn retire(&mut self, container: Container) {
        if let Some(issued) = self.issued.get(&container).copied() {
            self.applied.insert(container, issued);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_later_issue_wins_when_it_settles_first() {
        let mut versions = ContainerVersions::default();
        let first = versions.issue(Container::List(1));
        let second = versions.issue(Container::List(1));

        assert!(versions.is_current(&second));
        versions.commit(&second);
        assert!(!versions.is_current(&first));
    }

    #[test]
    fn test_in_order_settlement_applies_both() {
        let mut versions = ContainerVersions::default();
        let first = versions.issue(Container::Board(7));
        let second = versions.issue(Container::Board(7));

        assert!(versions.is_current(&first));
        versions.commit(&first);
        assert!(versions.is_current(&second));
    }

    #[test]
    fn test_containers_are_independent() {
        let mut versions = ContainerVersions::default();
        let list_one = versions.issue(Container::List(1));
        let list_two = versions.issue(Container::List(2));
        versions.commit(&list_two);
        assert!(versions.is_current(&list_one));
    }

    #[test]
    fn test_retired_container_rejects_earlier_writes() {
        let mut versions = ContainerVersions::default();
        let before = versions.issue(Container::Board(3));
        versions.retire(Container::Board(3));
        assert!(!versions.is_current(&before));

        let after = versions.issue(Container::Board(3));
        assert!(after.stamp > before.stamp);
        assert!(versions.is_current(&after));
        versions.commit(&after);
        assert!(!versions.is_current(&before));
    }

    #[test]
    fn test_retire_without_writes_is_noop() {
        let mut versions = ContainerVersions::default();
        versions.retire(Container::List(9));
        let ticket = versions.issue(Container::List(9));
        assert!(versions.is_current(&ticket));
    }
}
