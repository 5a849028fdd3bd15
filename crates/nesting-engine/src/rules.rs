//! 转换规则表

use crate::state::MachineState;
use std::collections::{HashMap, HashSet};

/// 转换规则：状态 → 合法后继集合
///
/// 未出现在表中的状态没有任何合法后继。
#[derive(Debug, Clone)]
pub struct TransitionRules<S: MachineState> {
    rules: HashMap<S, HashSet<S>>,
}

impl<S: MachineState> TransitionRules<S> {
    pub fn new() -> Self {
        TransitionRules {
            rules: HashMap::new(),
        }
    }

    /// 允许 `from → to`（链式）
    pub fn allow(mut self, from: S, to: S) -> Self {
        self.rules.entry(from).or_default().insert(to);
        self
    }

    /// 允许 `from` 转换到 `targets` 中的任意状态（链式）
    pub fn allow_all<I>(mut self, from: S, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        self.rules.entry(from).or_default().extend(targets);
        self
    }

    /// `from → to` 是否合法
    pub fn allows(&self, from: S, to: S) -> bool {
        self.rules
            .get(&from)
            .is_some_and(|targets| targets.contains(&to))
    }

    /// `from` 的合法后继集合
    pub fn successors(&self, from: S) -> Option<&HashSet<S>> {
        self.rules.get(&from)
    }

    /// 表中声明了后继的状态
    pub fn states(&self) -> impl Iterator<Item = S> + '_ {
        self.rules.keys().copied()
    }
}

impl<S: MachineState> Default for TransitionRules<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MachineState> FromIterator<(S, S)> for TransitionRules<S> {
    fn from_iter<I: IntoIterator<Item = (S, S)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(TransitionRules::new(), |rules, (from, to)| rules.allow(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Door {
        Open,
        Closed,
        Locked,
    }

    impl MachineState for Door {
        fn name(&self) -> &'static str {
            match self {
                Door::Open => "OPEN",
                Door::Closed => "CLOSED",
                Door::Locked => "LOCKED",
            }
        }
    }

    fn door_rules() -> TransitionRules<Door> {
        TransitionRules::new()
            .allow(Door::Open, Door::Closed)
            .allow_all(Door::Closed, [Door::Open, Door::Locked])
            .allow(Door::Locked, Door::Closed)
    }

    #[test]
    fn test_allows() {
        let rules = door_rules();
        assert!(rules.allows(Door::Open, Door::Closed));
        assert!(rules.allows(Door::Closed, Door::Locked));
        // 不能从打开直接上锁
        assert!(!rules.allows(Door::Open, Door::Locked));
        // 未声明自环
        assert!(!rules.allows(Door::Open, Door::Open));
    }

    #[test]
    fn test_successors() {
        let rules = door_rules();
        let successors = rules.successors(Door::Closed).unwrap();
        assert_eq!(successors.len(), 2);
        assert_eq!(rules.states().count(), 3);
    }

    #[test]
    fn test_from_iterator() {
        let rules: TransitionRules<Door> =
            [(Door::Open, Door::Closed), (Door::Closed, Door::Open)]
                .into_iter()
                .collect();
        assert!(rules.allows(Door::Closed, Door::Open));
        assert!(rules.successors(Door::Locked).is_none());
    }
}
