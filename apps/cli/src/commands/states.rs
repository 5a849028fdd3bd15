//! 状态表命令

use clap::Args;
use nesting_process::{PickAndPlaceState, pick_and_place_rules};

/// 状态表命令参数
#[derive(Args, Debug)]
pub struct StatesCommand {
    /// 只打印状态名，不打印后继
    #[arg(long)]
    pub names_only: bool,
}

impl StatesCommand {
    pub fn execute(&self) {
        for line in render_states(self.names_only) {
            println!("{}", line);
        }
    }
}

/// 每个状态一行：`<id> <NAME> -> <后继...>`，后继按 id 排序
pub fn render_states(names_only: bool) -> Vec<String> {
    let rules = pick_and_place_rules();
    PickAndPlaceState::ALL
        .iter()
        .map(|&state| {
            let id = u8::from(state);
            if names_only {
                return state.name().to_string();
            }
            let mut successors: Vec<PickAndPlaceState> = rules
                .successors(state)
                .map(|set| set.iter().copied().collect())
                .unwrap_or_default();
            successors.sort_by_key(|s| u8::from(*s));
            let targets: Vec<&str> = successors.iter().map(|s| s.name()).collect();
            format!("{:>2} {:<30} -> {}", id, state.name(), targets.join(", "))
        })
        .collect()
}
