//! `keel plan`: print the order of observer groups

use keel_core::{KeelConfig, LifeCycleEvent, LifeCycleObserverGroup};

use super::{build_application, observer_name};

/// Print the start order, then the stop order, one group per line
pub fn execute(config: &KeelConfig) -> anyhow::Result<()> {
    let app = build_application(config)?;
    let groups = app.registry().get_observer_groups_by_order();

    println!("{}:", LifeCycleEvent::Start);
    for group in &groups {
        println!("{}", format_group(group, false));
    }

    println!("{}:", LifeCycleEvent::Stop);
    for group in groups.iter().rev() {
        println!("{}", format_group(group, true));
    }

    Ok(())
}

fn format_group(group: &LifeCycleObserverGroup, reverse: bool) -> String {
    let mut names: Vec<&str> = group
        .bindings
        .iter()
        .map(|binding| observer_name(binding.key()))
        .collect();
    if reverse {
        names.reverse();
    }

    let label = if group.group.is_empty() {
        "<default>"
    } else {
        group.group.as_str()
    };
    format!("  {}: {}", label, names.join(", "))
}
