//! Loads `edge_rules.yaml` into a [`RuleSet`] (spec §6), used both at
//! boot and by the SIGHUP reload path (spec §4.7 Reload / §4.9).

use std::path::Path;

use gw_common::load_yaml;
use gw_errors::Result;

use crate::engine::RuleSet;
use crate::types::{flatten, DeviceRuleSet};

pub fn load_ruleset(path: impl AsRef<Path>) -> Result<RuleSet> {
    let device_rule_sets: Vec<DeviceRuleSet> = load_yaml(path)?;
    let (aggregates, alarms, linkages) = flatten(device_rule_sets);
    Ok(RuleSet {
        aggregates,
        alarms,
        linkages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_flattens_edge_rules_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
- device_id: d1
  aggregate:
    - point: x
      method: avg
      window: 3
  alarm:
    - point: temp
      condition: "value > 100"
      level: warning
      message: hot
  linkage:
    - source_point: pressure
      condition: "value >= 10"
      action_device: B
      action_address: "40010"
      action_value: 1
"#
        )
        .unwrap();

        let rules = load_ruleset(file.path()).unwrap();
        assert_eq!(rules.aggregates.len(), 1);
        assert_eq!(rules.alarms.len(), 1);
        assert_eq!(rules.linkages.len(), 1);
        assert_eq!(rules.linkages[0].source_device, "d1");
    }
}
