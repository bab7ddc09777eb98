//! Auto-registrar (spec §4.4.2): given a discovered device's object
//! list, generates a `points.yaml`-shaped YAML point template. A
//! convenience for operators wiring up a newly discovered device, not
//! invoked automatically by the scheduler.

use gw_errors::Result;
use serde::Serialize;

use crate::bacnet::types::ObjectId;

#[derive(Serialize)]
struct TemplatePoint {
    address: String,
    name: String,
    #[serde(rename = "type")]
    point_type: &'static str,
    unit: String,
}

#[derive(Serialize)]
struct TemplateFunction {
    function: String,
    points: Vec<TemplatePoint>,
}

#[derive(Serialize)]
struct TemplateDevice {
    device_id: String,
    protocol: &'static str,
    functions: Vec<TemplateFunction>,
}

/// Generates a YAML point template from a device's object list, grouped
/// by BACnet object type (the function-code analogue for this protocol).
pub fn generate_template(device_id: &str, object_list: &[ObjectId]) -> Result<String> {
    let mut by_type: std::collections::BTreeMap<String, Vec<TemplatePoint>> = Default::default();
    for obj in object_list {
        let point_type = if matches!(
            obj.object_type,
            crate::bacnet::types::ObjectType::BinaryInput
                | crate::bacnet::types::ObjectType::BinaryOutput
                | crate::bacnet::types::ObjectType::BinaryValue
        ) {
            "bool"
        } else {
            "float"
        };
        by_type.entry(obj.object_type.to_string()).or_default().push(TemplatePoint {
            address: obj.to_string(),
            name: format!("{}_{}", obj.object_type, obj.instance),
            point_type,
            unit: String::new(),
        });
    }

    let device = TemplateDevice {
        device_id: device_id.to_string(),
        protocol: "bacnet",
        functions: by_type
            .into_iter()
            .map(|(function, points)| TemplateFunction { function, points })
            .collect(),
    };

    serde_yaml::to_string(&[device]).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bacnet::types::ObjectType;

    #[test]
    fn generates_one_function_group_per_object_type() {
        let objects = vec![
            ObjectId { object_type: ObjectType::AnalogInput, instance: 1 },
            ObjectId { object_type: ObjectType::AnalogInput, instance: 2 },
            ObjectId { object_type: ObjectType::BinaryOutput, instance: 1 },
        ];
        let yaml = generate_template("dev1", &objects).unwrap();
        assert!(yaml.contains("analogInput"));
        assert!(yaml.contains("binaryOutput"));
        assert!(yaml.contains("device_id"));
    }
}
