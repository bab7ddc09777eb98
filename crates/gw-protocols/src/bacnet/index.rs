//! Three-way point index for the BACnet adapter (spec §4.4.2): lookup by
//! `name`, by `id` (`<deviceId>.<name>`), and by `address`
//! (`<objectType>:<instance>`), tried in that order for any point key.

use std::collections::HashMap;

use crate::bacnet::types::{ObjectId, PropertyValueType};

#[derive(Debug, Clone)]
pub struct BacnetPoint {
    pub device_id: String,
    pub name: String,
    pub object_id: ObjectId,
    pub property: String,
    pub declared_type: PropertyValueType,
    pub writable: bool,
}

impl BacnetPoint {
    pub fn id(&self) -> String {
        format!("{}.{}", self.device_id, self.name)
    }

    pub fn address(&self) -> String {
        self.object_id.to_string()
    }
}

#[derive(Default)]
pub struct BacnetIndex {
    by_name: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
    by_address: HashMap<String, usize>,
    points: Vec<BacnetPoint>,
}

impl BacnetIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, point: BacnetPoint) {
        let idx = self.points.len();
        self.by_name.insert(point.name.clone(), idx);
        self.by_id.insert(point.id(), idx);
        self.by_address.insert(point.address(), idx);
        self.points.push(point);
    }

    /// Tries `name`, then `id`, then `address`, in that order (spec
    /// §4.4.2).
    pub fn lookup(&self, key: &str) -> Option<&BacnetPoint> {
        self.by_name
            .get(key)
            .or_else(|| self.by_id.get(key))
            .or_else(|| self.by_address.get(key))
            .map(|&idx| &self.points[idx])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BacnetPoint> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bacnet::types::ObjectType;

    fn point() -> BacnetPoint {
        BacnetPoint {
            device_id: "dev1".into(),
            name: "temp".into(),
            object_id: ObjectId {
                object_type: ObjectType::AnalogInput,
                instance: 3,
            },
            property: "presentValue".into(),
            declared_type: PropertyValueType::Real,
            writable: false,
        }
    }

    #[test]
    fn lookup_tries_name_then_id_then_address() {
        let mut idx = BacnetIndex::new();
        idx.insert(point());
        assert!(idx.lookup("temp").is_some());
        assert!(idx.lookup("dev1.temp").is_some());
        assert!(idx.lookup("analogInput:3").is_some());
        assert!(idx.lookup("nonexistent").is_none());
    }
}
