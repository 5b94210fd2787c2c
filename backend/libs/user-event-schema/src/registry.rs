//! Topic registry
//!
//! Maps every [`UserEventType`] to exactly one Kafka topic. The registry is
//! validated once when it is built and never mutated afterwards, so lookups
//! are total: there is no "unknown type" fallback to an empty topic name.

use crate::error::{SchemaError, SchemaResult};
use crate::UserEventType;
use std::collections::HashMap;

/// Topic bound to one event type, with the partition count used at bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    pub event_type: UserEventType,
    pub name: String,
    pub partitions: i32,
}

impl TopicSpec {
    pub fn new(event_type: UserEventType, name: impl Into<String>, partitions: i32) -> Self {
        Self {
            event_type,
            name: name.into(),
            partitions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRegistry {
    // Ordered as UserEventType::ALL
    specs: Vec<TopicSpec>,
}

impl TopicRegistry {
    /// Build a registry from explicit entries.
    ///
    /// Fails unless every event type appears exactly once, topic names are
    /// non-empty and distinct, and every topic has at least one partition.
    pub fn new(entries: impl IntoIterator<Item = TopicSpec>) -> SchemaResult<Self> {
        let mut by_type: HashMap<UserEventType, TopicSpec> = HashMap::new();
        let mut by_topic: HashMap<String, UserEventType> = HashMap::new();

        for spec in entries {
            if spec.name.trim().is_empty() {
                return Err(SchemaError::EmptyTopicName(spec.event_type));
            }
            if spec.partitions < 1 {
                return Err(SchemaError::InvalidPartitions(spec.name));
            }
            if by_type.contains_key(&spec.event_type) {
                return Err(SchemaError::DuplicateEventType(spec.event_type));
            }
            if let Some(first) = by_topic.get(&spec.name) {
                return Err(SchemaError::DuplicateTopic {
                    topic: spec.name,
                    first: *first,
                    second: spec.event_type,
                });
            }

            by_topic.insert(spec.name.clone(), spec.event_type);
            by_type.insert(spec.event_type, spec);
        }

        let mut specs = Vec::with_capacity(UserEventType::ALL.len());
        for event_type in UserEventType::ALL {
            let spec = by_type
                .remove(&event_type)
                .ok_or(SchemaError::MissingTopic(event_type))?;
            specs.push(spec);
        }

        Ok(Self { specs })
    }

    /// The production topic layout:
    /// LOGIN -> user-logins (3), PAGE-VIEWS -> page-views (2),
    /// USER-ACTION -> user-actions (1)
    pub fn standard() -> Self {
        Self {
            specs: vec![
                TopicSpec::new(UserEventType::Login, "user-logins", 3),
                TopicSpec::new(UserEventType::PageViews, "page-views", 2),
                TopicSpec::new(UserEventType::UserAction, "user-actions", 1),
            ],
        }
    }

    pub fn topic_for(&self, event_type: UserEventType) -> &str {
        &self.spec_for(event_type).name
    }

    pub fn spec_for(&self, event_type: UserEventType) -> &TopicSpec {
        // specs is indexed by declaration order, enforced in new()
        &self.specs[event_type as usize]
    }

    pub fn event_type_for(&self, topic: &str) -> Option<UserEventType> {
        self.specs
            .iter()
            .find(|spec| spec.name == topic)
            .map(|spec| spec.event_type)
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn standard_entries() -> Vec<TopicSpec> {
        TopicRegistry::standard().topics().cloned().collect()
    }

    #[test]
    fn test_standard_mapping() {
        let registry = TopicRegistry::standard();

        assert_eq!(registry.topic_for(UserEventType::Login), "user-logins");
        assert_eq!(registry.topic_for(UserEventType::PageViews), "page-views");
        assert_eq!(registry.topic_for(UserEventType::UserAction), "user-actions");
    }

    #[test]
    fn test_standard_is_total_and_injective() {
        let registry = TopicRegistry::standard();
        assert_eq!(registry.len(), UserEventType::ALL.len());

        let topics: HashSet<&str> = UserEventType::ALL
            .iter()
            .map(|t| registry.topic_for(*t))
            .collect();
        assert_eq!(topics.len(), 3);
    }

    #[test]
    fn test_standard_passes_validation() {
        let rebuilt = TopicRegistry::new(standard_entries()).unwrap();
        assert_eq!(rebuilt, TopicRegistry::standard());
    }

    #[test]
    fn test_new_orders_by_event_type() {
        let mut entries = standard_entries();
        entries.reverse();

        let registry = TopicRegistry::new(entries).unwrap();
        let order: Vec<UserEventType> = registry.topics().map(|s| s.event_type).collect();
        assert_eq!(order, UserEventType::ALL.to_vec());
        assert_eq!(registry.topic_for(UserEventType::UserAction), "user-actions");
    }

    #[test]
    fn test_missing_event_type_rejected() {
        let mut entries = standard_entries();
        entries.retain(|s| s.event_type != UserEventType::PageViews);

        let err = TopicRegistry::new(entries).unwrap_err();
        assert!(matches!(err, SchemaError::MissingTopic(UserEventType::PageViews)));
    }

    #[test]
    fn test_duplicate_topic_rejected() {
        let entries = vec![
            TopicSpec::new(UserEventType::Login, "events", 1),
            TopicSpec::new(UserEventType::PageViews, "events", 1),
            TopicSpec::new(UserEventType::UserAction, "user-actions", 1),
        ];

        let err = TopicRegistry::new(entries).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::DuplicateTopic {
                first: UserEventType::Login,
                second: UserEventType::PageViews,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_event_type_rejected() {
        let mut entries = standard_entries();
        entries.push(TopicSpec::new(UserEventType::Login, "more-logins", 1));

        let err = TopicRegistry::new(entries).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateEventType(UserEventType::Login)));
    }

    #[test]
    fn test_empty_name_and_zero_partitions_rejected() {
        let mut entries = standard_entries();
        entries[0].name = "  ".to_string();
        assert!(matches!(
            TopicRegistry::new(entries).unwrap_err(),
            SchemaError::EmptyTopicName(UserEventType::Login)
        ));

        let mut entries = standard_entries();
        entries[2].partitions = 0;
        assert!(matches!(
            TopicRegistry::new(entries).unwrap_err(),
            SchemaError::InvalidPartitions(name) if name == "user-actions"
        ));
    }

    #[test]
    fn test_reverse_lookup() {
        let registry = TopicRegistry::standard();

        assert_eq!(
            registry.event_type_for("page-views"),
            Some(UserEventType::PageViews)
        );
        assert_eq!(registry.event_type_for("unknown-topic"), None);
    }

    #[test]
    fn test_partition_counts() {
        let registry = TopicRegistry::standard();
        let partitions: Vec<i32> = registry.topics().map(|s| s.partitions).collect();
        assert_eq!(partitions, vec![3, 2, 1]);
    }
}
