use std::sync::Arc;

use crate::{
    config::MemberConfig,
    domain::member_id::{
        candidate_ordinal, fallback_ordinal, format_member_id, normalize_category,
        MAX_ALLOCATION_ATTEMPTS,
    },
    error::Result,
    repository::MemberIdStore,
};

/// Hands out `{PREFIX}-{CATEGORY}-{ORDINAL}` display identifiers.
///
/// The ordinal comes from the number of members that already hold an
/// identifier, so two concurrent allocations can pick the same value. The
/// unique index on `members.unique_id` catches that and the caller retries.
pub struct MemberIdAllocator {
    store: Arc<dyn MemberIdStore>,
    prefix: String,
    default_category: String,
}

impl MemberIdAllocator {
    pub fn new(store: Arc<dyn MemberIdStore>, config: &MemberConfig) -> Self {
        Self {
            store,
            prefix: config.id_prefix.trim().to_uppercase(),
            default_category: config.default_category.clone(),
        }
    }

    pub async fn allocate(&self, category: Option<&str>) -> Result<String> {
        let category = normalize_category(category, &self.default_category);

        for attempt in 0..MAX_ALLOCATION_ATTEMPTS {
            let assigned = self.store.count_with_unique_id().await?;
            let candidate = format_member_id(&self.prefix, &category, candidate_ordinal(assigned, attempt));

            if !self.store.unique_id_exists(&candidate).await? {
                return Ok(candidate);
            }

            tracing::debug!("Member id {} already taken (attempt {})", candidate, attempt + 1);
        }

        let assigned = self.store.count_with_unique_id().await?;
        let fallback = format_member_id(&self.prefix, &category, fallback_ordinal(assigned));
        tracing::warn!(
            "Member id allocation collided {} times, falling back to {}",
            MAX_ALLOCATION_ATTEMPTS,
            fallback
        );

        Ok(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Reports a fixed count and a fixed set of taken ids.
    struct StubStore {
        count: i64,
        taken: HashSet<String>,
        lookups: Mutex<Vec<String>>,
    }

    impl StubStore {
        fn new(count: i64, taken: &[&str]) -> Self {
            Self {
                count,
                taken: taken.iter().map(|s| s.to_string()).collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MemberIdStore for StubStore {
        async fn count_with_unique_id(&self) -> Result<i64> {
            Ok(self.count)
        }

        async fn unique_id_exists(&self, unique_id: &str) -> Result<bool> {
            self.lookups.lock().unwrap().push(unique_id.to_string());
            Ok(self.taken.contains(unique_id))
        }
    }

    fn allocator(store: Arc<StubStore>) -> MemberIdAllocator {
        MemberIdAllocator::new(store, &MemberConfig::default())
    }

    #[tokio::test]
    async fn test_first_id_for_any_category() {
        let store = Arc::new(StubStore::new(0, &[]));
        let allocator = allocator(store);

        assert_eq!(allocator.allocate(Some("cse")).await.unwrap(), "DAIC-CSE-00001");
        assert_eq!(allocator.allocate(Some("ECE")).await.unwrap(), "DAIC-ECE-00001");
        assert_eq!(allocator.allocate(None).await.unwrap(), "DAIC-GEN-00001");
        assert_eq!(allocator.allocate(Some("  ")).await.unwrap(), "DAIC-GEN-00001");
    }

    #[tokio::test]
    async fn test_collision_moves_to_higher_ordinal() {
        let store = Arc::new(StubStore::new(4, &["DAIC-CSE-00005"]));
        let allocator = allocator(store.clone());

        assert_eq!(allocator.allocate(Some("CSE")).await.unwrap(), "DAIC-CSE-00006");
        assert_eq!(
            *store.lookups.lock().unwrap(),
            vec!["DAIC-CSE-00005".to_string(), "DAIC-CSE-00006".to_string()]
        );
    }

    #[tokio::test]
    async fn test_persistent_collisions_fall_back() {
        let store = Arc::new(StubStore::new(
            10,
            &["DAIC-CSE-00011", "DAIC-CSE-00012", "DAIC-CSE-00013", "DAIC-CSE-00014", "DAIC-CSE-00015"],
        ));
        let allocator = allocator(store.clone());

        assert_eq!(allocator.allocate(Some("CSE")).await.unwrap(), "DAIC-CSE-00110");
        assert_eq!(store.lookups.lock().unwrap().len(), 5);
    }
}
