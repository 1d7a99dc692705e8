use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::planning::generator::PlanResult;

/// In-memory plan store keyed by `plan_id`.
///
/// Capacity-bounded: once full, the oldest inserted plan is evicted.
#[derive(Clone)]
pub struct PlanStore {
    inner: Arc<RwLock<Inner>>,
    capacity: usize,
}

#[derive(Default)]
struct Inner {
    plans: HashMap<String, PlanResult>,
    order: VecDeque<String>,
}

impl PlanStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            capacity: capacity.max(1),
        }
    }

    /// Saves every plan under a single lock acquisition.
    pub async fn save_bundle(&self, plans: impl IntoIterator<Item = PlanResult>) {
        let mut inner = self.inner.write().await;
        for plan in plans {
            self.insert_locked(&mut inner, plan);
        }
    }

    pub async fn get(&self, plan_id: &str) -> Option<PlanResult> {
        self.inner.read().await.plans.get(plan_id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.plans.len()
    }

    fn insert_locked(&self, inner: &mut Inner, plan: PlanResult) {
        let plan_id = plan.plan_id.clone();
        if inner.plans.insert(plan_id.clone(), plan).is_none() {
            inner.order.push_back(plan_id);
        }
        while inner.plans.len() > self.capacity {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            inner.plans.remove(&oldest);
            debug!("Evicted plan {oldest} from plan store");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::generator::generate_plan;
    use crate::planning::rules::{Mode, PlanInput, PlanType};

    fn make_plan() -> PlanResult {
        let input = PlanInput {
            mode: Mode::Exit,
            goal_amount: 1000.0,
            current_buffer: 0.0,
            monthly_income: 3000.0,
            monthly_spend_by_category: [("Food".to_string(), 400.0)].into_iter().collect(),
        };
        generate_plan(&input, PlanType::Fast)
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let store = PlanStore::new(10);
        let plan = make_plan();
        let id = plan.plan_id.clone();
        store.save_bundle([plan]).await;
        assert_eq!(store.get(&id).await.unwrap().plan_id, id);
        assert!(store.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_oldest_evicted_at_capacity() {
        let store = PlanStore::new(2);
        let (a, b, c) = (make_plan(), make_plan(), make_plan());
        let (a_id, b_id, c_id) = (a.plan_id.clone(), b.plan_id.clone(), c.plan_id.clone());

        store.save_bundle([a, b]).await;
        store.save_bundle([c]).await;

        assert_eq!(store.count().await, 2);
        assert!(store.get(&a_id).await.is_none());
        assert!(store.get(&b_id).await.is_some());
        assert!(store.get(&c_id).await.is_some());
    }

    #[tokio::test]
    async fn test_resave_same_id_does_not_duplicate_order() {
        let store = PlanStore::new(2);
        let plan = make_plan();
        store.save_bundle([plan.clone()]).await;
        store.save_bundle([plan.clone()]).await;
        store.save_bundle([make_plan()]).await;
        assert_eq!(store.count().await, 2);
        assert!(store.get(&plan.plan_id).await.is_some());
    }
}
