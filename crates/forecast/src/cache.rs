use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use restock_core::ProductId;

use crate::model::FittedModel;

/// Store of fitted models keyed by product.
///
/// Purely an optimisation: a cache that never returns anything yields the
/// same forecasts, only slower.
pub trait ModelCache: Send + Sync {
    fn get(&self, product_id: ProductId) -> Option<Arc<FittedModel>>;
    fn put(&self, product_id: ProductId, model: FittedModel) -> Arc<FittedModel>;
    fn invalidate(&self, product_id: ProductId);
    fn clear(&self);
}

impl<C> ModelCache for Arc<C>
where
    C: ModelCache + ?Sized,
{
    fn get(&self, product_id: ProductId) -> Option<Arc<FittedModel>> {
        (**self).get(product_id)
    }

    fn put(&self, product_id: ProductId, model: FittedModel) -> Arc<FittedModel> {
        (**self).put(product_id, model)
    }

    fn invalidate(&self, product_id: ProductId) {
        (**self).invalidate(product_id)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// Cache that keeps nothing (fresh fit on every call).
#[derive(Debug, Default, Copy, Clone)]
pub struct NoopModelCache;

impl ModelCache for NoopModelCache {
    fn get(&self, _product_id: ProductId) -> Option<Arc<FittedModel>> {
        None
    }

    fn put(&self, _product_id: ProductId, model: FittedModel) -> Arc<FittedModel> {
        Arc::new(model)
    }

    fn invalidate(&self, _product_id: ProductId) {}

    fn clear(&self) {}
}

/// Process-local cache for long-running callers and tests.
#[derive(Debug, Default)]
pub struct InMemoryModelCache {
    inner: RwLock<HashMap<ProductId, Arc<FittedModel>>>,
}

impl InMemoryModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModelCache for InMemoryModelCache {
    fn get(&self, product_id: ProductId) -> Option<Arc<FittedModel>> {
        let map = self.inner.read().ok()?;
        map.get(&product_id).cloned()
    }

    fn put(&self, product_id: ProductId, model: FittedModel) -> Arc<FittedModel> {
        let model = Arc::new(model);
        if let Ok(mut map) = self.inner.write() {
            map.insert(product_id, Arc::clone(&model));
        }
        model
    }

    fn invalidate(&self, product_id: ProductId) {
        if let Ok(mut map) = self.inner.write() {
            map.remove(&product_id);
        }
    }

    fn clear(&self) {
        if let Ok(mut map) = self.inner.write() {
            map.clear();
        }
    }
}
