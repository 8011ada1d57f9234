//! Tenant-isolated product storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use costledger_core::TenantId;
use costledger_products::{Product, ProductId};

/// Persistence collaborator of the valuation engine: fetch a product
/// snapshot, write the recomputed one back.
pub trait ProductRepository: Send + Sync {
    fn get(&self, tenant_id: TenantId, product_id: &ProductId) -> Option<Product>;
    fn find_by_code(&self, tenant_id: TenantId, code: &str) -> Option<Product>;
    fn save(&self, tenant_id: TenantId, product: Product);
    fn list(&self, tenant_id: TenantId) -> Vec<Product>;
    /// Store a new product unless the tenant already has one with the same
    /// code. The check and the write are atomic. Returns `false` on a clash.
    fn insert_new(&self, tenant_id: TenantId, product: Product) -> bool;
}

impl<S> ProductRepository for Arc<S>
where
    S: ProductRepository + ?Sized,
{
    fn get(&self, tenant_id: TenantId, product_id: &ProductId) -> Option<Product> {
        (**self).get(tenant_id, product_id)
    }

    fn find_by_code(&self, tenant_id: TenantId, code: &str) -> Option<Product> {
        (**self).find_by_code(tenant_id, code)
    }

    fn save(&self, tenant_id: TenantId, product: Product) {
        (**self).save(tenant_id, product)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<Product> {
        (**self).list(tenant_id)
    }

    fn insert_new(&self, tenant_id: TenantId, product: Product) -> bool {
        (**self).insert_new(tenant_id, product)
    }
}

/// In-memory repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    inner: RwLock<HashMap<(TenantId, ProductId), Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn get(&self, tenant_id: TenantId, product_id: &ProductId) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.get(&(tenant_id, *product_id)).cloned()
    }

    fn find_by_code(&self, tenant_id: TenantId, code: &str) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.iter()
            .find(|((t, _), p)| *t == tenant_id && p.code == code)
            .map(|(_, p)| p.clone())
    }

    fn save(&self, tenant_id: TenantId, product: Product) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((tenant_id, product.id), product);
        }
    }

    fn list(&self, tenant_id: TenantId) -> Vec<Product> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut products: Vec<Product> = map
            .iter()
            .filter_map(|((t, _), p)| if *t == tenant_id { Some(p.clone()) } else { None })
            .collect();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        products
    }

    fn insert_new(&self, tenant_id: TenantId, product: Product) -> bool {
        let Ok(mut map) = self.inner.write() else {
            return false;
        };
        if map.iter().any(|((t, _), p)| *t == tenant_id && p.code == product.code) {
            return false;
        }
        map.insert((tenant_id, product.id), product);
        true
    }
}
