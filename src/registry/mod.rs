/*!
Registries consulted while resolving and completing.

Three independent tables, each behind its own reader/writer lock:
  resolvers    TypeKey -> resolver
  completions  key     -> completion provider
  conditions   name    -> predicate

Every registration replaces what was there for the same key, so hosts can
shadow the built-ins. Lookups clone the `Arc` out of the lock; no lock is held
while user code runs.
*/

pub mod completions;
pub mod conditions;
pub mod resolvers;

use parking_lot::RwLock;

use crate::definition::TypeKey;
use crate::error::ResolveError;
use crate::value::Value;

pub use completions::{CompletionContext, CompletionProvider, CompletionRegistry, CompletionSource};
pub use conditions::{Condition, ConditionContext, ConditionRegistry, parse_conditions};
pub use resolvers::{ResolveContext, Resolver, ResolverEntry, TypeResolverRegistry};

#[derive(Default)]
pub struct Registries {
    resolvers: RwLock<TypeResolverRegistry>,
    completions: RwLock<CompletionRegistry>,
    conditions: RwLock<ConditionRegistry>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolver(&self, key: &TypeKey) -> Option<ResolverEntry> {
        self.resolvers.read().get(key)
    }

    pub fn condition(&self, name: &str) -> Option<Condition> {
        self.conditions.read().get(name)
    }

    pub fn completion_source(&self, spec: &str) -> Option<CompletionSource> {
        self.completions.read().source(spec)
    }

    /// Provider registered under a type's name, used when a parameter has no
    /// completion key of its own.
    pub fn type_completion(&self, key: &TypeKey) -> Option<CompletionProvider> {
        self.completions.read().get(key.name())
    }

    pub fn register_type_resolver<F>(&self, key: impl Into<TypeKey>, resolver: F)
    where
        F: Fn(&mut ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.resolvers.write().register(key, resolver);
    }

    pub fn register_issuer_aware_resolver<F>(&self, key: impl Into<TypeKey>, resolver: F)
    where
        F: Fn(&mut ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.resolvers.write().register_issuer_aware(key, resolver);
    }

    pub fn register_completion_provider<F>(&self, key: &str, provider: F)
    where
        F: Fn(&CompletionContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        self.completions.write().register(key, provider);
    }

    pub fn register_condition<F>(&self, name: &str, condition: F)
    where
        F: Fn(&ConditionContext<'_>) -> Result<(), ResolveError> + Send + Sync + 'static,
    {
        self.conditions.write().register(name, condition);
    }

    pub fn has_resolver(&self, key: &TypeKey) -> bool {
        self.resolvers.read().contains(key)
    }
}
