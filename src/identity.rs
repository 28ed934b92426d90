//! User name resolution with a concurrent memo cache.
//!
//! A uid lookup can trigger NSS activity (LDAP, sssd, ...), so each uid is
//! resolved at most once per cache in the common case. Two threads missing
//! on the same uid may both resolve it; both get the same answer.

use dashmap::DashMap;
use nix::unistd::{Uid, User};
use rayon::prelude::*;
use tracing::debug;

type Resolver = Box<dyn Fn(u32) -> Option<String> + Send + Sync>;

/// Maps uids to display names, falling back to the numeric id.
pub struct UserNameCache {
    names: DashMap<u32, String>,
    resolver: Resolver,
}

impl UserNameCache {
    /// Cache backed by the system user database.
    pub fn new() -> Self {
        Self::with_resolver(lookup_user_name)
    }

    /// Cache backed by a custom lookup, used by tests and fixture runs.
    pub fn with_resolver<F>(resolver: F) -> Self
    where
        F: Fn(u32) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            names: DashMap::new(),
            resolver: Box::new(resolver),
        }
    }

    /// Returns the name for `uid`, or the uid itself when it has no entry.
    pub fn name(&self, uid: u32) -> String {
        if let Some(name) = self.names.get(&uid) {
            return name.value().clone();
        }

        // Resolve outside the shard lock; a concurrent miss does the same work
        let resolved = (self.resolver)(uid).unwrap_or_else(|| uid.to_string());
        self.names.entry(uid).or_insert(resolved).value().clone()
    }

    /// Resolves several uids on the rayon pool ahead of rendering.
    pub fn prefetch(&self, uids: &[u32]) {
        uids.par_iter().for_each(|&uid| {
            self.name(uid);
        });
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for UserNameCache {
    fn default() -> Self {
        Self::new()
    }
}

fn lookup_user_name(uid: u32) -> Option<String> {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => Some(user.name),
        Ok(None) => None,
        Err(e) => {
            debug!("Failed to lookup uid {}: {}", uid, e);
            None
        }
    }
}
