//! Persisted list of profiles plus the active profile reference
//!
//! Reads come from the in-memory cache loaded at startup. Every mutation
//! writes the full list and the active id back to the key-value store
//! before returning.

use serde_json::Value;
use uuid::Uuid;
use super::profile::Profile;
use crate::store::KeyValueStore;

pub const KEY_SAVED_PROFILES: &str = "savedProfiles";
pub const KEY_ACTIVE_PROFILE_ID: &str = "activeProfileId";

#[derive(Debug, Clone, Default)]
pub struct ProfileStore {
    profiles: Vec<Profile>,
    active_id: Option<Uuid>,
}

impl ProfileStore {
    /// Populate the cache from `store`. A missing or corrupt blob gives an
    /// empty list; an active id that no longer matches a profile is dropped.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let profiles = match store.get(KEY_SAVED_PROFILES) {
            Some(blob) => match serde_json::from_value::<Vec<Profile>>(blob) {
                Ok(profiles) => profiles,
                Err(err) => {
                    tracing::warn!("Ignoring corrupt saved profiles: {}", err);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let active_id = store
            .get(KEY_ACTIVE_PROFILE_ID)
            .and_then(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
            .filter(|id| profiles.iter().any(|p| p.id == *id));

        tracing::debug!("Loaded {} profiles", profiles.len());
        Self { profiles, active_id }
    }

    pub fn list(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn get(&self, id: Uuid) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.id == id)
    }

    /// Look a profile up by id, id prefix or exact name.
    pub fn find(&self, key: &str) -> Option<&Profile> {
        if let Ok(id) = Uuid::parse_str(key) {
            return self.get(id);
        }
        self.profiles
            .iter()
            .find(|p| p.name == key)
            .or_else(|| {
                let mut matches = self
                    .profiles
                    .iter()
                    .filter(|p| !key.is_empty() && p.id.to_string().starts_with(key));
                match (matches.next(), matches.next()) {
                    (Some(p), None) => Some(p),
                    _ => None,
                }
            })
    }

    pub fn get_active(&self) -> Option<&Profile> {
        self.active_id.and_then(|id| self.get(id))
    }

    pub fn active_id(&self) -> Option<Uuid> {
        self.active_id
    }

    pub fn add(&mut self, store: &mut dyn KeyValueStore, profile: Profile) {
        tracing::info!("Adding profile '{}'", profile.display_name());
        self.profiles.push(profile);
        self.persist(store);
    }

    /// Replace the profile with the same id. Unknown ids are ignored.
    pub fn update(&mut self, store: &mut dyn KeyValueStore, profile: Profile) -> bool {
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(slot) => {
                *slot = profile;
                self.persist(store);
                true
            }
            None => {
                tracing::debug!("Ignoring update for unknown profile {}", profile.id);
                false
            }
        }
    }

    /// Remove by id, clearing the active reference if it pointed here.
    pub fn delete(&mut self, store: &mut dyn KeyValueStore, id: Uuid) -> bool {
        let before = self.profiles.len();
        self.profiles.retain(|p| p.id != id);
        let removed = self.profiles.len() != before;

        if self.active_id == Some(id) {
            self.active_id = None;
        }
        self.persist(store);
        removed
    }

    pub fn set_active(&mut self, store: &mut dyn KeyValueStore, id: Uuid) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.active_id = Some(id);
        for profile in &mut self.profiles {
            profile.is_active = profile.id == id;
        }
        self.persist(store);
        true
    }

    fn persist(&self, store: &mut dyn KeyValueStore) {
        match serde_json::to_value(&self.profiles) {
            Ok(blob) => {
                if let Err(err) = store.set(KEY_SAVED_PROFILES, blob) {
                    tracing::error!("Failed to save profiles: {:#}", err);
                }
            }
            Err(err) => tracing::error!("Failed to encode profiles: {}", err),
        }

        let result = match self.active_id {
            Some(id) => store.set(KEY_ACTIVE_PROFILE_ID, Value::String(id.to_string())),
            None => store.remove(KEY_ACTIVE_PROFILE_ID),
        };
        if let Err(err) = result {
            tracing::error!("Failed to save active profile id: {:#}", err);
        }
    }
}
