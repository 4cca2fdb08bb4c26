//! Source registration bookkeeping.
//!
//! Sources are identified by the address of their `Rc` allocation. The
//! registry only stores [`Weak`] handles; a source dropped by its owner
//! without being removed leaves a stale entry that is treated as absent.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::{Rc, Weak};

use sonance_io::SoundSource;

/// Which sonification tier a source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SonificationLevel {
    /// Always audible.
    #[default]
    Basic,
    /// Audible only while the engine's sonification level is `Extra`.
    Extra,
}

impl SonificationLevel {
    /// Lowercase name used in logs and scripts.
    pub fn label(self) -> &'static str {
        match self {
            SonificationLevel::Basic => "basic",
            SonificationLevel::Extra => "extra",
        }
    }
}

impl fmt::Display for SonificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Options for [`SoundManager::add_sound_generator`](crate::SoundManager::add_sound_generator).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundGeneratorOptions {
    /// Category gain stage to route through. `None` routes straight into the
    /// reverb and dry paths.
    pub category: Option<String>,
    /// Sonification tier of the source.
    pub sonification_level: SonificationLevel,
}

impl SoundGeneratorOptions {
    /// Options for an uncategorized, basic source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Route through the named category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the sonification tier.
    pub fn with_sonification_level(mut self, level: SonificationLevel) -> Self {
        self.sonification_level = level;
        self
    }
}

/// Identity of a source: the address of its allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SourceKey(usize);

impl SourceKey {
    pub(crate) fn of(source: &Rc<dyn SoundSource>) -> Self {
        Self(Rc::as_ptr(source).cast::<()>() as usize)
    }
}

pub(crate) struct Registration {
    pub source: Weak<dyn SoundSource>,
    pub options: SoundGeneratorOptions,
}

impl Registration {
    pub fn new(source: &Rc<dyn SoundSource>, options: SoundGeneratorOptions) -> Self {
        Self {
            source: Rc::downgrade(source),
            options,
        }
    }

    fn is_live(&self) -> bool {
        self.source.strong_count() > 0
    }
}

/// Pending queue (before initialization) and active set (after).
#[derive(Default)]
pub(crate) struct Registry {
    pending: VecDeque<(SourceKey, Registration)>,
    active: HashMap<SourceKey, Registration>,
}

impl Registry {
    pub fn queue(&mut self, key: SourceKey, registration: Registration) {
        self.pending.push_back((key, registration));
    }

    /// Drops every pending entry for `key`. Returns how many were dropped.
    pub fn remove_pending(&mut self, key: SourceKey) -> usize {
        let before = self.pending.len();
        self.pending.retain(|(k, _)| *k != key);
        before - self.pending.len()
    }

    /// Empties the pending queue, oldest first.
    pub fn drain_pending(&mut self) -> Vec<Registration> {
        self.pending.drain(..).map(|(_, reg)| reg).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_active(&self, key: SourceKey) -> bool {
        self.active.get(&key).is_some_and(Registration::is_live)
    }

    /// Inserts an active registration, replacing a stale one at the same key.
    pub fn insert_active(&mut self, key: SourceKey, registration: Registration) {
        self.active.insert(key, registration);
    }

    /// Removes a live registration. Stale entries are discarded and reported
    /// as absent.
    pub fn remove_active(&mut self, key: SourceKey) -> Option<Registration> {
        self.active.remove(&key).filter(Registration::is_live)
    }

    pub fn active_count(&self) -> usize {
        self.active.values().filter(|r| r.is_live()).count()
    }

    /// Live sources registered at the extra sonification tier.
    pub fn extra_sources(&self) -> Vec<Rc<dyn SoundSource>> {
        self.active
            .values()
            .filter(|r| r.options.sonification_level == SonificationLevel::Extra)
            .filter_map(|r| r.source.upgrade())
            .collect()
    }
}
