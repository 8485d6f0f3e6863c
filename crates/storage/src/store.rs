//! Transactional in-memory entity store.
//!
//! A [`Transaction`] writes straight into the store's tables and keeps an
//! undo record per touched row. Committing discards the records; dropping
//! the transaction replays them, so a failed deep insert leaves no partial
//! rows behind.

use serde_json::Value;
use sta_common::{EntityId, StaError, StaResult};
use sta_filter::{eval, Predicate, QueryPlan, Row};
use sta_model::{
    Dataset, Datastream, EntityKind, FeatureOfInterest, Format, HistoricalLocation, Location,
    Observation, ObservedProperty, Sensor, Thing, UnitOfMeasurement,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

use crate::entity::Entity;
use crate::query::{self, Page, RowContext};

/// Rows of one entity type ordered by identifier.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: BTreeMap<EntityId, T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
        }
    }
}

impl<T: Entity> Table<T> {
    pub fn get(&self, id: &EntityId) -> Option<&T> {
        self.rows.get(id)
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.rows.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn insert(&mut self, row: T) {
        self.rows.insert(row.id().clone(), row);
    }

    fn remove(&mut self, id: &EntityId) -> Option<T> {
        self.rows.remove(id)
    }
}

/// One table per entity type.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub things: Table<Thing>,
    pub locations: Table<Location>,
    pub historical_locations: Table<HistoricalLocation>,
    pub sensors: Table<Sensor>,
    pub observed_properties: Table<ObservedProperty>,
    pub datastreams: Table<Datastream>,
    pub features: Table<FeatureOfInterest>,
    pub observations: Table<Observation>,
    pub datasets: Table<Dataset>,
    pub units: Table<UnitOfMeasurement>,
    pub formats: Table<Format>,
}

impl Tables {
    /// Look up a row by entity name, for relation navigation.
    pub fn row(&self, entity: &str, id: &EntityId) -> Option<&dyn Row> {
        let kind = EntityKind::from_name(entity)?;
        let row: &dyn Row = match kind {
            EntityKind::Thing => self.things.get(id)?,
            EntityKind::Location => self.locations.get(id)?,
            EntityKind::HistoricalLocation => self.historical_locations.get(id)?,
            EntityKind::Sensor => self.sensors.get(id)?,
            EntityKind::ObservedProperty => self.observed_properties.get(id)?,
            EntityKind::Datastream => self.datastreams.get(id)?,
            EntityKind::FeatureOfInterest => self.features.get(id)?,
            EntityKind::Observation => self.observations.get(id)?,
            EntityKind::Dataset => self.datasets.get(id)?,
            EntityKind::UnitOfMeasurement => self.units.get(id)?,
            EntityKind::Format => self.formats.get(id)?,
        };
        Some(row)
    }

    pub fn find<T: Entity>(&self, id: &EntityId) -> Option<&T> {
        T::table(self).get(id)
    }

    pub fn exists<T: Entity>(&self, id: &EntityId) -> bool {
        T::table(self).contains(id)
    }

    /// Fetch a row or fail with NotFound.
    pub fn get<T: Entity>(&self, id: &EntityId) -> StaResult<&T> {
        self.find(id)
            .ok_or_else(|| StaError::not_found(T::KIND.name(), id))
    }

    /// First row (in id order) matching the predicate.
    pub fn find_one<T: Entity>(&self, predicate: &Predicate) -> Option<&T> {
        T::table(self)
            .iter()
            .find(|row| eval::matches(predicate, &RowContext::new(self, *row)))
    }

    pub fn count<T: Entity>(&self, predicate: &Predicate) -> usize {
        T::table(self)
            .iter()
            .filter(|row| eval::matches(predicate, &RowContext::new(self, *row)))
            .count()
    }

    /// Rows matching a predicate, in id order.
    pub fn filter<T: Entity>(&self, predicate: &Predicate) -> Vec<&T> {
        T::table(self)
            .iter()
            .filter(|row| eval::matches(predicate, &RowContext::new(self, *row)))
            .collect()
    }

    /// Execute a compiled query plan.
    pub fn query<T: Entity>(&self, plan: &QueryPlan) -> Page<'_, T> {
        query::execute(self, plan)
    }

    fn decode<T: Entity>(&mut self, document: Value) -> StaResult<()> {
        let row: T = serde_json::from_value(document)?;
        T::table_mut(self).insert(row);
        Ok(())
    }

    /// Insert a persisted document into the table for `kind`.
    pub fn load_document(&mut self, kind: EntityKind, document: Value) -> StaResult<()> {
        match kind {
            EntityKind::Thing => self.decode::<Thing>(document),
            EntityKind::Location => self.decode::<Location>(document),
            EntityKind::HistoricalLocation => self.decode::<HistoricalLocation>(document),
            EntityKind::Sensor => self.decode::<Sensor>(document),
            EntityKind::ObservedProperty => self.decode::<ObservedProperty>(document),
            EntityKind::Datastream => self.decode::<Datastream>(document),
            EntityKind::FeatureOfInterest => self.decode::<FeatureOfInterest>(document),
            EntityKind::Observation => self.decode::<Observation>(document),
            EntityKind::Dataset => self.decode::<Dataset>(document),
            EntityKind::UnitOfMeasurement => self.decode::<UnitOfMeasurement>(document),
            EntityKind::Format => self.decode::<Format>(document),
        }
    }

    fn encode(&self, kind: EntityKind, id: &EntityId) -> StaResult<Option<Value>> {
        fn doc<T: Entity>(tables: &Tables, id: &EntityId) -> StaResult<Option<Value>> {
            Ok(match tables.find::<T>(id) {
                Some(row) => Some(serde_json::to_value(row)?),
                None => None,
            })
        }
        match kind {
            EntityKind::Thing => doc::<Thing>(self, id),
            EntityKind::Location => doc::<Location>(self, id),
            EntityKind::HistoricalLocation => doc::<HistoricalLocation>(self, id),
            EntityKind::Sensor => doc::<Sensor>(self, id),
            EntityKind::ObservedProperty => doc::<ObservedProperty>(self, id),
            EntityKind::Datastream => doc::<Datastream>(self, id),
            EntityKind::FeatureOfInterest => doc::<FeatureOfInterest>(self, id),
            EntityKind::Observation => doc::<Observation>(self, id),
            EntityKind::Dataset => doc::<Dataset>(self, id),
            EntityKind::UnitOfMeasurement => doc::<UnitOfMeasurement>(self, id),
            EntityKind::Format => doc::<Format>(self, id),
        }
    }

    /// Row counts per kind, for logging.
    pub fn counts(&self) -> BTreeMap<EntityKind, usize> {
        BTreeMap::from([
            (EntityKind::Thing, self.things.len()),
            (EntityKind::Location, self.locations.len()),
            (EntityKind::HistoricalLocation, self.historical_locations.len()),
            (EntityKind::Sensor, self.sensors.len()),
            (EntityKind::ObservedProperty, self.observed_properties.len()),
            (EntityKind::Datastream, self.datastreams.len()),
            (EntityKind::FeatureOfInterest, self.features.len()),
            (EntityKind::Observation, self.observations.len()),
            (EntityKind::Dataset, self.datasets.len()),
            (EntityKind::UnitOfMeasurement, self.units.len()),
            (EntityKind::Format, self.formats.len()),
        ])
    }
}

/// A row written or deleted by a transaction. `document` is `None` for
/// deletes.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub kind: EntityKind,
    pub id: EntityId,
    pub document: Option<Value>,
}

/// Keys touched by a transaction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    touched: BTreeSet<(EntityKind, EntityId)>,
    created: BTreeSet<(EntityKind, EntityId)>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.touched.is_empty()
    }

    pub fn len(&self) -> usize {
        self.touched.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &(EntityKind, EntityId)> {
        self.touched.iter()
    }

    /// Keys first written by this transaction.
    pub fn created(&self) -> impl Iterator<Item = &(EntityKind, EntityId)> {
        self.created.iter()
    }
}

type Undo = Box<dyn FnOnce(&mut Tables) + Send>;

/// A unit of work applied in place to the store's tables.
///
/// The first write to each row records how to restore it. Dropping the
/// transaction without committing replays those records newest first.
pub struct Transaction<'s> {
    store: &'s mut EntityStore,
    changes: ChangeSet,
    undo: Vec<Undo>,
    committed: bool,
}

impl Transaction<'_> {
    pub fn tables(&self) -> &Tables {
        &self.store.tables
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn find<T: Entity>(&self, id: &EntityId) -> Option<&T> {
        self.store.tables.find(id)
    }

    pub fn exists<T: Entity>(&self, id: &EntityId) -> bool {
        self.store.tables.exists::<T>(id)
    }

    pub fn get<T: Entity>(&self, id: &EntityId) -> StaResult<&T> {
        self.store.tables.get(id)
    }

    pub fn find_one<T: Entity>(&self, predicate: &Predicate) -> Option<&T> {
        self.store.tables.find_one(predicate)
    }

    pub fn count<T: Entity>(&self, predicate: &Predicate) -> usize {
        self.store.tables.count::<T>(predicate)
    }

    pub fn filter<T: Entity>(&self, predicate: &Predicate) -> Vec<&T> {
        self.store.tables.filter(predicate)
    }

    fn remember<T: Entity>(&mut self, id: &EntityId, previous: Option<T>) {
        let id = id.clone();
        self.undo.push(Box::new(move |tables: &mut Tables| {
            let table = T::table_mut(tables);
            match previous {
                Some(row) => table.insert(row),
                None => {
                    table.remove(&id);
                }
            }
        }));
    }

    /// Insert or replace a row.
    pub fn save<T: Entity>(&mut self, row: T) {
        let key = (T::KIND, row.id().clone());
        if !self.changes.touched.contains(&key) {
            let previous = self.store.tables.find::<T>(&key.1).cloned();
            if previous.is_none() {
                self.changes.created.insert(key.clone());
            }
            self.remember(&key.1, previous);
        }
        self.changes.touched.insert(key);
        T::table_mut(&mut self.store.tables).insert(row);
    }

    /// Remove a row, failing with NotFound if absent.
    pub fn delete<T: Entity>(&mut self, id: &EntityId) -> StaResult<T> {
        let row = T::table_mut(&mut self.store.tables)
            .remove(id)
            .ok_or_else(|| StaError::not_found(T::KIND.name(), id))?;
        let key = (T::KIND, id.clone());
        if !self.changes.touched.contains(&key) {
            self.remember(id, Some(row.clone()));
        }
        self.changes.created.remove(&key);
        self.changes.touched.insert(key);
        Ok(row)
    }

    /// Current state of every touched row, ready to persist.
    pub fn pending_writes(&self) -> StaResult<Vec<PendingWrite>> {
        self.changes
            .keys()
            .map(|(kind, id)| {
                Ok(PendingWrite {
                    kind: *kind,
                    id: id.clone(),
                    document: self.store.tables.encode(*kind, id)?,
                })
            })
            .collect()
    }

    /// Keep every write and return the keys touched.
    pub fn commit(mut self) -> StaResult<ChangeSet> {
        self.committed = true;
        self.undo.clear();
        if !self.changes.is_empty() {
            self.store.version += 1;
            debug!(
                version = self.store.version,
                rows = self.changes.len(),
                "Committed transaction"
            );
        }
        Ok(std::mem::take(&mut self.changes))
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        let tables = &mut self.store.tables;
        for undo in self.undo.drain(..).rev() {
            undo(tables);
        }
        if !self.changes.is_empty() {
            debug!(rows = self.changes.len(), "Rolled back transaction");
        }
    }
}

impl fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("changes", &self.changes)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

/// Committed state shared by all requests.
#[derive(Debug, Default)]
pub struct EntityStore {
    tables: Tables,
    version: u64,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously persisted tables.
    pub fn from_tables(tables: Tables) -> Self {
        Self { tables, version: 0 }
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    /// Number of committed transactions that wrote at least one row.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Open a transaction. It holds the store exclusively until it is
    /// committed or dropped.
    pub fn begin(&mut self) -> Transaction<'_> {
        Transaction {
            store: self,
            changes: ChangeSet::default(),
            undo: Vec::new(),
            committed: false,
        }
    }
}
