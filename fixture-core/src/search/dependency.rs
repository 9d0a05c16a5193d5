use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use super::{check_acyclic, DepthFirstSearch, Edge, SearchCallback};
use crate::config::FixtureConfig;
use crate::dataset::{DataSetRef, FilteredDataSet, SequenceTableFilter, TableFilter};
use crate::error::Result;
use crate::registry::TableKey;

/// A single-column foreign key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ForeignKey {
    /// Table declaring the key
    pub fk_table: String,
    /// Referencing column
    pub fk_column: String,
    /// Referenced table
    pub pk_table: String,
    /// Referenced column
    pub pk_column: String,
}

impl ForeignKey {
    /// `fk_table.fk_column` references `pk_table.pk_column`
    pub fn new(fk_table: &str, fk_column: &str, pk_table: &str, pk_column: &str) -> Self {
        Self {
            fk_table: fk_table.to_string(),
            fk_column: fk_column.to_string(),
            pk_table: pk_table.to_string(),
            pk_column: pk_column.to_string(),
        }
    }
}

/// Schema access needed by dependency searches
pub trait ForeignKeyProvider: Send + Sync {
    /// Every table of the schema
    fn table_names(&self) -> Result<Vec<String>>;

    /// Foreign keys declared by `table`
    fn imported_keys(&self, table: &str) -> Result<Vec<ForeignKey>>;

    /// Foreign keys of other tables that reference `table`
    fn exported_keys(&self, table: &str) -> Result<Vec<ForeignKey>>;
}

/// Which foreign keys a search follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    /// Keys a table declares: follow references to parents
    Imported,
    /// Keys pointing at a table: follow references from children
    Exported,
    /// Both
    All,
}

/// [`SearchCallback`] over tables, discovering edges from foreign keys
///
/// For imported and all keys every edge runs from the referencing table to
/// the referenced one, so a search returns parents before their children.
/// Exported keys are followed the other way round, from the referenced table
/// to its referencing ones, so a search returns dependents first.
pub struct ForeignKeySearchCallback<'a> {
    provider: &'a dyn ForeignKeyProvider,
    direction: KeyDirection,
    case_sensitive: bool,
    filter: Option<&'a dyn TableFilter>,
}

impl<'a> ForeignKeySearchCallback<'a> {
    /// Callback following `direction`
    pub fn new(
        provider: &'a dyn ForeignKeyProvider,
        direction: KeyDirection,
        case_sensitive: bool,
    ) -> Self {
        Self {
            provider,
            direction,
            case_sensitive,
            filter: None,
        }
    }

    /// Follow imported keys only
    pub fn imported(provider: &'a dyn ForeignKeyProvider, case_sensitive: bool) -> Self {
        Self::new(provider, KeyDirection::Imported, case_sensitive)
    }

    /// Follow exported keys only
    pub fn exported(provider: &'a dyn ForeignKeyProvider, case_sensitive: bool) -> Self {
        Self::new(provider, KeyDirection::Exported, case_sensitive)
    }

    /// Follow keys in both directions
    pub fn all(provider: &'a dyn ForeignKeyProvider, case_sensitive: bool) -> Self {
        Self::new(provider, KeyDirection::All, case_sensitive)
    }

    /// Only visit tables `filter` accepts
    #[must_use]
    pub fn with_filter(mut self, filter: &'a dyn TableFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    fn key(&self, name: &str) -> TableKey {
        TableKey::new(name, self.case_sensitive)
    }

    fn edge(&self, fk: &ForeignKey) -> Edge<TableKey> {
        let (child, parent) = (self.key(&fk.fk_table), self.key(&fk.pk_table));
        match self.direction {
            KeyDirection::Exported => Edge::new(parent, child, &fk.fk_column, &fk.pk_column),
            KeyDirection::Imported | KeyDirection::All => {
                Edge::new(child, parent, &fk.fk_column, &fk.pk_column)
            }
        }
    }
}

impl SearchCallback<TableKey> for ForeignKeySearchCallback<'_> {
    fn search_node(&mut self, node: &TableKey) -> Result<bool> {
        match self.filter {
            Some(filter) => filter.accepts(node.name()),
            None => Ok(true),
        }
    }

    fn edges(&mut self, node: &TableKey) -> Result<BTreeSet<Edge<TableKey>>> {
        let mut edges = BTreeSet::new();
        if matches!(self.direction, KeyDirection::Imported | KeyDirection::All) {
            for fk in self.provider.imported_keys(node.name())? {
                edges.insert(self.edge(&fk));
            }
        }
        if matches!(self.direction, KeyDirection::Exported | KeyDirection::All) {
            for fk in self.provider.exported_keys(node.name())? {
                edges.insert(self.edge(&fk));
            }
        }
        Ok(edges)
    }
}

/// Table ordering derived from foreign keys
pub struct TablesDependencyHelper<'a> {
    provider: &'a dyn ForeignKeyProvider,
    search: DepthFirstSearch,
    case_sensitive: bool,
}

impl<'a> TablesDependencyHelper<'a> {
    /// Helper over `provider` using the configured case policy and depth
    pub fn new(provider: &'a dyn ForeignKeyProvider, config: &FixtureConfig) -> Self {
        Self {
            provider,
            search: DepthFirstSearch::from_config(config),
            case_sensitive: config.case_sensitive_table_names,
        }
    }

    fn run(&self, roots: &[&str], direction: KeyDirection) -> Result<Vec<String>> {
        let mut callback =
            ForeignKeySearchCallback::new(self.provider, direction, self.case_sensitive);
        let seeds = roots.iter().map(|r| TableKey::new(r, self.case_sensitive));
        let found = self.search.search(seeds, &mut callback)?;
        debug!(roots = ?roots, ?direction, tables = found.len(), "dependency search");
        Ok(found.into_iter().map(|k| k.name().to_string()).collect())
    }

    /// `roots` and every table they reference, parents first
    pub fn dependency_order(&self, roots: &[&str]) -> Result<Vec<String>> {
        self.run(roots, KeyDirection::Imported)
    }

    /// `roots` and every table referencing them, dependents first
    pub fn dependents_of(&self, roots: &[&str]) -> Result<Vec<String>> {
        self.run(roots, KeyDirection::Exported)
    }

    /// Every table connected to `roots` in either direction, parents first
    pub fn all_related(&self, roots: &[&str]) -> Result<Vec<String>> {
        self.run(roots, KeyDirection::All)
    }

    /// Filter ordering every table of the schema parents first
    ///
    /// Fails with [`Error::CyclicDependency`](crate::error::Error::CyclicDependency)
    /// when no such order exists.
    pub fn sequence_filter(&self) -> Result<SequenceTableFilter> {
        let names = self.provider.table_names()?;
        let keys: Vec<TableKey> = names
            .iter()
            .map(|n| TableKey::new(n, self.case_sensitive))
            .collect();

        let mut callback = ForeignKeySearchCallback::imported(self.provider, self.case_sensitive);
        let mut edges = BTreeSet::new();
        for key in &keys {
            edges.extend(callback.edges(key)?);
        }
        check_acyclic(&keys, &edges)?;

        let ordered = self.search.search(keys, &mut callback)?;
        Ok(SequenceTableFilter::new(
            ordered.into_iter().map(|k| k.name().to_string()),
            self.case_sensitive,
        ))
    }

    /// `dataset` restricted to the tables related to `roots`, parents first
    pub fn dataset(&self, dataset: DataSetRef, roots: &[&str]) -> Result<FilteredDataSet> {
        let tables = self.all_related(roots)?;
        Ok(FilteredDataSet::new(
            dataset,
            Arc::new(SequenceTableFilter::new(tables, self.case_sensitive)),
        ))
    }
}
