//! result_set
//!
//! Paged listings.
//!
//! A [`ResultSet`] holds one page of raw results and materializes it into
//! domain values the first time [`ResultSet::results`] is called. Moving to
//! another page replaces the current one.
//!
//! AtomPub pages carry `first/prev/next/last` links. Browser pages only
//! report `hasMoreItems` and `numItems`; page navigation there fails with
//! `NotSupported` and callers page with `skipCount` instead.
//!
//! [`ResultSet::has_object`] looks at the current page only.

use async_trait::async_trait;
use tracing::debug;

use crate::binding::{ObjectData, Page, PageLink, PageNav};
use crate::error::Result;
use crate::model::{ChangeEntry, Options, SpecializedObject};
use crate::repository::Repository;

/// Something a result page can hold.
#[async_trait]
pub trait PageItem: Sized + Send {
    /// What the binding returns for one item.
    type Raw: Clone + Send + Sync + std::fmt::Debug;

    async fn navigate(repository: &Repository, nav: &PageNav, link: PageLink) -> Result<Page<Self::Raw>>;

    fn materialize(repository: &Repository, raw: Self::Raw) -> Self;

    fn raw_id(raw: &Self::Raw) -> Option<&str>;
}

#[async_trait]
impl PageItem for SpecializedObject {
    type Raw = ObjectData;

    async fn navigate(repository: &Repository, nav: &PageNav, link: PageLink) -> Result<Page<ObjectData>> {
        let repo = repository.data().await?;
        repository.binding().navigate(&repo, nav, link).await
    }

    fn materialize(repository: &Repository, raw: ObjectData) -> Self {
        SpecializedObject::from_data(repository.clone(), raw, Options::new())
    }

    fn raw_id(raw: &ObjectData) -> Option<&str> {
        raw.properties.get_str("cmis:objectId")
    }
}

#[async_trait]
impl PageItem for ChangeEntry {
    type Raw = ChangeEntry;

    async fn navigate(repository: &Repository, nav: &PageNav, link: PageLink) -> Result<Page<ChangeEntry>> {
        let repo = repository.data().await?;
        repository.binding().navigate_changes(&repo, nav, link).await
    }

    fn materialize(_repository: &Repository, raw: ChangeEntry) -> Self {
        raw
    }

    fn raw_id(raw: &ChangeEntry) -> Option<&str> {
        raw.object_id.as_ref().map(|id| id.as_str())
    }
}

/// One page of a listing.
#[derive(Debug)]
pub struct ResultSet<T: PageItem> {
    repository: Repository,
    page: Page<T::Raw>,
    results: Option<Vec<T>>,
}

/// Objects from queries and folder or version listings.
pub type ObjectResultSet = ResultSet<SpecializedObject>;

/// Entries of the change log.
pub type ChangeResultSet = ResultSet<ChangeEntry>;

impl<T: PageItem> ResultSet<T> {
    pub(crate) fn new(repository: Repository, page: Page<T::Raw>) -> Self {
        Self {
            repository,
            page,
            results: None,
        }
    }

    /// Items of the current page, materialized on first call.
    pub fn results(&mut self) -> &[T] {
        let repository = &self.repository;
        let raw = &self.page.items;
        self.results.get_or_insert_with(|| {
            raw.iter()
                .cloned()
                .map(|r| T::materialize(repository, r))
                .collect()
        })
    }

    pub fn into_results(self) -> Vec<T> {
        match self.results {
            Some(results) => results,
            None => {
                let repository = self.repository;
                self.page
                    .items
                    .into_iter()
                    .map(|r| T::materialize(&repository, r))
                    .collect()
            }
        }
    }

    /// Items on the current page.
    pub fn len(&self) -> usize {
        self.page.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page.items.is_empty()
    }

    /// Whether an item with `object_id` is on the current page.
    pub fn has_object(&self, object_id: &str) -> bool {
        self.page
            .items
            .iter()
            .any(|raw| T::raw_id(raw) == Some(object_id))
    }

    pub fn has_next(&self) -> bool {
        self.page.nav.has(PageLink::Next)
    }

    pub fn has_prev(&self) -> bool {
        self.page.nav.has(PageLink::Prev)
    }

    pub fn has_first(&self) -> bool {
        self.page.nav.has(PageLink::First)
    }

    pub fn has_last(&self) -> bool {
        self.page.nav.has(PageLink::Last)
    }

    /// Total size of the listing, when the server reports it.
    pub fn num_items(&self) -> Option<u64> {
        self.page.nav.num_items
    }

    pub fn has_more_items(&self) -> Option<bool> {
        self.page.nav.has_more_items
    }

    pub async fn next_page(&mut self) -> Result<()> {
        self.load(PageLink::Next).await
    }

    pub async fn prev_page(&mut self) -> Result<()> {
        self.load(PageLink::Prev).await
    }

    pub async fn first_page(&mut self) -> Result<()> {
        self.load(PageLink::First).await
    }

    pub async fn last_page(&mut self) -> Result<()> {
        self.load(PageLink::Last).await
    }

    /// Re-fetch the current page.
    pub async fn reload(&mut self) -> Result<()> {
        self.load(PageLink::Current).await
    }

    async fn load(&mut self, link: PageLink) -> Result<()> {
        debug!(rel = link.rel(), "loading result page");
        let page = T::navigate(&self.repository, &self.page.nav, link).await?;
        self.page = page;
        self.results = None;
        Ok(())
    }
}

impl<T: PageItem> IntoIterator for ResultSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_results().into_iter()
    }
}
