//! model::document
//!
//! Documents, versioning and content streams.
//!
//! # Versioning
//!
//! ```text
//! Released --checkout()--> CheckedOut (one live PWC)
//! PWC --checkin()--> Released (new version, PWC gone)
//! CheckedOut --cancel_checkout()--> Released (unchanged)
//! ```
//!
//! Each transition reloads the document it started from, because the
//! version series properties are only fresh after the server has moved.

use std::ops::{Deref, DerefMut};

use tracing::{debug, info};

use super::change::{ContentStream, Rendition};
use super::object::{CmisObject, SpecializedObject};
use super::options::{Options, ReturnVersion};
use super::types::Properties;
use crate::error::{CmisError, Result};
use crate::repository::Capability;
use crate::result_set::ObjectResultSet;

/// A document object.
#[derive(Debug, Clone)]
pub struct Document(pub(crate) CmisObject);

impl Document {
    pub fn into_object(self) -> CmisObject {
        self.0
    }

    /// Whether this document is itself a private working copy.
    pub fn is_private_working_copy(&self) -> bool {
        if let Some(pwc) = self.properties().get_bool("cmis:isPrivateWorkingCopy") {
            return pwc;
        }
        match (
            self.object_id(),
            self.properties().get_str("cmis:versionSeriesCheckedOutId"),
        ) {
            (Some(id), Some(checked_out)) => id.as_str() == checked_out,
            _ => false,
        }
    }

    /// Check the document out and return the private working copy.
    ///
    /// # Errors
    ///
    /// `CmisError::NotSupported` when `canCheckOut` is not allowed.
    pub async fn checkout(&mut self) -> Result<Document> {
        if !self.allowable_actions().await?.is_allowed("canCheckOut") {
            return Err(CmisError::not_supported(format!(
                "checkout is not allowed on {}",
                self.0
            )));
        }
        let repo = self.repository().data().await?;
        let pwc = self.repository().binding().checkout(&repo, self.data()).await?;
        info!(object_id = ?self.object_id(), "checked out");
        self.reload().await?;
        SpecializedObject::from_data(self.repository().clone(), pwc, Options::new()).into_document()
    }

    /// Discard the private working copy.
    ///
    /// Works on the checked-out document or on the PWC itself; the
    /// original document is reloaded afterwards.
    pub async fn cancel_checkout(&mut self) -> Result<()> {
        let repo = self.repository().data().await?;
        if self.is_private_working_copy() {
            return self
                .repository()
                .binding()
                .cancel_checkout(&repo, self.data())
                .await;
        }
        let pwc = self.get_private_working_copy().await?.ok_or_else(|| {
            CmisError::InvalidArgument(format!("{} is not checked out", self.0))
        })?;
        self.repository()
            .binding()
            .cancel_checkout(&repo, pwc.data())
            .await?;
        info!(object_id = ?self.object_id(), "checkout cancelled");
        self.reload().await
    }

    /// The private working copy, if the version series is checked out.
    pub async fn get_private_working_copy(&mut self) -> Result<Option<Document>> {
        self.reload().await?;
        let Some(pwc_id) = self
            .properties()
            .get_str("cmis:versionSeriesCheckedOutId")
            .map(str::to_string)
        else {
            return Ok(None);
        };
        let pwc = self
            .repository()
            .get_object(&pwc_id, &Options::new())
            .await?
            .into_document()?;
        Ok(Some(pwc))
    }

    pub async fn is_checked_out(&mut self) -> Result<bool> {
        self.reload().await?;
        Ok(self
            .properties()
            .get_bool("cmis:isVersionSeriesCheckedOut")
            .unwrap_or(false))
    }

    pub async fn get_checked_out_by(&mut self) -> Result<Option<String>> {
        self.reload().await?;
        Ok(self
            .properties()
            .get_str("cmis:versionSeriesCheckedOutBy")
            .map(str::to_string))
    }

    /// Check this private working copy in as a new version.
    ///
    /// The PWC is consumed; the returned document is the new version.
    pub async fn checkin(self, comment: Option<&str>, major: bool, options: &Options) -> Result<Document> {
        let repo = self.repository().data().await?;
        let version = self
            .repository()
            .binding()
            .checkin(&repo, self.data(), major, comment, options)
            .await?;
        let mut document =
            SpecializedObject::from_data(self.repository().clone(), version, Options::new())
                .into_document()?;
        info!(object_id = ?document.object_id(), major, "checked in");
        document.reload().await?;
        Ok(document)
    }

    /// Latest version of this version series (latest major with `major`).
    pub async fn get_latest_version(&self, major: bool) -> Result<Document> {
        let id = self.require_id()?;
        let version = if major {
            ReturnVersion::LatestMajor
        } else {
            ReturnVersion::Latest
        };
        self.repository()
            .get_object(id.as_str(), &Options::new().return_version(version))
            .await?
            .into_document()
    }

    pub async fn get_properties_of_latest_version(&self, major: bool) -> Result<Properties> {
        Ok(self.get_latest_version(major).await?.properties().clone())
    }

    pub async fn get_all_versions(&self, options: &Options) -> Result<ObjectResultSet> {
        let repo = self.repository().data().await?;
        let page = self
            .repository()
            .binding()
            .get_all_versions(&repo, self.data(), options)
            .await?;
        Ok(ObjectResultSet::new(self.repository().clone(), page))
    }

    pub async fn get_content_stream(&self) -> Result<ContentStream> {
        let repo = self.repository().data().await?;
        self.repository()
            .binding()
            .get_content_stream(&repo, self.data())
            .await
    }

    /// Replace the content stream.
    ///
    /// The document takes the state the server returns; servers that create
    /// a new version here hand back that version.
    pub async fn set_content_stream(&mut self, content: &ContentStream) -> Result<()> {
        let repo = self.repository().data().await?;
        let updated = self
            .repository()
            .binding()
            .set_content_stream(&repo, self.data(), content, self.data().change_token())
            .await?;
        debug!(object_id = ?self.object_id(), bytes = content.len(), "content stream set");
        match updated {
            Some(data) => {
                self.replace_data(data);
                Ok(())
            }
            None => self.reload().await,
        }
    }

    pub async fn delete_content_stream(&mut self) -> Result<()> {
        let repo = self.repository().data().await?;
        self.repository()
            .binding()
            .delete_content_stream(&repo, self.data(), self.data().change_token())
            .await?;
        self.reload().await
    }

    /// Requires the `Renditions` capability.
    pub async fn get_renditions(&self) -> Result<Vec<Rendition>> {
        let repo = self
            .repository()
            .require(Capability::Renditions, "getRenditions")
            .await?;
        self.repository()
            .binding()
            .get_renditions(&repo, self.data(), &Options::new().rendition_filter("*"))
            .await
    }
}

impl Deref for Document {
    type Target = CmisObject;

    fn deref(&self) -> &CmisObject {
        &self.0
    }
}

impl DerefMut for Document {
    fn deref_mut(&mut self) -> &mut CmisObject {
        &mut self.0
    }
}
