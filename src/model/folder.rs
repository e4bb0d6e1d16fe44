//! model::folder
//!
//! Folders and folder navigation.

use std::ops::{Deref, DerefMut};

use tracing::info;

use super::change::ContentStream;
use super::document::Document;
use super::object::{CmisObject, SpecializedObject};
use super::options::Options;
use super::types::Properties;
use crate::error::Result;
use crate::repository::Capability;
use crate::result_set::ObjectResultSet;

/// A folder object.
#[derive(Debug, Clone)]
pub struct Folder(pub(crate) CmisObject);

impl Folder {
    pub fn into_object(self) -> CmisObject {
        self.0
    }

    pub fn path(&self) -> Option<&str> {
        self.properties().get_str("cmis:path")
    }

    pub async fn create_folder(&self, name: &str, properties: Properties) -> Result<Folder> {
        self.repository().create_folder(self, name, properties).await
    }

    pub async fn create_document(
        &self,
        name: &str,
        properties: Properties,
        content: Option<ContentStream>,
    ) -> Result<Document> {
        self.repository()
            .create_document(name, properties, Some(self), content)
            .await
    }

    pub async fn create_document_from_string(
        &self,
        name: &str,
        properties: Properties,
        content: &str,
        mime_type: Option<&str>,
    ) -> Result<Document> {
        self.repository()
            .create_document_from_string(name, properties, Some(self), content, mime_type)
            .await
    }

    pub async fn get_children(&self, options: &Options) -> Result<ObjectResultSet> {
        let repo = self.repository().data().await?;
        let page = self
            .repository()
            .binding()
            .get_children(&repo, self.data(), options)
            .await?;
        Ok(ObjectResultSet::new(self.repository().clone(), page))
    }

    /// Descendants flattened parents-first; `depth` defaults to `-1`
    /// (all levels).
    ///
    /// Requires the `GetDescendants` capability.
    pub async fn get_descendants(&self, depth: Option<i32>, options: &Options) -> Result<ObjectResultSet> {
        let repo = self
            .repository()
            .require(Capability::GetDescendants, "getDescendants")
            .await?;
        let options = options.clone().depth(depth.unwrap_or(-1));
        let page = self
            .repository()
            .binding()
            .get_descendants(&repo, self.data(), &options)
            .await?;
        Ok(ObjectResultSet::new(self.repository().clone(), page))
    }

    /// Descendant folders; requires the `GetFolderTree` capability.
    pub async fn get_tree(&self, depth: Option<i32>, options: &Options) -> Result<ObjectResultSet> {
        let repo = self
            .repository()
            .require(Capability::GetFolderTree, "getFolderTree")
            .await?;
        let options = options.clone().depth(depth.unwrap_or(-1));
        let page = self
            .repository()
            .binding()
            .get_folder_tree(&repo, self.data(), &options)
            .await?;
        Ok(ObjectResultSet::new(self.repository().clone(), page))
    }

    /// The parent folder, `None` for the root.
    pub async fn get_parent(&self) -> Result<Option<Folder>> {
        let repo = self.repository().data().await?;
        let parent = self
            .repository()
            .binding()
            .get_folder_parent(&repo, self.data())
            .await?;
        parent
            .map(|p| SpecializedObject::from_data(self.repository().clone(), p, Options::new()).into_folder())
            .transpose()
    }

    /// Delete the folder and everything below it.
    ///
    /// Requires the `GetDescendants` capability.
    pub async fn delete_tree(self, options: &Options) -> Result<()> {
        let repo = self
            .repository()
            .require(Capability::GetDescendants, "deleteTree")
            .await?;
        self.repository()
            .binding()
            .delete_tree(&repo, self.data(), options)
            .await?;
        info!(object_id = ?self.object_id(), "folder tree deleted");
        Ok(())
    }

    /// File `object` in this folder too; requires `Multifiling`.
    pub async fn add_object(&self, object: &CmisObject, options: &Options) -> Result<()> {
        let repo = self
            .repository()
            .require(Capability::Multifiling, "addObjectToFolder")
            .await?;
        self.repository()
            .binding()
            .add_object(&repo, self.data(), object.data(), options)
            .await
    }

    /// Unfile `object` from this folder; requires `Unfiling`.
    pub async fn remove_object(&self, object: &CmisObject) -> Result<()> {
        let repo = self
            .repository()
            .require(Capability::Unfiling, "removeObjectFromFolder")
            .await?;
        self.repository()
            .binding()
            .remove_object(&repo, self.data(), object.data())
            .await
    }

    /// A folder has exactly one path.
    pub async fn get_paths(&self) -> Result<Vec<String>> {
        Ok(self.path().map(str::to_string).into_iter().collect())
    }
}

impl Deref for Folder {
    type Target = CmisObject;

    fn deref(&self) -> &CmisObject {
        &self.0
    }
}

impl DerefMut for Folder {
    fn deref_mut(&mut self) -> &mut CmisObject {
        &mut self.0
    }
}
