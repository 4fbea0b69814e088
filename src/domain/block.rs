//! Page blocks: opaque content leaves attached to sections.
//!
//! The tree never looks inside a block. It only relies on the capability
//! contract below: a block can export itself to a JSON payload, the registry
//! can import a payload back into a block of the same type, and a block can
//! describe itself to a renderer. Blocks that take user input also accept
//! submissions and may hold a user on their page until answered.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ids::{BlockId, UserId};

/// Serialized block content.
pub type BlockPayload = serde_json::Value;

/// Failure raised by a block's export or import.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BlockError(pub String);

impl From<serde_json::Error> for BlockError {
    fn from(e: serde_json::Error) -> Self {
        Self(e.to_string())
    }
}

/// Capability contract of a content block.
///
/// `import(export(block))` must yield a block with the same render context.
pub trait PageBlock: fmt::Debug + Send + Sync {
    /// Registry key of this block variant.
    fn block_type(&self) -> &'static str;

    fn export(&self) -> Result<BlockPayload, BlockError>;

    /// Key/value context handed to the presentation layer.
    fn render_context(&self) -> BTreeMap<String, String>;

    /// Whether the page must render a form around this block. Only such
    /// blocks receive submissions.
    fn needs_submit(&self) -> bool {
        false
    }

    /// Whether `user` may proceed past the page holding this block.
    fn unlocked(&self, _user: &UserId) -> bool {
        true
    }

    /// Store `user`'s response to this block.
    fn submit(&self, _user: &UserId, _data: &BlockPayload) -> Result<(), BlockError> {
        Ok(())
    }

    /// Keep the user on the page after a submission instead of moving on.
    fn redirect_to_self_on_submit(&self) -> bool {
        true
    }

    fn clear_user_submissions(&self, _user: &UserId) {}
}

/// Constructor for a block variant from its exported payload.
pub type BlockImporter = fn(&BlockPayload) -> Result<Box<dyn PageBlock>, BlockError>;

/// Maps block type names to importers.
#[derive(Clone)]
pub struct BlockRegistry {
    importers: HashMap<String, BlockImporter>,
}

impl fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("types", &self.available())
            .finish()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl BlockRegistry {
    /// Registry without any block types.
    pub fn empty() -> Self {
        Self {
            importers: HashMap::new(),
        }
    }

    /// Registry with the built-in `text` and `html` blocks.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(TextBlock::TYPE, import_serde::<TextBlock>);
        registry.register(HtmlBlock::TYPE, import_serde::<HtmlBlock>);
        registry
    }

    pub fn register(&mut self, block_type: &str, importer: BlockImporter) {
        self.importers.insert(block_type.to_string(), importer);
    }

    pub fn contains(&self, block_type: &str) -> bool {
        self.importers.contains_key(block_type)
    }

    /// Sorted list of registered block types.
    pub fn available(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.importers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn import(
        &self,
        block_type: &str,
        payload: &BlockPayload,
    ) -> Result<Box<dyn PageBlock>, BlockError> {
        let importer = self
            .importers
            .get(block_type)
            .ok_or_else(|| BlockError(format!("unknown block type '{block_type}'")))?;
        importer(payload)
    }
}

/// Importer for blocks whose payload is their serde representation.
pub fn import_serde<T>(payload: &BlockPayload) -> Result<Box<dyn PageBlock>, BlockError>
where
    T: PageBlock + DeserializeOwned + 'static,
{
    let block: T = serde_json::from_value(payload.clone())?;
    Ok(Box::new(block))
}

/// Plain text (markdown) content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub body: String,
}

impl TextBlock {
    pub const TYPE: &'static str = "text";

    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl PageBlock for TextBlock {
    fn block_type(&self) -> &'static str {
        Self::TYPE
    }

    fn export(&self) -> Result<BlockPayload, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    fn render_context(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("body".to_string(), self.body.clone())])
    }
}

/// Raw HTML content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlBlock {
    pub html: String,
}

impl HtmlBlock {
    pub const TYPE: &'static str = "html";

    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

impl PageBlock for HtmlBlock {
    fn block_type(&self) -> &'static str {
        Self::TYPE
    }

    fn export(&self) -> Result<BlockPayload, BlockError> {
        Ok(serde_json::to_value(self)?)
    }

    fn render_context(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("html".to_string(), self.html.clone())])
    }
}

/// A block placed on a section at a 1-based ordinal.
#[derive(Debug)]
pub struct AttachedBlock {
    pub id: BlockId,
    pub label: String,
    pub css_extra: String,
    pub ordinality: u32,
    pub content: Box<dyn PageBlock>,
}

impl AttachedBlock {
    pub fn block_type(&self) -> &'static str {
        self.content.block_type()
    }

    /// Render-facing description of this attachment.
    pub fn view(&self) -> BlockView {
        BlockView {
            id: self.id,
            ordinality: self.ordinality,
            label: self.label.clone(),
            css_extra: self.css_extra.clone(),
            block_type: self.block_type().to_string(),
            context: self.content.render_context(),
        }
    }
}

/// What the presentation layer receives for one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockView {
    pub id: BlockId,
    pub ordinality: u32,
    pub label: String,
    pub css_extra: String,
    pub block_type: String,
    pub context: BTreeMap<String, String>,
}
