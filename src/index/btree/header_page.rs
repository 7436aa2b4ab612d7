//! The B+Tree header page.
//!
//! # Layout
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       13    PageHeader (type = BTreeHeader)
//! 13      4     magic (1989)
//! 17      4     root page id (INVALID when the tree is empty)
//! 21      1     key type
//! 22      2     maximum key size
//! 24      1     delete fashion
//! ```

use crate::common::config::BTREE_MAGIC;
use crate::common::{Error, PageId, Result};
use crate::index::btree::KeyType;
use crate::storage::page::{Page, PageHeader, PageType};

const OFFSET_MAGIC: usize = PageHeader::SIZE;
const OFFSET_ROOT: usize = OFFSET_MAGIC + 4;
const OFFSET_KEY_TYPE: usize = OFFSET_ROOT + PageId::SIZE;
const OFFSET_MAX_KEY_SIZE: usize = OFFSET_KEY_TYPE + 1;
const OFFSET_DELETE_FASHION: usize = OFFSET_MAX_KEY_SIZE + 2;

/// How deletes treat underfull nodes.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteFashion {
    /// Remove the entry and leave the node as it is, even if empty.
    #[default]
    Naive = 0,
}

impl DeleteFashion {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(DeleteFashion::Naive),
            _ => None,
        }
    }
}

/// In-memory copy of a tree's header page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BTreeHeader {
    pub magic: u32,
    pub root: PageId,
    pub key_type: KeyType,
    pub max_key_size: u16,
    pub delete_fashion: DeleteFashion,
}

impl BTreeHeader {
    /// Header of a fresh, empty tree.
    pub fn new(key_type: KeyType, max_key_size: u16) -> Self {
        Self {
            magic: BTREE_MAGIC,
            root: PageId::INVALID,
            key_type,
            max_key_size,
            delete_fashion: DeleteFashion::Naive,
        }
    }

    /// Decode the header stored on `page`.
    ///
    /// # Errors
    /// `Error::Corrupted` if the page is not a header page or any field
    /// holds a value no header would contain.
    pub fn read_from(page: &Page, page_id: PageId) -> Result<Self> {
        let corrupted = |context| Error::Corrupted {
            page_id: page_id.0,
            context,
        };

        if page.page_type() != PageType::BTreeHeader {
            return Err(corrupted("not a B+Tree header page"));
        }

        let data = page.as_slice();
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&data[OFFSET_MAGIC..OFFSET_MAGIC + 4]);
        let magic = u32::from_le_bytes(magic);
        if magic != BTREE_MAGIC {
            return Err(corrupted("bad header magic"));
        }

        let key_type =
            KeyType::from_u8(data[OFFSET_KEY_TYPE]).ok_or_else(|| corrupted("bad key type"))?;
        let delete_fashion = DeleteFashion::from_u8(data[OFFSET_DELETE_FASHION])
            .ok_or_else(|| corrupted("bad delete fashion"))?;

        Ok(Self {
            magic,
            root: PageId::read_from(&data[OFFSET_ROOT..]),
            key_type,
            max_key_size: u16::from_le_bytes([
                data[OFFSET_MAX_KEY_SIZE],
                data[OFFSET_MAX_KEY_SIZE + 1],
            ]),
            delete_fashion,
        })
    }

    /// Write the header onto `page`, replacing whatever it held.
    pub fn write_to(&self, page: &mut Page) {
        page.reset();
        page.set_header(&PageHeader::new(PageType::BTreeHeader));

        let data = page.as_mut_slice();
        data[OFFSET_MAGIC..OFFSET_MAGIC + 4].copy_from_slice(&self.magic.to_le_bytes());
        self.root.write_to(&mut data[OFFSET_ROOT..]);
        data[OFFSET_KEY_TYPE] = self.key_type as u8;
        data[OFFSET_MAX_KEY_SIZE..OFFSET_MAX_KEY_SIZE + 2]
            .copy_from_slice(&self.max_key_size.to_le_bytes());
        data[OFFSET_DELETE_FASHION] = self.delete_fashion as u8;
    }
}
