use crate::pages::traits::Serialize;
use crate::pages::{Page, PageId, INVALID_PAGE, PAGE_SIZE};
use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[cfg(test)]
pub fn test_path() -> String {
    use uuid::Uuid;

    let id = Uuid::new_v4();
    format!("data/test/test_{}/", id)
}

/// One file per page, named by page id. Page ids are minted by the buffer
/// pool; this layer only moves fixed-size byte images.
#[derive(Debug)]
pub struct DiskManager {
    path: PathBuf,
}

// TODO: Find a way to do Direct IO
impl DiskManager {
    pub fn new(path: &str) -> Self {
        let path = Path::new(path);

        std::fs::create_dir_all(path).unwrap();

        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn write_page(&self, page: &Page) -> Result<()> {
        if page.get_page_id() == INVALID_PAGE {
            return Err(anyhow!("Asked to write a page with invalid ID"));
        }

        let path = self.path.join(page.get_page_id().to_string());

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false) // don't overwrite existing file
            .open(path)?;

        file.write_all(page.as_bytes())
            .context("page written to disk")?;

        Ok(())
    }

    pub fn read_page(&self, page_id: PageId) -> Result<Page> {
        if page_id == INVALID_PAGE {
            return Err(anyhow!("Asked to read a page with invalid ID"));
        }

        let path = self.path.join(page_id.to_string());

        let mut file = OpenOptions::new()
            .read(true)
            .open(path)
            .context("page file opened for reading")?;

        let mut buffer = [0u8; PAGE_SIZE];
        file.read_exact(&mut buffer)
            .context("page read from disk")?;
        let mut page = Page::from_bytes(&buffer);
        page.set_page_id(page_id);

        Ok(page)
    }

    /// Id-space bookkeeping hook. Ids are minted by the buffer pool and
    /// never reused, so there is nothing to reclaim yet.
    pub fn deallocate_page(&self, _page_id: PageId) {}
}
