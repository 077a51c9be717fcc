use serde::Deserialize;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ServerSettings;

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    #[serde(alias = "page_id")]
    pub page: Option<usize>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page {
    pub page: usize,
    pub page_size: usize,
}

impl Page {
    /// Page numbers start at 1; the size is clamped to the configured range.
    /// A page whose offset does not fit an SQLite integer is rejected.
    pub fn from_params(params: &PageParams, settings: &ServerSettings) -> ApiResult<Self> {
        let page = params.page.unwrap_or(1).max(1);
        let page_size = params
            .page_size
            .unwrap_or(settings.default_page_size)
            .clamp(settings.min_page_size, settings.max_page_size);

        let in_range = (page - 1)
            .checked_mul(page_size)
            .is_some_and(|offset| i64::try_from(offset).is_ok());
        if !in_range {
            return Err(ApiError::BadRequest(format!("page {} is out of range", page)));
        }

        Ok(Self { page, page_size })
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.page_size
    }

    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }
}
